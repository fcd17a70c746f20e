//! Prompt studio — an AI-assisted prompt editor and image generator session.
//!
//! `state` holds the session record and its owner, `services` the operations
//! that drive it, and `llm` the generative-model adapter behind them.

pub mod llm;
pub mod services;
pub mod state;
