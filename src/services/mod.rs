//! Session services: the operations a collaborator invokes.
//!
//! ARCHITECTURE
//! ============
//! Service functions take `&Studio` and change state only through its
//! transitions. `assistant` and `generation` are the two coordinators;
//! they share one busy token and one error surface. `editor` covers the
//! direct field edits.

pub mod assistant;
pub mod editor;
pub mod generation;
