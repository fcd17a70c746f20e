//! LLM types — `generateContent` wire types, generation traits, and errors.
//!
//! Both the text and the image endpoint speak the same request/response
//! shape; only the request's `generationConfig` and the part of the reply
//! that matters differ.

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by LLM client operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The required API key environment variable is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// Transport failure before a response was obtained.
    #[error("network error: {0}")]
    Network(String),

    /// The provider returned a non-success HTTP status. `message` is the
    /// API-supplied `error.message` when present, else a generic status line.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// A 2xx text response without a usable text part.
    #[error("No valid response received from the LLM.")]
    EmptyResponse,

    /// A 2xx image response without a PNG `inlineData` part.
    #[error("No image data received from the API.")]
    NoImageData,

    /// A 2xx response body that is not valid JSON.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl LlmError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
            Self::MissingApiKey { .. } => "E_MISSING_API_KEY",
            Self::Network(_) => "E_NETWORK",
            Self::Http { .. } => "E_HTTP",
            Self::EmptyResponse => "E_EMPTY_RESPONSE",
            Self::NoImageData => "E_NO_IMAGE_DATA",
            Self::ApiParse(_) => "E_API_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// Whether a caller could reasonably try again. The coordinators never
    /// retry on their own; first failure is terminal for an invocation.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// REQUEST WIRE TYPES
// =============================================================================

/// Body of a `models/{model}:generateContent` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

/// One conversation turn. Requests always send a single `user` turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    #[must_use]
    pub fn user(parts: Vec<Part>) -> Self {
        Self { role: Some("user".into()), parts }
    }
}

/// A text segment or an inline binary blob. Unknown part kinds deserialize
/// with both fields empty and are skipped by the extractors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), inline_data: None }
    }

    #[must_use]
    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self { text: None, inline_data: Some(InlineData { mime_type: mime_type.into(), data: data.into() }) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 payload without any data-URI prefix.
    pub data: String,
}

// =============================================================================
// RESPONSE WIRE TYPES
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

/// Error body shape shared by both endpoints: `{ "error": { "message": .. } }`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// IMAGE REQUEST
// =============================================================================

/// An uploaded reference image, already stripped of its data-URI prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceImage {
    pub mime_type: String,
    pub data: String,
}

/// Everything the image endpoint needs, assembled by the generation
/// coordinator from the session's editable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    /// Prompt, style and exclusions folded into one instruction.
    pub text: String,
    pub references: Vec<ReferenceImage>,
}

// =============================================================================
// GENERATION TRAITS
// =============================================================================

/// Single-turn text generation. Enables mocking in tests.
#[async_trait::async_trait]
pub trait TextGeneration: Send + Sync {
    /// Send `instruction` as one user turn and return the first candidate's
    /// first text part, untrimmed.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Network`], [`LlmError::Http`],
    /// [`LlmError::ApiParse`] or [`LlmError::EmptyResponse`].
    async fn generate_text(&self, instruction: &str) -> Result<String, LlmError>;
}

/// Single-call image generation. Enables mocking in tests.
#[async_trait::async_trait]
pub trait ImageGeneration: Send + Sync {
    /// Generate one image and return it as a `data:image/png;base64,..` URI.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Network`], [`LlmError::Http`],
    /// [`LlmError::ApiParse`] or [`LlmError::NoImageData`].
    async fn generate_image(&self, request: &ImageRequest) -> Result<String, LlmError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
