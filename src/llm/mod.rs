//! LLM — generative-model adapter for the assistant and image operations.
//!
//! DESIGN
//! ======
//! `LlmClient` wraps one `GeminiClient` and the two configured model names,
//! and implements both generation traits. The coordinators only see
//! `Arc<dyn TextGeneration>` / `Arc<dyn ImageGeneration>`, so tests swap in
//! mocks without any HTTP.

pub mod config;
pub mod gemini;
pub mod prompts;
pub mod types;

use tracing::debug;

use config::LlmConfig;
pub use types::{ImageGeneration, TextGeneration};
use types::{ImageRequest, LlmError};

// =============================================================================
// CLIENT
// =============================================================================

/// Concrete client backed by the Generative Language API.
///
/// Configured from environment variables by [`LlmClient::from_env`].
pub struct LlmClient {
    inner: gemini::GeminiClient,
    text_model: String,
    image_model: String,
}

impl LlmClient {
    /// Build a client from environment variables (see [`LlmConfig::from_env`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails.
    pub fn from_env() -> Result<Self, LlmError> {
        let config = LlmConfig::from_env()?;
        Self::from_config(config)
    }

    /// Build a client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let inner = gemini::GeminiClient::new(config.api_key, config.base_url, config.timeouts)?;
        Ok(Self { inner, text_model: config.text_model, image_model: config.image_model })
    }

    #[must_use]
    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    #[must_use]
    pub fn image_model(&self) -> &str {
        &self.image_model
    }
}

#[async_trait::async_trait]
impl TextGeneration for LlmClient {
    async fn generate_text(&self, instruction: &str) -> Result<String, LlmError> {
        debug!(model = %self.text_model, instruction_len = instruction.len(), "llm: text request");
        let response = self
            .inner
            .generate_content(&self.text_model, &gemini::text_request(instruction))
            .await?;
        gemini::extract_text(&response)
    }
}

#[async_trait::async_trait]
impl ImageGeneration for LlmClient {
    async fn generate_image(&self, request: &ImageRequest) -> Result<String, LlmError> {
        debug!(
            model = %self.image_model,
            text_len = request.text.len(),
            references = request.references.len(),
            "llm: image request"
        );
        let response = self
            .inner
            .generate_content(&self.image_model, &gemini::image_request(request))
            .await?;
        gemini::extract_png_data_uri(&response)
    }
}
