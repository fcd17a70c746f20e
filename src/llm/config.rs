//! LLM configuration parsed from environment variables.

use super::types::LlmError;

pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Transport timeouts. A dispatched call is always awaited to completion, so
/// there is no request timeout unless one is configured explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub request_secs: Option<u64>,
    pub connect_secs: u64,
}

impl Default for LlmTimeouts {
    fn default() -> Self {
        Self { request_secs: None, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub timeouts: LlmTimeouts,
}

impl LlmConfig {
    /// Build typed LLM config from environment variables.
    ///
    /// Optional:
    /// - `LLM_API_KEY_ENV`: names the env var containing the key (default `GEMINI_API_KEY`)
    /// - `LLM_BASE_URL`: default Generative Language API base URL
    /// - `LLM_TEXT_MODEL`: default `gemini-2.0-flash`
    /// - `LLM_IMAGE_MODEL`: default `gemini-2.0-flash-preview-image-generation`
    /// - `LLM_REQUEST_TIMEOUT_SECS`: unset means no request timeout
    /// - `LLM_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::MissingApiKey`] if the named key variable is unset
    /// or blank, and [`LlmError::ConfigParse`] for a malformed timeout.
    pub fn from_env() -> Result<Self, LlmError> {
        let key_var = std::env::var("LLM_API_KEY_ENV").unwrap_or_else(|_| DEFAULT_API_KEY_ENV.to_string());
        let api_key = std::env::var(&key_var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey { var: key_var.clone() })?;

        let base_url = std::env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let text_model = std::env::var("LLM_TEXT_MODEL").unwrap_or_else(|_| DEFAULT_TEXT_MODEL.to_string());
        let image_model = std::env::var("LLM_IMAGE_MODEL").unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string());

        let timeouts = LlmTimeouts {
            request_secs: parse_optional_u64("LLM_REQUEST_TIMEOUT_SECS", std::env::var("LLM_REQUEST_TIMEOUT_SECS").ok())?,
            connect_secs: parse_optional_u64("LLM_CONNECT_TIMEOUT_SECS", std::env::var("LLM_CONNECT_TIMEOUT_SECS").ok())?
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api_key, base_url, text_model, image_model, timeouts })
    }
}

fn parse_optional_u64(key: &str, raw: Option<String>) -> Result<Option<u64>, LlmError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse::<u64>()
            .map(Some)
            .map_err(|_| LlmError::ConfigParse(format!("invalid {key}: '{v}'"))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
