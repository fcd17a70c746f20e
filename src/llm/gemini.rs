//! Generative Language API client.
//!
//! Thin HTTP wrapper for `models/{model}:generateContent`. Request building
//! and response parsing are pure functions for testability; only
//! `send_json` touches the network.

use std::time::Duration;

use serde::Serialize;

use super::config::LlmTimeouts;
use super::types::{
    ApiErrorBody, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, ImageRequest,
    LlmError, Part,
};

const PNG_MIME: &str = "image/png";

// =============================================================================
// CLIENT
// =============================================================================

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns [`LlmError::HttpClientBuild`] if the reqwest client fails to build.
    pub fn new(api_key: String, base_url: String, timeouts: LlmTimeouts) -> Result<Self, LlmError> {
        let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(timeouts.connect_secs));
        if let Some(secs) = timeouts.request_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self { http, api_key, base_url })
    }

    /// Call `generateContent` on `model` and parse the 2xx body.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Network`] on transport failure, [`LlmError::Http`]
    /// for a non-success status, and [`LlmError::ApiParse`] for a malformed body.
    pub async fn generate_content(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LlmError> {
        let text = self.send_json(&endpoint_for_model(&self.base_url, model), body).await?;
        parse_response(&text)
    }

    async fn send_json(&self, url: &str, body: &impl Serialize) -> Result<String, LlmError> {
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(http_error(status.as_u16(), &text));
        }
        Ok(text)
    }
}

fn endpoint_for_model(base_url: &str, model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") {
        format!("{base_url}/{model}:generateContent")
    } else {
        format!("{base_url}/models/{model}:generateContent")
    }
}

// =============================================================================
// REQUEST BUILDING
// =============================================================================

/// Single user turn carrying the instruction text.
#[must_use]
pub fn text_request(instruction: &str) -> GenerateContentRequest {
    GenerateContentRequest { contents: vec![Content::user(vec![Part::text(instruction)])], generation_config: None }
}

/// Single user turn: reference images first (upload order), then the text.
/// Asks for both modalities; the image endpoint refuses image-only output.
#[must_use]
pub fn image_request(request: &ImageRequest) -> GenerateContentRequest {
    let mut parts: Vec<Part> = request
        .references
        .iter()
        .map(|r| Part::inline(r.mime_type.clone(), r.data.clone()))
        .collect();
    parts.push(Part::text(request.text.clone()));

    GenerateContentRequest {
        contents: vec![Content::user(parts)],
        generation_config: Some(GenerationConfig { response_modalities: vec!["TEXT".into(), "IMAGE".into()] }),
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_response(json: &str) -> Result<GenerateContentResponse, LlmError> {
    serde_json::from_str(json).map_err(|e| LlmError::ApiParse(e.to_string()))
}

/// Normalize a non-2xx reply: prefer the API-supplied `error.message`.
fn http_error(status: u16, body: &str) -> LlmError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP error! status: {status}"));
    LlmError::Http { status, message }
}

/// `candidates[0].content.parts[0].text`, or [`LlmError::EmptyResponse`].
///
/// # Errors
///
/// Returns [`LlmError::EmptyResponse`] when any step of the path is missing.
pub fn extract_text(response: &GenerateContentResponse) -> Result<String, LlmError> {
    response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.first())
        .and_then(|p| p.text.clone())
        .ok_or(LlmError::EmptyResponse)
}

/// First PNG `inlineData` part of the first candidate, as a data URI.
///
/// # Errors
///
/// Returns [`LlmError::NoImageData`] when no PNG part exists, even if the
/// candidate carries text.
pub fn extract_png_data_uri(response: &GenerateContentResponse) -> Result<String, LlmError> {
    response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .and_then(|c| {
            c.parts
                .iter()
                .filter_map(|p| p.inline_data.as_ref())
                .find(|d| d.mime_type == PNG_MIME && !d.data.is_empty())
        })
        .map(|d| format!("data:{PNG_MIME};base64,{}", d.data))
        .ok_or(LlmError::NoImageData)
}

#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;
