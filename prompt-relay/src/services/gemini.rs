//! Gemini `generateContent` client.
//!
//! Builds the single-turn payload and the keyed endpoint URL, then hands the
//! call to an [`UpstreamTransport`]. The reply is never parsed.

use super::upstream::{TransportError, UpstreamResponse, UpstreamTransport};
use crate::config::{GoogleConfig, RelayConfig};
use reqwest::Url;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("Gemini API key is not configured")]
    NotConfigured,

    #[error("Invalid Gemini endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    pub text: String,
}

impl GenerateContentRequest {
    /// One user turn holding the prompt as its only part.
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    google: GoogleConfig,
    base_url: String,
    model: String,
    transport: Arc<dyn UpstreamTransport>,
}

impl GeminiClient {
    pub fn new(config: &RelayConfig, transport: Arc<dyn UpstreamTransport>) -> Self {
        Self {
            google: config.google.clone(),
            base_url: config.upstream.base_url.clone(),
            model: config.models.text_model.clone(),
            transport,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.google.is_configured()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// `{base}/models/{model}:generateContent?key={api_key}`
    fn api_url(&self, api_key: &str) -> Result<Url, GeminiError> {
        let endpoint = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        Url::parse_with_params(&endpoint, &[("key", api_key)])
            .map_err(|e| GeminiError::InvalidEndpoint(format!("{}: {}", endpoint, e)))
    }

    pub async fn generate_content(&self, prompt: &str) -> Result<UpstreamResponse, GeminiError> {
        let api_key = match &self.google.api_key {
            Some(key) if self.google.is_configured() => key,
            _ => return Err(GeminiError::NotConfigured),
        };

        let url = self.api_url(api_key.expose_secret().trim())?;
        let payload = serde_json::to_value(GenerateContentRequest::from_prompt(prompt))?;

        tracing::debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        let started = Instant::now();
        let response = self.transport.post_json(url.as_str(), &payload).await?;

        tracing::info!(
            model = %self.model,
            status = response.status,
            body_len = response.body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Gemini API responded"
        );

        Ok(response)
    }
}
