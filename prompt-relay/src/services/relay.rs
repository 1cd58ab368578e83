//! Prompt validation and forwarding.

use super::gemini::{GeminiClient, GeminiError};
use super::upstream::UpstreamResponse;
use crate::dtos::PromptRequest;
use service_core::error::AppError;
use validator::Validate;

const PROMPT_REQUIRED: &str = "Prompt is required";

impl From<GeminiError> for AppError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::NotConfigured => AppError::ServerMisconfigured(err.to_string()),
            GeminiError::InvalidEndpoint(msg) => AppError::ServerMisconfigured(msg),
            GeminiError::Encode(e) => AppError::InternalError(anyhow::Error::new(e)),
            GeminiError::Transport(e) => AppError::UpstreamUnreachable(e.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct PromptRelay {
    gemini: GeminiClient,
    max_body_bytes: usize,
}

impl PromptRelay {
    pub fn new(gemini: GeminiClient, max_body_bytes: usize) -> Self {
        Self {
            gemini,
            max_body_bytes,
        }
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    pub fn is_configured(&self) -> bool {
        self.gemini.is_configured()
    }

    /// Extract a usable prompt from a raw request body.
    pub fn parse_prompt(body: &[u8]) -> Result<String, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::BadRequest(anyhow::anyhow!(PROMPT_REQUIRED)));
        }

        let request: PromptRequest = serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid request body: {}", e)))?;

        request
            .validate()
            .map_err(|_| AppError::BadRequest(anyhow::anyhow!(PROMPT_REQUIRED)))?;

        // Only "", null or an absent field count as missing; whitespace is a prompt.
        request
            .prompt
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!(PROMPT_REQUIRED)))
    }

    /// Validate the body, then make exactly one upstream call.
    ///
    /// Upstream non-2xx replies come back as `Ok` and are relayed as-is.
    pub async fn relay(&self, body: &[u8]) -> Result<UpstreamResponse, AppError> {
        let prompt = Self::parse_prompt(body)?;

        self.gemini.generate_content(&prompt).await.map_err(|e| {
            match &e {
                GeminiError::NotConfigured | GeminiError::InvalidEndpoint(_) => {
                    tracing::error!(error = %e, "Relay is misconfigured")
                }
                _ => tracing::warn!(
                    model = %self.gemini.model(),
                    error = %e,
                    "Gemini API call failed"
                ),
            }
            AppError::from(e)
        })
    }
}
