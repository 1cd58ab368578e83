use serde::Deserialize;
use validator::Validate;

/// Body of `POST /api/gemini`.
#[derive(Debug, Deserialize, Validate)]
pub struct PromptRequest {
    #[serde(default)]
    #[validate(
        required(message = "Prompt is required"),
        length(min = 1, message = "Prompt is required")
    )]
    pub prompt: Option<String>,
}
