//! Shared setup for prompt-relay integration tests.

#![allow(dead_code)]

use axum::{body::Bytes, response::Response, Router};
use prompt_relay::config::{
    CorsConfig, Environment, GoogleConfig, LimitsConfig, ModelConfig, RelayConfig, UpstreamConfig,
};
use prompt_relay::services::{GeminiClient, PromptRelay, UpstreamTransport};
use prompt_relay::{build_router, AppState};
use secrecy::Secret;
use std::sync::Arc;

pub const TEST_ORIGIN: &str = "https://divorceeasy.thefuturesmachines.com";
pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_MODEL: &str = "gemini-1.5-flash-latest";

pub fn test_config(api_key: Option<&str>, base_url: &str) -> RelayConfig {
    RelayConfig {
        common: service_core::config::Config { port: 0 },
        environment: Environment::Dev,
        service_name: "prompt-relay".to_string(),
        log_level: "error".to_string(),
        google: GoogleConfig {
            api_key: api_key.map(|k| Secret::new(k.to_string())),
        },
        models: ModelConfig {
            text_model: TEST_MODEL.to_string(),
        },
        upstream: UpstreamConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        },
        cors: CorsConfig {
            allowed_origin: TEST_ORIGIN.to_string(),
        },
        limits: LimitsConfig {
            max_body_bytes: 4096,
        },
    }
}

pub fn router_with(transport: Arc<dyn UpstreamTransport>, api_key: Option<&str>) -> Router {
    let config = test_config(api_key, "https://generativelanguage.googleapis.com/v1beta");
    let relay = PromptRelay::new(
        GeminiClient::new(&config, transport),
        config.limits.max_body_bytes,
    );

    build_router(AppState { config, relay }).expect("Failed to build router")
}

pub async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body")
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Body is not JSON")
}
