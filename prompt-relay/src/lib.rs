pub mod config;
pub mod dtos;
pub mod handlers;
pub mod services;
pub mod startup;

use axum::{
    http::{header, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{any, get},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    cors::{cors_headers_middleware, CorsPolicy},
    tracing::request_id_middleware,
};
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::services::PromptRelay;

/// Path of the relay endpoint.
pub const RELAY_PATH: &str = "/api/gemini";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: RelayConfig,
    pub relay: PromptRelay,
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let cors_policy = CorsPolicy::new(
        &state.config.cors.allowed_origin,
        &[Method::POST, Method::OPTIONS],
        &[header::CONTENT_TYPE],
    )?;

    let router = Router::new()
        .route("/health", get(handlers::health_check))
        .route(RELAY_PATH, any(handlers::relay_prompt))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri().path(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn_with_state(cors_policy, cors_headers_middleware))
        .with_state(state);

    Ok(router)
}
