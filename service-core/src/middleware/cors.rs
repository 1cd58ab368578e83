//! Fixed single-origin CORS headers.
//!
//! Unlike a negotiating CORS layer, this stamps the same
//! `Access-Control-Allow-*` headers on every response, errors included,
//! and leaves preflight handling to the route itself.

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_origin: HeaderValue,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
}

impl CorsPolicy {
    pub fn new(
        origin: &str,
        methods: &[Method],
        headers: &[HeaderName],
    ) -> Result<Self, AppError> {
        let allow_origin = HeaderValue::from_str(origin.trim()).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", origin, e))
        })?;

        let methods = methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        // Canonical header names are lowercase; browsers compare case-insensitively.
        let headers = headers
            .iter()
            .map(|h| display_header_name(h.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self {
            allow_origin,
            allow_methods: HeaderValue::from_str(&methods)
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
            allow_headers: HeaderValue::from_str(&headers)
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
        })
    }

    pub fn allow_origin(&self) -> &HeaderValue {
        &self.allow_origin
    }
}

/// `content-type` -> `Content-Type`
fn display_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

pub async fn cors_headers_middleware(
    State(policy): State<CorsPolicy>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        policy.allow_origin.clone(),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        policy.allow_methods.clone(),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        policy.allow_headers.clone(),
    );

    response
}
