//! Outbound HTTP abstraction.
//!
//! POST a JSON body, get back a status code plus raw bytes.
//! [`HttpTransport`] is the reqwest implementation, [`MockTransport`] the test double.

pub mod http;
pub mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failure before any HTTP status was obtained from the upstream.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Raw upstream reply, relayed to the caller without parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        // Statuses outside 100..=999 cannot be represented; report them as a gateway fault.
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);

        (
            status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )],
            self.body,
        )
            .into_response()
    }
}

#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    /// POST `body` as JSON to `url`. Any HTTP status, 2xx or not, is `Ok`.
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<UpstreamResponse, TransportError>;
}
