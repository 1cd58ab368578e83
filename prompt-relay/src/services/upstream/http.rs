//! reqwest-backed transport used in production.

use super::{TransportError, UpstreamResponse, UpstreamTransport};
use async_trait::async_trait;
use reqwest::Client;
use service_core::error::AppError;
use std::error::Error as _;
use std::time::Duration;

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?;

        Ok(Self { client })
    }
}

/// Flatten a reqwest error and its sources into one line.
///
/// The request URL carries the API key as a query parameter, so it is
/// stripped before anything is rendered.
fn describe(err: reqwest::Error) -> String {
    let err = err.without_url();
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }
    description
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(describe(err))
    } else if err.is_connect() {
        TransportError::Connect(describe(err))
    } else {
        TransportError::Network(describe(err))
    }
}

#[async_trait]
impl UpstreamTransport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<UpstreamResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify)?;

        Ok(UpstreamResponse { status, body })
    }
}
