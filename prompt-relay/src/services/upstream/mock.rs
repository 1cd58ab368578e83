//! In-memory transport for tests.

use super::{TransportError, UpstreamResponse, UpstreamTransport};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// What the mock does when called.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    Respond(UpstreamResponse),
    Fail(String),
}

/// A request seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub body: serde_json::Value,
}

/// Transport returning a canned reply or a simulated network failure,
/// counting every call it receives.
pub struct MockTransport {
    behavior: MockBehavior,
    calls: AtomicUsize,
    last_request: Mutex<Option<RecordedRequest>>,
}

impl MockTransport {
    pub fn responding(status: u16, body: impl Into<axum::body::Bytes>) -> Self {
        Self::with_behavior(MockBehavior::Respond(UpstreamResponse::new(status, body)))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Fail(message.into()))
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl UpstreamTransport for MockTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<UpstreamResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some(RecordedRequest {
                url: url.to_string(),
                body: body.clone(),
            });
        }

        match &self.behavior {
            MockBehavior::Respond(response) => Ok(response.clone()),
            MockBehavior::Fail(message) => Err(TransportError::Connect(message.clone())),
        }
    }
}
