use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use http_body_util::LengthLimitError;
use service_core::error::AppError;
use service_core::middleware::tracing::RequestId;

use crate::AppState;

/// `/api/gemini`: preflight, method check, then validate-and-forward.
#[tracing::instrument(skip_all, fields(method = %method))]
pub async fn relay_prompt(
    State(state): State<AppState>,
    method: Method,
    request_id: Option<Extension<RequestId>>,
    body: Body,
) -> Result<Response, AppError> {
    if method == Method::OPTIONS {
        return Ok(preflight());
    }

    if method != Method::POST {
        tracing::debug!("Rejecting unsupported method");
        return Err(AppError::MethodNotAllowed);
    }

    let body = read_body(body, state.relay.max_body_bytes()).await?;
    let response = state.relay.relay(&body).await?;

    tracing::info!(
        request_id = %request_id.map(|Extension(id)| id.0).unwrap_or_default(),
        upstream_status = response.status,
        "Relayed prompt"
    );

    Ok(response.into_response())
}

fn preflight() -> Response {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )],
    )
        .into_response()
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, AppError> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        let inner = e.into_inner();
        if inner.is::<LengthLimitError>() {
            AppError::PayloadTooLarge(limit)
        } else {
            AppError::BadRequest(anyhow::anyhow!("Failed to read request body: {}", inner))
        }
    })
}
