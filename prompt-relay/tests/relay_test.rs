mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{body_bytes, body_json, router_with, TEST_API_KEY, TEST_MODEL, TEST_ORIGIN};
use prompt_relay::config::PLACEHOLDER_API_KEY;
use prompt_relay::services::MockTransport;
use prompt_relay::RELAY_PATH;
use std::sync::Arc;
use tower::util::ServiceExt;

const GEMINI_REPLY: &str = r#"{"candidates":[{"content":{"parts":[{"text":"1. Agree on a mediator..."}]}}]}"#;

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(RELAY_PATH)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn assert_cors(headers: &axum::http::HeaderMap) {
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], TEST_ORIGIN);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
}

#[tokio::test]
async fn preflight_returns_empty_ok() {
    let transport = Arc::new(MockTransport::responding(200, GEMINI_REPLY));
    let app = router_with(transport.clone(), Some(TEST_API_KEY));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri(RELAY_PATH)
                .header("Origin", TEST_ORIGIN)
                .header("Access-Control-Request-Method", "POST")
                .body(Body::from("this is not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(response.headers());
    assert!(body_bytes(response).await.is_empty());
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn unsupported_methods_are_rejected() {
    for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH] {
        let transport = Arc::new(MockTransport::responding(200, GEMINI_REPLY));
        let app = router_with(transport.clone(), Some(TEST_API_KEY));

        let response = app
            .oneshot(
                Request::builder()
                    .method(method.clone())
                    .uri(RELAY_PATH)
                    .body(Body::from(r#"{"prompt":"Hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", method);
        assert_cors(response.headers());
        assert_eq!(
            &body_bytes(response).await[..],
            br#"{"error":"Method not allowed"}"#
        );
        assert_eq!(transport.call_count(), 0);
    }
}

#[tokio::test]
async fn invalid_bodies_are_bad_requests() {
    let cases = [
        "",
        "{not json",
        "{}",
        r#"{"prompt":""}"#,
        r#"{"prompt":null}"#,
        r#"{"prompt":42}"#,
        r#"["Hello"]"#,
    ];

    for body in cases {
        let transport = Arc::new(MockTransport::responding(200, GEMINI_REPLY));
        let app = router_with(transport.clone(), Some(TEST_API_KEY));

        let response = app.oneshot(post(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {:?}", body);
        assert_cors(response.headers());
        let json = body_json(response).await;
        assert!(json["error"].is_string(), "body: {:?}", body);
        assert_eq!(transport.call_count(), 0, "body: {:?}", body);
    }
}

#[tokio::test]
async fn missing_prompt_reports_prompt_required() {
    let transport = Arc::new(MockTransport::responding(200, GEMINI_REPLY));
    let app = router_with(transport, Some(TEST_API_KEY));

    let response = app.oneshot(post("{}")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "Prompt is required" })
    );
}

#[tokio::test]
async fn valid_prompt_is_relayed_verbatim() {
    let transport = Arc::new(MockTransport::responding(200, GEMINI_REPLY));
    let app = router_with(transport.clone(), Some(TEST_API_KEY));

    let response = app
        .oneshot(post(r#"{"prompt":"Summarize divorce mediation steps"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(response.headers());
    assert_eq!(&body_bytes(response).await[..], GEMINI_REPLY.as_bytes());

    assert_eq!(transport.call_count(), 1);
    let recorded = transport.last_request().unwrap();
    assert_eq!(
        recorded.url,
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            TEST_MODEL, TEST_API_KEY
        )
    );
    assert_eq!(
        recorded.body,
        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": "Summarize divorce mediation steps" }]
            }]
        })
    );
}

#[tokio::test]
async fn whitespace_prompt_is_relayed_unchanged() {
    let transport = Arc::new(MockTransport::responding(200, "{}"));
    let app = router_with(transport.clone(), Some(TEST_API_KEY));

    let response = app.oneshot(post(r#"{"prompt":"   "}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(response.headers());
    assert_eq!(&body_bytes(response).await[..], b"{}");

    assert_eq!(transport.call_count(), 1);
    let recorded = transport.last_request().unwrap();
    assert_eq!(recorded.body["contents"][0]["parts"][0]["text"], "   ");
}

#[tokio::test]
async fn upstream_errors_pass_through_unchanged() {
    let upstream_body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
    for status in [400u16, 403, 429, 503] {
        let transport = Arc::new(MockTransport::responding(status, upstream_body));
        let app = router_with(transport, Some(TEST_API_KEY));

        let response = app.oneshot(post(r#"{"prompt":"Hello"}"#)).await.unwrap();

        assert_eq!(response.status().as_u16(), status);
        assert_cors(response.headers());
        assert_eq!(&body_bytes(response).await[..], upstream_body.as_bytes());
    }
}

#[tokio::test]
async fn non_json_upstream_body_is_not_reinterpreted() {
    let transport = Arc::new(MockTransport::responding(502, "<html>Bad Gateway</html>"));
    let app = router_with(transport, Some(TEST_API_KEY));

    let response = app.oneshot(post(r#"{"prompt":"Hello"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(&body_bytes(response).await[..], b"<html>Bad Gateway</html>");
}

#[tokio::test]
async fn missing_api_key_fails_without_upstream_call() {
    for key in [None, Some(""), Some(PLACEHOLDER_API_KEY)] {
        let transport = Arc::new(MockTransport::responding(200, GEMINI_REPLY));
        let app = router_with(transport.clone(), key);

        let response = app.oneshot(post(r#"{"prompt":"Hello"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "key: {:?}", key);
        assert_cors(response.headers());
        let json = body_json(response).await;
        assert!(json["error"].is_string());
        assert_eq!(transport.call_count(), 0, "key: {:?}", key);
    }
}

#[tokio::test]
async fn bad_request_takes_precedence_over_missing_key() {
    let transport = Arc::new(MockTransport::responding(200, GEMINI_REPLY));
    let app = router_with(transport.clone(), None);

    let response = app.oneshot(post(r#"{"prompt":""}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn transport_failure_reports_details() {
    let transport = Arc::new(MockTransport::failing("dns error: no such host"));
    let app = router_with(transport.clone(), Some(TEST_API_KEY));

    let response = app.oneshot(post(r#"{"prompt":"Hello"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(response.headers());
    let json = body_json(response).await;
    assert!(json["error"].is_string());
    assert!(json["details"]
        .as_str()
        .unwrap()
        .contains("dns error: no such host"));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let transport = Arc::new(MockTransport::responding(200, GEMINI_REPLY));
    let app = router_with(transport.clone(), Some(TEST_API_KEY));

    let prompt = "a".repeat(8192);
    let response = app
        .oneshot(post(format!(r#"{{"prompt":"{}"}}"#, prompt)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_cors(response.headers());
    assert!(body_json(response).await["error"].is_string());
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let transport = Arc::new(MockTransport::responding(200, GEMINI_REPLY));
    let app = router_with(transport, Some(TEST_API_KEY));

    let mut request = post(r#"{"prompt":"Hello"}"#);
    request
        .headers_mut()
        .insert("x-request-id", "req-42".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn health_reports_configuration_without_key() {
    let transport = Arc::new(MockTransport::responding(200, GEMINI_REPLY));
    let app = router_with(transport, Some(TEST_API_KEY));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        TEST_ORIGIN
    );
    let raw = body_bytes(response).await;
    assert!(!String::from_utf8_lossy(&raw).contains(TEST_API_KEY));

    let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "prompt-relay");
    assert_eq!(json["upstream_configured"], true);
}
