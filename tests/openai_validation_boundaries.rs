//! Request gateway boundary tests
//!
//! Content type, body size and JSON decoding are checked before any
//! simulated processing: rejections come back as 400 with a plain-text
//! body and without the thinking delay.

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use fake_llm_endpoint::{
    config::{Config, DEFAULT_MAX_REQUEST_BYTES},
    handlers::{self, AppState},
    metrics::Rejection,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct Outcome {
    status: StatusCode,
    body: String,
    elapsed: Duration,
}

fn create_test_state(toml: &str) -> AppState {
    let config = Config::from_str(toml).expect("should parse TOML config");
    AppState::new(Arc::new(config)).expect("AppState::new should succeed")
}

async fn post(state: &AppState, content_type: Option<&str>, body: impl Into<Body>) -> Outcome {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/chat/completions");
    if let Some(ct) = content_type {
        builder = builder.header(header::CONTENT_TYPE, ct);
    }
    let request = builder.body(body.into()).unwrap();

    let start = tokio::time::Instant::now();
    let response = handlers::router(state.clone())
        .oneshot(request)
        .await
        .unwrap();
    let elapsed = start.elapsed();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    Outcome {
        status,
        body: String::from_utf8_lossy(&body).into_owned(),
        elapsed,
    }
}

// -------------------------------------------------------------------------
// Content-Type
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_text_plain_is_rejected_before_parsing() {
    let state = create_test_state("");
    let outcome = post(
        &state,
        Some("text/plain"),
        r#"{"model":"m","messages":[],"stream":false}"#,
    )
    .await;

    assert_eq!(outcome.status, StatusCode::BAD_REQUEST);
    assert_eq!(outcome.body, "Expected Content-Type application/json");
    assert!(outcome.elapsed < Duration::from_secs(1));
    assert_eq!(state.metrics().rejections_count(Rejection::ContentType), 1);
    assert_eq!(state.metrics().rejections_count(Rejection::InvalidJson), 0);
}

#[tokio::test(start_paused = true)]
async fn test_missing_content_type_is_rejected() {
    let state = create_test_state("");
    let outcome = post(&state, None, "{}").await;
    assert_eq!(outcome.status, StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn test_content_type_prefix_match_accepts_parameters() {
    let state = create_test_state("[latency]\nthinking_base_ms = 0\nthinking_jitter_ms = 0\n");
    let outcome = post(
        &state,
        Some("application/json; charset=utf-8"),
        r#"{"model":"m"}"#,
    )
    .await;
    assert_eq!(outcome.status, StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn test_content_type_match_is_prefix_not_substring() {
    let state = create_test_state("");
    let outcome = post(&state, Some("text/application/json"), r#"{"model":"m"}"#).await;
    assert_eq!(outcome.status, StatusCode::BAD_REQUEST);
}

// -------------------------------------------------------------------------
// Body size
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_body_over_one_mebibyte_is_rejected() {
    let state = create_test_state("");
    let padding = "a".repeat(DEFAULT_MAX_REQUEST_BYTES);
    let body = format!(
        r#"{{"model":"m","messages":[{{"role":"user","content":"{}"}}]}}"#,
        padding
    );
    assert!(body.len() > DEFAULT_MAX_REQUEST_BYTES);

    let outcome = post(&state, Some("application/json"), body).await;

    assert_eq!(outcome.status, StatusCode::BAD_REQUEST);
    assert_eq!(outcome.body, "Request body exceeds 1048576 bytes");
    assert!(outcome.elapsed < Duration::from_secs(1));
    assert_eq!(state.metrics().rejections_count(Rejection::BodyTooLarge), 1);
}

#[tokio::test(start_paused = true)]
async fn test_oversized_streamed_body_is_cut_off() {
    // A body without Content-Length that never ends on its own
    let state = create_test_state("[server]\nmax_request_bytes = 1024\n");
    let chunks = futures::stream::repeat_with(|| {
        Ok::<_, std::io::Error>(axum::body::Bytes::from_static(&[b' '; 256]))
    });

    let outcome = post(&state, Some("application/json"), Body::from_stream(chunks)).await;

    assert_eq!(outcome.status, StatusCode::BAD_REQUEST);
    assert_eq!(outcome.body, "Request body exceeds 1024 bytes");
}

#[tokio::test(start_paused = true)]
async fn test_large_body_under_limit_is_accepted() {
    let state = create_test_state("[latency]\nthinking_base_ms = 0\nthinking_jitter_ms = 0\n");
    let body = format!(
        r#"{{"model":"m","messages":[{{"role":"user","content":"{}"}}]}}"#,
        "a".repeat(DEFAULT_MAX_REQUEST_BYTES - 100)
    );
    assert!(body.len() <= DEFAULT_MAX_REQUEST_BYTES);

    let outcome = post(&state, Some("application/json"), body).await;
    assert_eq!(outcome.status, StatusCode::OK);
}

// -------------------------------------------------------------------------
// JSON decoding
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_malformed_json_is_rejected() {
    let state = create_test_state("");
    let outcome = post(&state, Some("application/json"), r#"{"model": "m", "#).await;

    assert_eq!(outcome.status, StatusCode::BAD_REQUEST);
    assert_eq!(outcome.body, "Invalid JSON body");
    assert!(outcome.elapsed < Duration::from_secs(1));
    assert_eq!(state.metrics().rejections_count(Rejection::InvalidJson), 1);
}

#[tokio::test(start_paused = true)]
async fn test_wrong_field_type_is_rejected() {
    let state = create_test_state("");
    let outcome = post(
        &state,
        Some("application/json"),
        r#"{"model":"m","messages":"hello"}"#,
    )
    .await;
    assert_eq!(outcome.status, StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn test_empty_messages_are_accepted() {
    let state = create_test_state("[latency]\nthinking_base_ms = 0\nthinking_jitter_ms = 0\n");
    let outcome = post(
        &state,
        Some("application/json"),
        r#"{"model":"m","messages":[],"stream":false}"#,
    )
    .await;
    assert_eq!(outcome.status, StatusCode::OK);
}
