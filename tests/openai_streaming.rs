//! Integration tests for streaming /v1/chat/completions endpoint (OpenAI-compatible)
//!
//! Tests the SSE streaming functionality including:
//! - Content-Type and cache headers
//! - SSE event format (data: prefix, double newline)
//! - Chunk structure (initial role, per-character deltas, finish reason)
//! - [DONE] termination signal
//! - Streaming disabled by configuration

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use fake_llm_endpoint::{
    config::Config,
    handlers::{
        self, AppState,
        openai::types::{ChatCompletionChunk, ChatCompletionRequest, ChatMessage},
    },
    metrics::{Mode, Rejection},
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const REPLY: &str = "This is a fake chat completion.";

fn create_test_state(toml: &str) -> AppState {
    let config = Config::from_str(toml).expect("should parse TOML config");
    AppState::new(Arc::new(config)).expect("AppState::new should succeed")
}

fn create_test_app(state: AppState) -> Router {
    handlers::router(state)
}

fn streaming_request(model: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&ChatCompletionRequest::new(
                model,
                vec![ChatMessage::new("user", "hi")],
                true,
            ))
            .unwrap(),
        ))
        .unwrap()
}

/// Split an SSE body into the payloads of its `data:` events
fn data_payloads(body: &str) -> Vec<String> {
    assert!(body.ends_with("\n\n"), "body should end with a blank line");
    body.split("\n\n")
        .filter(|event| !event.is_empty())
        .map(|event| {
            event
                .strip_prefix("data: ")
                .unwrap_or_else(|| panic!("event without data prefix: {:?}", event))
                .to_string()
        })
        .collect()
}

async fn collect_stream(app: Router, model: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = app.oneshot(streaming_request(model)).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

// -------------------------------------------------------------------------
// Headers
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_streaming_returns_event_stream_headers() {
    let (status, headers, _) = collect_stream(create_test_app(create_test_state("")), "m").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream; charset=utf-8"
    );
    assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-cache");
    assert_eq!(headers.get(header::CONNECTION).unwrap(), "keep-alive");
}

// -------------------------------------------------------------------------
// Chunk sequence
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_streaming_chunk_sequence() {
    let (_, _, body) = collect_stream(create_test_app(create_test_state("")), "test-model").await;
    let payloads = data_payloads(&body);

    let n = REPLY.chars().count();
    assert_eq!(payloads.len(), 1 + n + 1, "role chunk + {} content chunks + [DONE]", n);
    assert_eq!(payloads.last().unwrap(), "[DONE]");

    let chunks: Vec<ChatCompletionChunk> = payloads[..payloads.len() - 1]
        .iter()
        .map(|p| serde_json::from_str(p).expect("chunk should decode"))
        .collect();

    let first = &chunks[0].choices[0];
    assert_eq!(first.delta.role.as_deref(), Some("assistant"));
    assert!(first.delta.content.is_none());
    assert!(first.finish_reason.is_none());

    for (i, chunk) in chunks[1..].iter().enumerate() {
        let choice = &chunk.choices[0];
        assert!(choice.delta.role.is_none());
        assert_eq!(choice.index, 0);
        if i + 1 == n {
            assert!(choice.finish_reason.is_some(), "last content chunk should stop");
        } else {
            assert!(choice.finish_reason.is_none(), "chunk {} should not stop", i);
        }
    }

    let content: String = chunks[1..]
        .iter()
        .map(|c| c.choices[0].delta.content.clone().unwrap())
        .collect();
    assert_eq!(content, REPLY);
}

#[tokio::test(start_paused = true)]
async fn test_streaming_first_and_last_lines_match_wire_format() {
    let (_, _, body) = collect_stream(create_test_app(create_test_state("")), "test-model").await;
    let payloads = data_payloads(&body);

    let first = &payloads[0];
    assert!(first.starts_with(r#"{"id":"chatcmpl-"#), "got {}", first);
    assert!(first.contains(r#""object":"chat.completion.chunk""#));
    assert!(first.ends_with(r#""choices":[{"delta":{"role":"assistant"},"index":0}]}"#));

    let last_content = &payloads[payloads.len() - 2];
    assert!(last_content.ends_with(
        r#""choices":[{"delta":{"content":"."},"index":0,"finish_reason":"stop"}]}"#
    ));

    assert!(body.ends_with("data: [DONE]\n\n"));
}

#[tokio::test(start_paused = true)]
async fn test_streaming_chunks_share_identity() {
    let (_, _, body) = collect_stream(create_test_app(create_test_state("")), "shared").await;
    let payloads = data_payloads(&body);

    let chunks: Vec<ChatCompletionChunk> = payloads[..payloads.len() - 1]
        .iter()
        .map(|p| serde_json::from_str(p).unwrap())
        .collect();

    let (id, created) = (&chunks[0].id, chunks[0].created);
    for chunk in &chunks {
        assert_eq!(&chunk.id, id);
        assert_eq!(chunk.created, created);
        assert_eq!(chunk.model, "shared");
    }
}

#[tokio::test(start_paused = true)]
async fn test_streaming_splits_multibyte_reply_by_character() {
    let state = create_test_state("[completion]\nreply = \"Grüße 🌍\"\n");
    let (_, _, body) = collect_stream(create_test_app(state), "m").await;
    let payloads = data_payloads(&body);

    // 7 code points spread over 12 bytes of UTF-8
    assert_eq!(payloads.len(), 1 + 7 + 1);
    let content: String = payloads[1..payloads.len() - 1]
        .iter()
        .map(|p| {
            let chunk: ChatCompletionChunk = serde_json::from_str(p).unwrap();
            chunk.choices[0].delta.content.clone().unwrap()
        })
        .collect();
    assert_eq!(content, "Grüße 🌍");
}

// -------------------------------------------------------------------------
// Timing
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_streaming_waits_before_headers_and_paces_chunks() {
    let app = create_test_app(create_test_state(""));

    let start = tokio::time::Instant::now();
    let response = app.oneshot(streaming_request("m")).await.unwrap();
    let head_at = start.elapsed();

    assert!(
        head_at >= Duration::from_secs(12) && head_at <= Duration::from_millis(18_100),
        "headers should follow the thinking delay, got {:?}",
        head_at
    );

    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let pacing = start.elapsed() - head_at;

    let n = REPLY.chars().count() as u32;
    assert!(pacing >= Duration::from_millis(50) * n, "{:?}", pacing);
    assert!(pacing < Duration::from_millis(150) * n, "{:?}", pacing);
}

// -------------------------------------------------------------------------
// Metrics
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_streaming_records_chunks() {
    let state = create_test_state("");
    let (status, _, _) = collect_stream(create_test_app(state.clone()), "m").await;
    assert_eq!(status, StatusCode::OK);

    // The emitter task records after [DONE]; let it finish
    tokio::task::yield_now().await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(state.metrics().completions_count(Mode::Stream), 1);
    assert_eq!(
        state.metrics().stream_chunks_count(),
        1 + REPLY.chars().count() as u64
    );
    assert_eq!(state.metrics().streams_aborted_count(), 0);
}

// -------------------------------------------------------------------------
// Streaming disabled
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_streaming_disabled_returns_500_after_delay() {
    let state = create_test_state("[completion]\nstreaming = false\n");
    let app = create_test_app(state.clone());

    let start = tokio::time::Instant::now();
    let (status, headers, body) = collect_stream(app, "m").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Streaming not supported");
    assert!(
        !headers
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );
    assert!(start.elapsed() >= Duration::from_secs(12));
    assert_eq!(
        state
            .metrics()
            .rejections_count(Rejection::StreamingUnsupported),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_streaming_disabled_still_serves_json() {
    let state = create_test_state("[completion]\nstreaming = false\n");
    let response = create_test_app(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/chat/completions")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"model":"m","stream":false}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
