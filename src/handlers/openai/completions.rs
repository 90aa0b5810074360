//! OpenAI-compatible chat completions handler
//!
//! Handles POST /v1/chat/completions requests (both streaming and non-streaming).

use crate::error::AppError;
use crate::handlers::AppState;
use crate::metrics::Mode;
use crate::middleware::RequestId;
use axum::{
    Extension,
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};

use super::extractor::CompletionJson;
use super::types::ChatCompletionRequest;

/// Content type of non-streaming responses
pub const JSON_RESPONSE_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// POST /v1/chat/completions handler
///
/// The request has already passed the gateway ([`CompletionJson`]): method,
/// content type, size and JSON shape are valid. Every accepted request first
/// waits out the simulated thinking delay, then gets one id and timestamp.
///
/// # Response Format
///
/// **Non-streaming** (`stream: false` or omitted): one `chat.completion`
/// object carrying the whole canned reply, `finish_reason: "stop"`.
///
/// **Streaming** (`stream: true`): see [`super::streaming::respond`].
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    CompletionJson(request): CompletionJson<ChatCompletionRequest>,
) -> Result<Response, AppError> {
    tracing::debug!(
        request_id = %request_id,
        model = %request.model(),
        messages_count = request.messages().len(),
        stream = request.stream(),
        "Received chat completions request"
    );

    let mut emitter = state.emitter();

    let delay = emitter.think().await;
    state.metrics().thinking_delay(delay);
    tracing::info!(
        request_id = %request_id,
        delay_ms = delay.as_millis() as u64,
        "Processing delay elapsed"
    );

    let identity = emitter.identify(request.model());

    if request.stream() {
        return super::streaming::respond(&state, emitter, identity, request_id);
    }

    let completion = emitter.complete(&identity);
    let body = serde_json::to_vec(&completion)
        .map_err(|e| AppError::ResponseEncoding(e.to_string()))?;

    state.metrics().completion(Mode::Json);
    tracing::info!(
        request_id = %request_id,
        completion_id = %identity.id(),
        model = %identity.model(),
        "Completion sent"
    );

    Ok((
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static(JSON_RESPONSE_CONTENT_TYPE),
        )],
        body,
    )
        .into_response())
}
