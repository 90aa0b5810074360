//! OpenAI-compatible streaming chat completions
//!
//! Handles the `stream: true` branch of POST /v1/chat/completions.

use crate::emitter::{ChannelSink, Emitter, ResponseIdentity, sink};
use crate::error::AppError;
use crate::handlers::AppState;
use crate::metrics::{Mode, Rejection};
use crate::middleware::RequestId;
use axum::{
    http::header,
    response::{IntoResponse, Response},
};

/// Content type of streaming responses
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream; charset=utf-8";

/// Events buffered between the emitter task and the connection
const FRAME_BUFFER: usize = 8;

/// Start streaming a completion
///
/// Returns the response head immediately; the body is fed by a spawned task
/// that runs the emitter against a [`ChannelSink`].
///
/// # SSE Format
///
/// Each event is formatted as:
/// ```text
/// data: {"id":"...","object":"chat.completion.chunk",...}
///
/// ```
///
/// The stream ends with:
/// ```text
/// data: [DONE]
///
/// ```
///
/// # Errors
///
/// [`AppError::StreamingUnsupported`] when streaming is disabled in the
/// configuration. Nothing has been written at that point.
pub fn respond(
    state: &AppState,
    mut emitter: Emitter,
    identity: ResponseIdentity,
    request_id: RequestId,
) -> Result<Response, AppError> {
    if !state.config().completion.streaming {
        state.metrics().rejection(Rejection::StreamingUnsupported);
        tracing::warn!(
            request_id = %request_id,
            "Streaming requested but disabled by configuration"
        );
        return Err(AppError::StreamingUnsupported);
    }

    let (mut events_tx, events) = ChannelSink::channel(FRAME_BUFFER);

    let response = (
        [
            (header::CONTENT_TYPE, EVENT_STREAM_CONTENT_TYPE),
            (header::CONNECTION, "keep-alive"),
        ],
        sink::sse(events),
    )
        .into_response();

    tracing::info!(
        request_id = %request_id,
        completion_id = %identity.id(),
        model = %identity.model(),
        "Starting streaming response"
    );

    let metrics = state.metrics().clone();
    tokio::spawn(async move {
        let outcome = emitter.stream(&identity, &mut events_tx).await;

        metrics.completion(Mode::Stream);
        metrics.stream_chunks(outcome.chunks_sent);

        match &outcome.aborted {
            None => tracing::info!(
                request_id = %request_id,
                completion_id = %identity.id(),
                chunks_sent = outcome.chunks_sent,
                "Streaming response finished"
            ),
            Some(reason) => {
                metrics.stream_aborted();
                tracing::warn!(
                    request_id = %request_id,
                    completion_id = %identity.id(),
                    chunks_sent = outcome.chunks_sent,
                    reason = %reason,
                    "Streaming response cut short"
                );
            }
        }
    });

    Ok(response)
}
