//! Completion emitter
//!
//! Renders the canned reply either as one [`ChatCompletion`] or as an
//! OpenAI-style event stream:
//!
//! ```text
//! data: {"id":"chatcmpl-…","object":"chat.completion.chunk",…,"choices":[{"delta":{"role":"assistant"},"index":0}]}
//!
//! data: {…,"choices":[{"delta":{"content":"T"},"index":0}]}
//!
//! …
//!
//! data: {…,"choices":[{"delta":{"content":"."},"index":0,"finish_reason":"stop"}]}
//!
//! data: [DONE]
//!
//! ```
//!
//! One content chunk is emitted per Unicode scalar value of the reply, each
//! followed by a random pacing delay. An emitter is built per request and owns
//! its random source, so nothing is shared between concurrent requests.

pub mod latency;
pub mod sink;

pub use latency::LatencyProfile;
pub use sink::{ChannelSink, DONE_SENTINEL, FrameSink, SinkClosed};

use crate::handlers::openai::types::{
    ChatCompletion, ChatCompletionChunk, FinishReason, current_timestamp,
};
use axum::response::sse::Event;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Values shared by every chunk of one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseIdentity {
    id: String,
    created: i64,
    model: String,
}

impl ResponseIdentity {
    pub fn new(id: impl Into<String>, created: i64, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created,
            model: model.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created(&self) -> i64 {
        self.created
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Generate a completion id from the wall clock plus up to 999ns of jitter
///
/// Uniqueness is best-effort; the id only groups the chunks of one response.
pub fn completion_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("chatcmpl-{}", nanos + rng.random_range(0..1000u128))
}

/// Content chunks for `reply`, one per character, the last one carrying `stop`
pub fn content_chunks<'a>(
    identity: &'a ResponseIdentity,
    reply: &'a str,
) -> impl Iterator<Item = ChatCompletionChunk> + 'a {
    let total = reply.chars().count();
    reply.chars().enumerate().map(move |(i, ch)| {
        let finish_reason = (i + 1 == total).then_some(FinishReason::Stop);
        let mut buf = [0u8; 4];
        ChatCompletionChunk::content(
            identity.id(),
            identity.model(),
            identity.created(),
            ch.encode_utf8(&mut buf),
            finish_reason,
        )
    })
}

/// Why a stream stopped before its last content chunk
#[derive(Debug, Error)]
pub enum StreamAbort {
    #[error("failed to encode chunk: {0}")]
    Encode(#[from] axum::Error),

    #[error(transparent)]
    Disconnected(#[from] SinkClosed),
}

/// What a finished stream actually delivered
#[derive(Debug, Default)]
pub struct StreamOutcome {
    /// Events accepted by the sink, sentinel excluded
    pub chunks_sent: usize,
    /// Content chunks among `chunks_sent`
    pub content_chunks_sent: usize,
    pub aborted: Option<StreamAbort>,
    pub done_sent: bool,
}

impl StreamOutcome {
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none() && self.done_sent
    }
}

/// Every chunk of one stream in order: role announcement, then content
pub fn stream_chunks<'a>(
    identity: &'a ResponseIdentity,
    reply: &'a str,
) -> impl Iterator<Item = ChatCompletionChunk> + 'a {
    std::iter::once(ChatCompletionChunk::initial(
        identity.id(),
        identity.model(),
        identity.created(),
    ))
    .chain(content_chunks(identity, reply))
}

/// Per-request completion renderer
pub struct Emitter<R = StdRng> {
    reply: Arc<str>,
    latency: LatencyProfile,
    rng: R,
}

impl Emitter<StdRng> {
    /// Emitter seeded from the operating system
    pub fn from_entropy(reply: Arc<str>, latency: LatencyProfile) -> Self {
        Self::new(reply, latency, StdRng::from_os_rng())
    }
}

impl<R: Rng + Send> Emitter<R> {
    pub fn new(reply: impl Into<Arc<str>>, latency: LatencyProfile, rng: R) -> Self {
        Self {
            reply: reply.into(),
            latency,
            rng,
        }
    }

    pub fn reply(&self) -> &str {
        &self.reply
    }

    pub fn latency(&self) -> &LatencyProfile {
        &self.latency
    }

    /// Sleep for the simulated thinking time and return how long it was
    pub async fn think(&mut self) -> Duration {
        let delay = self.latency.thinking_delay(&mut self.rng);
        tokio::time::sleep(delay).await;
        delay
    }

    /// Fresh id and timestamp for a response to `model`
    pub fn identify(&mut self, model: &str) -> ResponseIdentity {
        ResponseIdentity::new(completion_id(&mut self.rng), current_timestamp(), model)
    }

    /// The whole reply as a single non-streaming response
    pub fn complete(&self, identity: &ResponseIdentity) -> ChatCompletion {
        ChatCompletion::new(
            identity.id(),
            identity.model(),
            identity.created(),
            &self.reply,
        )
    }

    /// The chunks [`Emitter::stream`] writes, before encoding
    pub fn chunks<'a>(
        &'a self,
        identity: &'a ResponseIdentity,
    ) -> impl Iterator<Item = ChatCompletionChunk> + 'a {
        stream_chunks(identity, &self.reply)
    }

    /// Write the full event stream into `sink`, one JSON event per chunk
    pub async fn stream<S>(&mut self, identity: &ResponseIdentity, sink: &mut S) -> StreamOutcome
    where
        S: FrameSink + ?Sized,
    {
        self.stream_with(identity, sink, sink::json_event::<ChatCompletionChunk>)
            .await
    }

    /// Write the full event stream, turning each chunk into an event with `encode`
    ///
    /// The stream ends at the first encoding failure or failed write. The
    /// `[DONE]` sentinel is attempted in every case.
    pub async fn stream_with<S, E>(
        &mut self,
        identity: &ResponseIdentity,
        sink: &mut S,
        mut encode: E,
    ) -> StreamOutcome
    where
        S: FrameSink + ?Sized,
        E: FnMut(&ChatCompletionChunk) -> Result<Event, axum::Error> + Send,
    {
        let mut outcome = StreamOutcome::default();
        let reply = Arc::clone(&self.reply);

        for (position, chunk) in stream_chunks(identity, &reply).enumerate() {
            let sent = match encode(&chunk) {
                Ok(event) => sink.send_frame(event).await.map_err(StreamAbort::from),
                Err(e) => Err(StreamAbort::from(e)),
            };
            if let Err(abort) = sent {
                outcome.aborted = Some(abort);
                break;
            }
            outcome.chunks_sent += 1;

            // Only content chunks are paced; the role announcement goes out at once
            if position > 0 {
                outcome.content_chunks_sent += 1;
                let pause = self.latency.token_delay(&mut self.rng);
                tokio::time::sleep(pause).await;
            }
        }

        if let Some(abort) = &outcome.aborted {
            tracing::debug!(
                completion_id = %identity.id(),
                chunks_sent = outcome.chunks_sent,
                reason = %abort,
                "Stream cut short, sending terminator anyway"
            );
        }

        outcome.done_sent = sink.send_frame(sink::done_event()).await.is_ok();
        outcome
    }
}
