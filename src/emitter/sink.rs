//! Server-sent events and the frame sink capability
//!
//! The streaming emitter never writes to a socket directly. It hands each
//! [`Event`] to a [`FrameSink`], whose contract is "deliver this event to the
//! client now". Anything that cannot deliver incrementally simply does not
//! implement the trait, so it can never be handed to the streaming path.
//!
//! Wire framing (`data: <payload>\n\n`) is left to axum's [`Sse`] body.

use async_trait::async_trait;
use axum::response::sse::{Event, Sse};
use futures::{SinkExt, Stream, StreamExt, channel::mpsc};
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;

/// Payload of the final event of every stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// Encode a value as the JSON data of one event
pub fn json_event<T: Serialize>(value: &T) -> Result<Event, axum::Error> {
    Event::default().json_data(value)
}

/// The `data: [DONE]` terminator
pub fn done_event() -> Event {
    Event::default().data(DONE_SENTINEL)
}

/// Wrap a stream of events as an SSE body
///
/// No keep-alive comments are interleaved: the client sees exactly the
/// events that were sent.
pub fn sse<S>(events: S) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = Event> + Send + 'static,
{
    Sse::new(events.map(Ok::<_, Infallible>))
}

/// The receiving side went away; further writes are pointless
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("client disconnected")]
pub struct SinkClosed;

/// A transport that can push events to the client one at a time
#[async_trait]
pub trait FrameSink: Send {
    /// Write one event and make it observable by the client immediately
    async fn send_frame(&mut self, event: Event) -> Result<(), SinkClosed>;
}

/// Frame sink backed by a bounded channel
///
/// The receiver half becomes the SSE response body. Hyper drops the body
/// when the client disconnects, which turns the next `send_frame` into
/// [`SinkClosed`]. Dropping the sink ends the body.
pub struct ChannelSink {
    tx: mpsc::Sender<Event>,
}

impl ChannelSink {
    /// Create a sink and the receiver to stream into the response body
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send_frame(&mut self, event: Event) -> Result<(), SinkClosed> {
        self.tx.send(event).await.map_err(|_| SinkClosed)
    }
}

/// In-memory sink that records every event
#[async_trait]
impl FrameSink for Vec<Event> {
    async fn send_frame(&mut self, event: Event) -> Result<(), SinkClosed> {
        self.push(event);
        Ok(())
    }
}

/// Render recorded events through the SSE body, one string per event
#[cfg(test)]
pub(crate) async fn render(events: Vec<Event>) -> Vec<String> {
    use axum::response::IntoResponse;

    let body = sse(futures::stream::iter(events)).into_response().into_body();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec())
        .unwrap()
        .split_inclusive("\n\n")
        .map(str::to_string)
        .collect()
}
