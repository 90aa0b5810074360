//! OpenAI-compatible API handlers
//!
//! Provides the OpenAI-compatible endpoint of the fake backend:
//! - `POST /v1/chat/completions` - Chat completions, JSON or SSE streaming

pub mod completions;
pub mod extractor;
pub mod streaming;
pub mod types;
