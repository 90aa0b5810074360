//! fake-llm-endpoint - Fake OpenAI-compatible chat completions backend
//!
//! Answers every chat completion with the same canned reply, either as one
//! JSON document or as a server-sent event stream paced one character at a
//! time, after a simulated thinking delay. Meant for exercising clients, UIs
//! and load tests without running a model.

pub mod cli;
pub mod config;
pub mod emitter;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod telemetry;
