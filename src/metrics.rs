//! Prometheus metrics collection for fake-llm-endpoint
//!
//! This module provides metrics instrumentation for tracking:
//! - Completions served by response mode
//! - Requests rejected by the gateway, by reason
//! - Stream chunks delivered and streams cut short
//! - The simulated thinking delay
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Response mode for type-safe metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Single JSON document
    Json,
    /// Server-sent event stream
    Stream,
}

impl Mode {
    /// Convert mode to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Json => "json",
            Mode::Stream => "stream",
        }
    }
}

/// Gateway rejection reason for type-safe metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MethodNotAllowed,
    ContentType,
    BodyTooLarge,
    BodyRead,
    InvalidJson,
    StreamingUnsupported,
}

impl Rejection {
    /// Convert rejection to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::MethodNotAllowed => "method_not_allowed",
            Rejection::ContentType => "content_type",
            Rejection::BodyTooLarge => "body_too_large",
            Rejection::BodyRead => "body_read",
            Rejection::InvalidJson => "invalid_json",
            Rejection::StreamingUnsupported => "streaming_unsupported",
        }
    }
}

/// Metrics collector
///
/// Cloning is cheap: every collector is reference-counted by prometheus.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    completions_total: IntCounterVec,
    rejected_requests_total: IntCounterVec,
    stream_chunks_total: IntCounter,
    streams_aborted_total: IntCounter,
    thinking_delay: Histogram,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 2 modes
        let completions_total = IntCounterVec::new(
            Opts::new(
                "fake_llm_completions_total",
                "Total number of completions served by response mode",
            ),
            &["mode"],
        )?;

        // Cardinality: 6 reasons
        let rejected_requests_total = IntCounterVec::new(
            Opts::new(
                "fake_llm_rejected_requests_total",
                "Total number of requests rejected before or instead of a completion, by reason",
            ),
            &["reason"],
        )?;

        let stream_chunks_total = IntCounter::with_opts(Opts::new(
            "fake_llm_stream_chunks_total",
            "Total number of chat.completion.chunk events delivered to clients",
        ))?;

        let streams_aborted_total = IntCounter::with_opts(Opts::new(
            "fake_llm_streams_aborted_total",
            "Total number of streams cut short by a client disconnect or encoding failure",
        ))?;

        // Buckets cover the default 12-18s window plus tuned-down test setups
        let thinking_delay = Histogram::with_opts(
            HistogramOpts::new(
                "fake_llm_thinking_delay_seconds",
                "Simulated thinking delay applied before the first response byte",
            )
            .buckets(vec![
                0.0, 0.1, 0.5, 1.0, 5.0, 10.0, 12.0, 14.0, 16.0, 18.0, 30.0,
            ]),
        )?;

        registry.register(Box::new(completions_total.clone()))?;
        registry.register(Box::new(rejected_requests_total.clone()))?;
        registry.register(Box::new(stream_chunks_total.clone()))?;
        registry.register(Box::new(streams_aborted_total.clone()))?;
        registry.register(Box::new(thinking_delay.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            completions_total,
            rejected_requests_total,
            stream_chunks_total,
            streams_aborted_total,
            thinking_delay,
        })
    }

    pub fn completion(&self, mode: Mode) {
        self.completions_total
            .with_label_values(&[mode.as_str()])
            .inc();
    }

    pub fn rejection(&self, reason: Rejection) {
        self.rejected_requests_total
            .with_label_values(&[reason.as_str()])
            .inc();
    }

    pub fn stream_chunks(&self, count: usize) {
        self.stream_chunks_total.inc_by(count as u64);
    }

    pub fn stream_aborted(&self) {
        self.streams_aborted_total.inc();
    }

    pub fn thinking_delay(&self, delay: Duration) {
        self.thinking_delay.observe(delay.as_secs_f64());
    }

    pub fn completions_count(&self, mode: Mode) -> u64 {
        self.completions_total
            .with_label_values(&[mode.as_str()])
            .get()
    }

    pub fn rejections_count(&self, reason: Rejection) -> u64 {
        self.rejected_requests_total
            .with_label_values(&[reason.as_str()])
            .get()
    }

    pub fn stream_chunks_count(&self) -> u64 {
        self.stream_chunks_total.get()
    }

    pub fn streams_aborted_count(&self) -> u64 {
        self.streams_aborted_total.get()
    }

    /// Encode all registered metrics in Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();

        encoder.encode(&metric_families, &mut buffer).map_err(|e| {
            tracing::error!(
                error = %e,
                metric_family_count = metric_families.len(),
                "Prometheus text encoder failed"
            );
            e
        })?;

        String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("Metrics output is not UTF-8: {}", e)))
    }
}
