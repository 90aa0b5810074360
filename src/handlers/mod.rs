//! HTTP request handlers for fake-llm-endpoint

use crate::config::Config;
use crate::emitter::{Emitter, LatencyProfile};
use crate::error::{AppError, AppResult};
use crate::metrics::{Metrics, Rejection};
use crate::middleware::request_id_middleware;
use axum::{
    Router,
    extract::State,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod health;
pub mod metrics;
pub mod openai;

/// Path of the chat completions endpoint
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Application state shared across all handlers
///
/// Read-only configuration plus metrics. All fields are Arc'd for cheap
/// cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    metrics: Arc<Metrics>,
    reply: Arc<str>,
    latency: LatencyProfile,
}

impl AppState {
    /// Create a new AppState from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the Prometheus collectors cannot be registered.
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let metrics = Metrics::new()
            .map_err(|e| AppError::Internal(format!("Failed to initialize metrics: {}", e)))?;
        let reply: Arc<str> = Arc::from(config.completion.reply.as_str());
        let latency = LatencyProfile::from_config(&config.latency);

        Ok(Self {
            config,
            metrics: Arc::new(metrics),
            reply,
            latency,
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the metrics collector
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// A fresh emitter with its own random source, for one request
    pub fn emitter(&self) -> Emitter {
        Emitter::from_entropy(Arc::clone(&self.reply), self.latency)
    }
}

/// Build the application router
///
/// Every route is registered here; nothing is registered globally.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            CHAT_COMPLETIONS_PATH,
            post(openai::completions::handler).fallback(method_not_allowed),
        )
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Any method other than POST on the completions endpoint
///
/// Runs without touching the body, so no delay is simulated.
async fn method_not_allowed(State(state): State<AppState>) -> AppError {
    state.metrics().rejection(Rejection::MethodNotAllowed);
    AppError::MethodNotAllowed
}
