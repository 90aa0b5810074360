//! Configuration management for fake-llm-endpoint
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Every section is optional; a missing file section falls back to the
//! built-in defaults (port 8080, 1 MiB body cap, 12-18s thinking delay).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default cap on request body size (1 MiB)
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 1 << 20;

/// Default canned reply returned by every completion
pub const DEFAULT_REPLY: &str = "This is a fake chat completion.";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub latency: LatencyConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on the request body; larger bodies are rejected with 400
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_request_bytes: default_max_request_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_request_bytes() -> usize {
    DEFAULT_MAX_REQUEST_BYTES
}

/// What the fake model answers and how
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompletionConfig {
    /// Fixed reply text, streamed one character per chunk
    #[serde(default = "default_reply")]
    pub reply: String,
    /// When false, `stream: true` requests fail with 500 as if the transport
    /// could not flush incrementally
    #[serde(default = "default_streaming")]
    pub streaming: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            reply: default_reply(),
            streaming: default_streaming(),
        }
    }
}

fn default_reply() -> String {
    DEFAULT_REPLY.to_string()
}

fn default_streaming() -> bool {
    true
}

/// Simulated backend latency, in milliseconds
///
/// The thinking delay is drawn from `[thinking_base_ms, thinking_base_ms + thinking_jitter_ms]`
/// before any byte is written. In streaming mode each content chunk is followed by
/// a pause drawn from `[token_delay_min_ms, token_delay_max_ms)`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LatencyConfig {
    #[serde(default = "default_thinking_base_ms")]
    pub thinking_base_ms: u64,
    #[serde(default = "default_thinking_jitter_ms")]
    pub thinking_jitter_ms: u64,
    #[serde(default = "default_token_delay_min_ms")]
    pub token_delay_min_ms: u64,
    #[serde(default = "default_token_delay_max_ms")]
    pub token_delay_max_ms: u64,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            thinking_base_ms: default_thinking_base_ms(),
            thinking_jitter_ms: default_thinking_jitter_ms(),
            token_delay_min_ms: default_token_delay_min_ms(),
            token_delay_max_ms: default_token_delay_max_ms(),
        }
    }
}

impl LatencyConfig {
    pub fn thinking_base(&self) -> Duration {
        Duration::from_millis(self.thinking_base_ms)
    }

    pub fn thinking_jitter(&self) -> Duration {
        Duration::from_millis(self.thinking_jitter_ms)
    }

    pub fn token_delay_min(&self) -> Duration {
        Duration::from_millis(self.token_delay_min_ms)
    }

    pub fn token_delay_max(&self) -> Duration {
        Duration::from_millis(self.token_delay_max_ms)
    }
}

fn default_thinking_base_ms() -> u64 {
    12_000
}

fn default_thinking_jitter_ms() -> u64 {
    6_000
}

fn default_token_delay_min_ms() -> u64 {
    50
}

fn default_token_delay_max_ms() -> u64 {
    150
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl FromStr for Config {
    type Err = crate::error::AppError;

    /// Parse and validate configuration from a TOML string
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self =
            toml::from_str(s).map_err(|source| crate::error::AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: Read file (preserves io::Error context)
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            crate::error::AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        // Phase 2: Parse TOML (preserves toml::de::Error context)
        let config: Self = toml::from_str(&content).map_err(|source| {
            crate::error::AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            }
        })?;

        // Phase 3: Validate parsed config (provides contextual reason)
        config
            .validate()
            .map_err(|e| crate::error::AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// Called automatically by `from_file()` and `from_str()`, but can also be
    /// called explicitly when constructing Config in code (e.g., in tests).
    pub fn validate(&self) -> crate::error::AppResult<()> {
        if self.server.max_request_bytes == 0 {
            return Err(crate::error::AppError::Config(
                "server.max_request_bytes must be greater than 0".to_string(),
            ));
        }

        if self.completion.reply.is_empty() {
            return Err(crate::error::AppError::Config(
                "completion.reply cannot be empty: a stream needs at least one content chunk \
                to carry finish_reason"
                    .to_string(),
            ));
        }

        // Pacing is drawn from a half-open range, which must not be empty
        if self.latency.token_delay_min_ms >= self.latency.token_delay_max_ms {
            return Err(crate::error::AppError::Config(format!(
                "latency.token_delay_min_ms ({}) must be less than latency.token_delay_max_ms ({})",
                self.latency.token_delay_min_ms, self.latency.token_delay_max_ms
            )));
        }

        if self
            .latency
            .thinking_base_ms
            .checked_add(self.latency.thinking_jitter_ms)
            .is_none()
        {
            return Err(crate::error::AppError::Config(
                "latency.thinking_base_ms + latency.thinking_jitter_ms overflows".to_string(),
            ));
        }

        let level = self.observability.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(crate::error::AppError::Config(format!(
                "observability.log_level '{}' is invalid. Valid levels: {}",
                self.observability.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}
