//! Command-line interface for fake-llm-endpoint
//!
//! Provides argument parsing and subcommand handling for the binary.

use clap::{Parser, Subcommand};

/// Fake OpenAI-compatible chat completions endpoint
#[derive(Parser)]
#[command(name = "fake-llm-endpoint")]
#[command(version)]
#[command(about = "Fake OpenAI-compatible chat completions endpoint")]
#[command(
    long_about = "Serves POST /v1/chat/completions with a canned reply after a simulated \
    thinking delay, either as one JSON response or as an SSE stream paced one character \
    at a time. Intended for exercising clients and load tests without a real model."
)]
pub struct Cli {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# fake-llm-endpoint Configuration
# ================================
#
# Every section and key is optional. Values shown are the defaults.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 8080

# Largest accepted request body in bytes; bigger bodies get 400 Bad Request
max_request_bytes = 1048576

# ─────────────────────────────────────────────────────────────────────────────
# COMPLETION
# ─────────────────────────────────────────────────────────────────────────────

[completion]
# Reply sent for every request. Streaming emits one chunk per character.
reply = "This is a fake chat completion."

# Set to false to answer stream: true requests with 500 "Streaming not supported"
streaming = true

# ─────────────────────────────────────────────────────────────────────────────
# SIMULATED LATENCY (milliseconds)
# ─────────────────────────────────────────────────────────────────────────────
#
# Thinking delay before the first byte: uniform in [base, base + jitter].
# Pause after each streamed character: uniform in [min, max).

[latency]
thinking_base_ms = 12000
thinking_jitter_ms = 6000
token_delay_min_ms = 50
token_delay_max_ms = 150

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG takes precedence)
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}
