//! fake-llm-endpoint HTTP server
//!
//! Starts an Axum web server answering chat completions with a canned reply.

use clap::Parser;
use fake_llm_endpoint::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    handlers::{self, AppState},
    telemetry,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                eprintln!("Wrote configuration template to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    // Initialize telemetry
    telemetry::init(&config.observability.log_level);

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| {
                tracing::warn!(
                    host = %config.server.host,
                    "Invalid server.host, falling back to 0.0.0.0"
                );
                std::net::IpAddr::from([0, 0, 0, 0])
            }),
        config.server.port,
    ));

    tracing::info!(
        thinking_base_ms = config.latency.thinking_base_ms,
        thinking_jitter_ms = config.latency.thinking_jitter_ms,
        max_request_bytes = config.server.max_request_bytes,
        streaming = config.completion.streaming,
        "Starting fake-llm-endpoint"
    );

    let state = AppState::new(Arc::new(config))?;
    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!(
        "Chat completions available at http://{}{}",
        addr,
        handlers::CHAT_COMPLETIONS_PATH
    );

    axum::serve(listener, app).await?;

    Ok(())
}
