//! munch server entry point.
//!
//! Tails one input (a file or standard input) and serves its lines to
//! WebSocket clients at `/events`.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use munch::api;
use munch::app_state::AppState;
use munch::config::{LogFormat, StreamConfig};
use munch::domain::ClientRegistry;
use munch::service::TailService;
use munch::tail::{LineParserFactory, LocalInputFactory, SourceFactory, Tailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = StreamConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting munch");

    let registry = Arc::new(ClientRegistry::new());

    // Start the tail bridge
    let factory = SourceFactory::new(
        LocalInputFactory,
        LineParserFactory::new(config.tail_source_name.clone()),
    )
    .with_read_buffer(config.tail_read_buffer);
    let definition = config.source_definition()?;
    let tailer = Tailer::open(&factory, &definition, config.tail_queue_capacity)
        .await
        .context("opening tail source")?;
    let bridge = tokio::spawn(TailService::new(tailer, Arc::clone(&registry)).run());

    // Build router
    let app = api::build_router(AppState::new(
        Arc::clone(&registry),
        config.client_queue_capacity,
    ));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&registry)))
        .await?;

    bridge.abort();
    match bridge.await {
        Ok(Err(err)) => tracing::warn!(error = %err, "tail bridge ended with error"),
        Ok(Ok(())) => {}
        Err(err) if err.is_cancelled() => {}
        Err(err) => tracing::error!(error = %err, "tail bridge panicked"),
    }

    Ok(())
}

/// Resolves on Ctrl-C after closing every client, so open WebSockets do
/// not hold the server's shutdown open.
async fn shutdown_signal(registry: Arc<ClientRegistry>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for interrupt");
        std::future::pending::<()>().await;
    }
    tracing::info!("process interrupted");
    registry.close().await;
}
