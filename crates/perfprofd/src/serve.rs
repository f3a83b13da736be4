//! Server mode: runs the profile API over HTTP.
//!
//! In this mode, the daemon:
//! 1. Loads perfprof.toml and applies command-line overrides
//! 2. Opens the configured data source
//! 3. Serves the REST API until Ctrl-C or SIGTERM
//!
//! The shutdown signal also cancels in-flight profile requests.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use perfprof_core::ProfilerConfig;
use perfprof_engine::ProfileEngine;

use crate::cli::{self, SourceArgs};

/// Build the engine for a resolved configuration.
pub async fn build_engine(config: &ProfilerConfig) -> anyhow::Result<ProfileEngine> {
    let datasource = config
        .datasource
        .as_ref()
        .context("no data source configured")?;
    let source = perfprof_datasource::from_config(datasource).await?;
    let engine = ProfileEngine::with_config(source, &config.engine())?;
    info!(concurrency = engine.concurrency(), "profile engine initialized");
    Ok(engine)
}

/// Run the API server.
pub async fn run_server(
    config_path: Option<&Path>,
    port: Option<u16>,
    source: &SourceArgs,
) -> anyhow::Result<()> {
    info!("perfprof daemon starting");

    let config = cli::resolve(cli::load_config(config_path)?, source)?;
    let engine = Arc::new(build_engine(&config).await?);

    // ── Shutdown signal ────────────────────────────────────────

    let shutdown = CancellationToken::new();
    let router = perfprof_api::build_router(engine, shutdown.clone());

    // ── Start API server ───────────────────────────────────────

    let addr: SocketAddr = format!("{}:{}", config.bind(), port.unwrap_or(config.port()))
        .parse()
        .with_context(|| format!("invalid listen address {}", config.bind()))?;

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C or SIGTERM.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        shutdown.cancel();
    });

    server.await?;

    info!("perfprof daemon stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM where the platform has it.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
