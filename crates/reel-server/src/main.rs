//! `reel-server` - HTTP adapter binary for the generation engine.
//!
//! Runs the `axum` router from `reel_server::router` over an in-memory
//! store. Ambient only (§4.14 of the design notes): this binary exists
//! to give the crate a runnable surface, not to host specified behavior.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use reel_server::{router, AppState};

/// HTTP server for the generation engine.
#[derive(Parser, Debug)]
#[command(name = "reel-server")]
#[command(about = "HTTP adapter over the generation engine and in-memory store")]
#[command(version)]
struct Cli {
    /// Address to bind the HTTP listener to.
    #[arg(long, env = "REEL_BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let bind_addr: std::net::SocketAddr = cli.bind.parse().context("failed to parse bind address")?;

    let state = AppState::new();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    info!("listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
