//! q-router daemon - Adaptive task-routing service
//!
//! Builds the dispatch-and-learning engine from configuration and drives it
//! with the in-process load simulation until the run completes or a shutdown
//! signal arrives.

#![allow(clippy::float_cmp)]

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod simulation;

use crate::config::Config;
use qrouter_engine::RouterEngine;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing before config loading so the loader can log
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qrouter_daemon=info,qrouter_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting q-router daemon v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!(
        workers = config.router.worker_count,
        queue_capacity = config.router.queue_capacity,
        "configuration loaded"
    );

    let engine = RouterEngine::start(config.router_settings())?;

    tokio::select! {
        result = simulation::run(&engine, &config.simulation) => {
            if let Err(e) = result {
                error!("simulation failed: {e}");
            }
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received, stopping early");
        }
    }

    simulation::report(&engine).await;

    engine.shutdown().await;
    info!("q-router daemon stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGINT, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }
}
