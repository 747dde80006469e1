//! tagrace ratio gateway.
//!
//! - `POST /` streams `me` vs `opponent` percentages
//! - `GET /:id` streams one raw counter
//! - Graceful shutdown on SIGINT/SIGTERM: draining flag, sessions end, listener closes

use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use tagrace_core::{Result, TagRaceError};
use tagrace_gateway::{app_state::AppState, config, router};
use tagrace_store::RedisCounterStore;

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "tagrace-gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg_path = std::env::var("TAGRACE_CONFIG").ok();
    let cfg = config::load(cfg_path.as_deref(), |k| std::env::var(k).ok())?;
    let listen = cfg.server.listen_addr()?;

    tracing::info!(host = %cfg.store.host, port = cfg.store.port, "connecting to redis");
    let store = RedisCounterStore::connect(&cfg.store).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = AppState::new(cfg, Arc::new(store), shutdown_rx);
    let app = router::build_router(state.clone());

    tracing::info!(%listen, "tagrace-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| TagRaceError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            state.set_draining();
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| TagRaceError::Internal(format!("server failed: {e}")))?;

    tracing::info!("tagrace-gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
