//! tagrace stream ingestor.
//!
//! Exit status:
//! - 0 after SIGINT/SIGTERM
//! - `STALL_EXIT_CODE` after a stall warning
//! - 1 on any fatal error (config, store, stream)

use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use tagrace_core::Result;
use tagrace_ingest::{config, exit_code, FilterStream, IngestOutcome, Ingestor};
use tagrace_store::RedisCounterStore;

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let res = run().await;
    match &res {
        Ok(IngestOutcome::Shutdown) => {}
        Ok(IngestOutcome::StallWarning(w)) => {
            tracing::error!(code = %w.code, "exiting after stall warning");
        }
        Err(e) => tracing::error!(error = %e, "tagrace-ingest failed"),
    }
    ExitCode::from(exit_code(&res))
}

async fn run() -> Result<IngestOutcome> {
    let cfg_path = std::env::var("TAGRACE_CONFIG").ok();
    let cfg = config::load(cfg_path.as_deref(), |k| std::env::var(k).ok())?;
    let watch_list = cfg.watch_list()?;
    tracing::info!(tags = ?watch_list.track_terms(), "watch list loaded");

    tracing::info!(host = %cfg.store.host, port = cfg.store.port, "connecting to redis");
    let store = RedisCounterStore::connect(&cfg.store).await?;

    let mut ingestor = Ingestor::new(Arc::new(store), watch_list.clone());
    ingestor.initialize().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    tracing::info!(endpoint = %cfg.stream.endpoint, "opening stream");
    let outcome = ingestor
        .run(
            FilterStream::open(&cfg.stream, &cfg.credentials, &watch_list),
            shutdown_rx,
        )
        .await;
    tracing::info!(stats = ?ingestor.stats(), state = ?ingestor.state(), "tagrace-ingest stopped");
    outcome
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
    tracing::info!("signal received, stopping ingest");
}
