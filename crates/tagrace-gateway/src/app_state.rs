//! Shared application state for the ratio gateway.
//!
//! The store handle and shutdown receiver are injected by `main`; nothing here
//! is global, so tests build a state around an in-memory store.

use std::sync::Arc;

use tokio::sync::watch;

use tagrace_store::SharedStore;

use crate::config::GatewayConfig;
use crate::obs::metrics::GatewayMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    store: SharedStore,
    metrics: GatewayMetrics,
    shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(cfg: GatewayConfig, store: SharedStore, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                store,
                metrics: GatewayMetrics::default(),
                shutdown,
            }),
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.inner.store)
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    /// Fresh receiver for one session; fires when the process shuts down.
    pub fn shutdown_rx(&self) -> watch::Receiver<bool> {
        self.inner.shutdown.clone()
    }

    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining() || *self.inner.shutdown.borrow()
    }
}
