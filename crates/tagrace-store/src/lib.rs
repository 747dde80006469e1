//! Counter Store Adapter.
//!
//! Typed get/set/increment against an external key-value store. Counters live
//! under `tagrace_core::KEY_PREFIX`; this crate never invents keys, callers pass
//! a `CounterKey`.
//!
//! Two implementations share the `CounterStore` trait:
//! - `RedisCounterStore`: production, `redis::aio::ConnectionManager` (reconnects itself).
//! - `MemoryCounterStore`: `DashMap` backed, for tests and local runs.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

mod config;
mod error;
mod memory;
mod redis_store;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use tagrace_core::{CounterKey, WatchList};

pub use config::{StoreConfig, DEFAULT_SERVICE_NAME};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryCounterStore;
pub use redis_store::RedisCounterStore;

/// Shared handle injected into the ingestor and every poll session.
pub type SharedStore = Arc<dyn CounterStore>;

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Connectivity check.
    async fn ping(&self) -> StoreResult<()>;

    /// Read a counter. `None` when the key is absent.
    async fn get(&self, key: &CounterKey) -> StoreResult<Option<i64>>;

    /// Overwrite a counter (no expiry).
    async fn set(&self, key: &CounterKey, value: i64) -> StoreResult<()>;

    /// Atomic +1, returns the new value.
    async fn incr(&self, key: &CounterKey) -> StoreResult<i64>;

    /// Initialize a counter to 0 unless it already holds an integer.
    /// Returns `true` when the counter was (re)initialized.
    async fn ensure_counter(&self, key: &CounterKey) -> StoreResult<bool> {
        match self.get(key).await {
            Ok(Some(_)) => Ok(false),
            Ok(None) => {
                self.set(key, 0).await?;
                Ok(true)
            }
            Err(e) => {
                warn!(%key, error = %e, "counter unreadable, resetting to 0");
                self.set(key, 0).await?;
                Ok(true)
            }
        }
    }
}

/// Make sure every watched tag has a counter. Existing values are untouched,
/// so a restart never resets counts.
pub async fn initialize_counters(store: &dyn CounterStore, watch: &WatchList) -> StoreResult<usize> {
    let mut initialized = 0;
    for tag in watch.tags() {
        let key = CounterKey::for_tag(tag);
        info!(%tag, %key, "checking counter");
        if store.ensure_counter(&key).await? {
            info!(%tag, %key, "counter not found, initialized to 0");
            initialized += 1;
        }
    }
    Ok(initialized)
}
