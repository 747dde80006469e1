//! Shared fixtures for gateway integration tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use tagrace_core::CounterKey;
use tagrace_gateway::{app_state::AppState, config};
use tagrace_store::{CounterStore, MemoryCounterStore, SharedStore, StoreError, StoreResult};

pub fn state_with(store: SharedStore, yaml: &str) -> (AppState, watch::Sender<bool>) {
    let cfg = config::load_from_str(yaml).unwrap();
    let (tx, rx) = watch::channel(false);
    (AppState::new(cfg, store, rx), tx)
}

pub fn memory(values: &[(&str, i64)]) -> Arc<MemoryCounterStore> {
    Arc::new(MemoryCounterStore::with_values(
        values.iter().map(|(k, v)| (k.to_string(), *v)),
    ))
}

pub fn key(s: &str) -> CounterKey {
    CounterKey::from_client(s).unwrap()
}

/// Fails the first `failures` reads, then delegates.
pub struct FlakyStore {
    pub inner: MemoryCounterStore,
    failures: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: MemoryCounterStore, failures: usize) -> Self {
        Self { inner, failures: AtomicUsize::new(failures) }
    }
}

#[async_trait]
impl CounterStore for FlakyStore {
    async fn ping(&self) -> StoreResult<()> {
        Err(StoreError::Unavailable("flaky".into()))
    }

    async fn get(&self, key: &CounterKey) -> StoreResult<Option<i64>> {
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &CounterKey, value: i64) -> StoreResult<()> {
        self.inner.set(key, value).await
    }

    async fn incr(&self, key: &CounterKey) -> StoreResult<i64> {
        self.inner.incr(key).await
    }
}
