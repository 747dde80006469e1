use async_trait::async_trait;
use dashmap::DashMap;

use tagrace_core::CounterKey;

use crate::{CounterStore, StoreResult};

/// In-process counter store. Increments go through the `DashMap` entry API,
/// which holds the shard lock, so concurrent `incr` calls never lose updates.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    map: DashMap<String, i64>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed values, e.g. `[("key.a", 30), ("key.b", 70)]`.
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, i64)>,
        K: Into<String>,
    {
        let map = DashMap::new();
        for (k, v) in values {
            map.insert(k.into(), v);
        }
        Self { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn get(&self, key: &CounterKey) -> StoreResult<Option<i64>> {
        Ok(self.map.get(key.as_str()).map(|v| *v.value()))
    }

    async fn set(&self, key: &CounterKey, value: i64) -> StoreResult<()> {
        self.map.insert(key.as_str().to_string(), value);
        Ok(())
    }

    async fn incr(&self, key: &CounterKey) -> StoreResult<i64> {
        let mut entry = self.map.entry(key.as_str().to_string()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }
}
