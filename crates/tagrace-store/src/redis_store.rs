use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tracing::info;

use tagrace_core::CounterKey;

use crate::{CounterStore, StoreConfig, StoreError, StoreResult};

/// Redis-backed counters. `ConnectionManager` is a cheap clonable handle over
/// one multiplexed connection and reconnects on its own.
#[derive(Clone)]
pub struct RedisCounterStore {
    conn: ConnectionManager,
}

impl RedisCounterStore {
    /// Connect and verify with `PING`. Any failure here is a startup error.
    pub async fn connect(cfg: &StoreConfig) -> StoreResult<Self> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(cfg.host.clone(), cfg.port),
            redis: RedisConnectionInfo {
                db: cfg.db,
                password: (!cfg.password.is_empty()).then(|| cfg.password.clone()),
                ..Default::default()
            },
        };
        let client = Client::open(info)?;
        let conn = ConnectionManager::new(client).await?;
        let store = Self { conn };
        store.ping().await?;
        info!(host = %cfg.host, port = cfg.port, db = cfg.db, "connected to redis");
        Ok(store)
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong != "PONG" {
            return Err(StoreError::Unavailable(format!("unexpected PING reply: {pong}")));
        }
        Ok(())
    }

    async fn get(&self, key: &CounterKey) -> StoreResult<Option<i64>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key.as_str()).await?;
        match raw {
            None => Ok(None),
            Some(s) => s.trim().parse::<i64>().map(Some).map_err(|_| StoreError::Decode {
                key: key.to_string(),
                value: s,
            }),
        }
    }

    async fn set(&self, key: &CounterKey, value: i64) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key.as_str(), value).await?;
        Ok(())
    }

    async fn incr(&self, key: &CounterKey) -> StoreResult<i64> {
        let mut conn = self.conn.clone();
        let v: i64 = conn.incr(key.as_str(), 1i64).await?;
        Ok(v)
    }
}
