use std::fmt;
use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, warn};

use tagrace_core::{ratio_percent, CounterKey};
use tagrace_store::CounterStore;

use crate::obs::metrics::GatewayMetrics;

/// What one poll session reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollTarget {
    /// `me * 100 / (me + opponent)`.
    Ratio { me: CounterKey, opponent: CounterKey },
    /// The raw counter value.
    Raw { key: CounterKey },
}

/// Result of one tick. Only `Value` produces a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Value(i64),
    StoreError,
    ZeroSum,
    Absent,
}

impl TickOutcome {
    pub fn label(self) -> &'static str {
        match self {
            TickOutcome::Value(_) => "written",
            TickOutcome::StoreError => "store_error",
            TickOutcome::ZeroSum => "zero_sum",
            TickOutcome::Absent => "absent",
        }
    }

    /// `"<value>\n"`, or `None` when the tick is skipped.
    pub fn line(self) -> Option<Bytes> {
        match self {
            TickOutcome::Value(v) => Some(Bytes::from(format!("{v}\n"))),
            _ => None,
        }
    }
}

impl PollTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            PollTarget::Ratio { .. } => "ratio",
            PollTarget::Raw { .. } => "raw",
        }
    }

    /// Read the counters and compute this tick's value.
    ///
    /// Store errors and the zero-sum case are logged and skipped; an absent
    /// counter counts as 0 in a ratio and skips a raw reading.
    pub async fn read(&self, store: &dyn CounterStore, metrics: &GatewayMetrics) -> TickOutcome {
        match self {
            PollTarget::Ratio { me, opponent } => {
                let Some(me_val) = timed_get(store, me, metrics).await else {
                    return TickOutcome::StoreError;
                };
                let Some(opp_val) = timed_get(store, opponent, metrics).await else {
                    return TickOutcome::StoreError;
                };
                let (me_val, opp_val) = (me_val.unwrap_or(0), opp_val.unwrap_or(0));
                match ratio_percent(me_val, opp_val) {
                    Some(r) => {
                        debug!(me = me_val, opponent = opp_val, ratio = r, "tick");
                        TickOutcome::Value(r)
                    }
                    None => {
                        debug!(me = me_val, opponent = opp_val, "no ratio for counters, skipping tick");
                        TickOutcome::ZeroSum
                    }
                }
            }
            PollTarget::Raw { key } => match timed_get(store, key, metrics).await {
                None => TickOutcome::StoreError,
                Some(None) => TickOutcome::Absent,
                Some(Some(v)) => TickOutcome::Value(v),
            },
        }
    }
}

/// `None` on store error (already logged), `Some(None)` when absent.
async fn timed_get(
    store: &dyn CounterStore,
    key: &CounterKey,
    metrics: &GatewayMetrics,
) -> Option<Option<i64>> {
    let started = Instant::now();
    let res = store.get(key).await;
    metrics
        .store_read_duration
        .observe(&[("op", "get")], started.elapsed());
    match res {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(%key, error = %e, "counter read failed, skipping tick");
            None
        }
    }
}

impl fmt::Display for PollTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollTarget::Ratio { me, opponent } => write!(f, "{me} vs {opponent}"),
            PollTarget::Raw { key } => write!(f, "{key}"),
        }
    }
}
