//! Stream ingestor: watched-tag matching and counter increments.
//!
//! States: `Connecting -> Streaming -> {Terminated, Faulted}`.
//! - store failures on increment are logged, the event is dropped, streaming continues
//! - a stall warning stops the source and ends the run (`IngestOutcome::StallWarning`)
//! - a shutdown signal stops the source and ends the run (`IngestOutcome::Shutdown`)
//! - connect failures or an unrecoverable stream error end in `Faulted`

use std::future::Future;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use tagrace_core::protocol::stream::{StallWarning, StreamMessage};
use tagrace_core::{CounterKey, Result, TagRaceError, WatchList, STALL_EXIT_CODE};
use tagrace_store::{initialize_counters, SharedStore};

use crate::source::MessageSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Connecting,
    Streaming,
    Terminated,
    Faulted,
}

/// Why a run ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    StallWarning(StallWarning),
    Shutdown,
}

impl IngestOutcome {
    /// Process exit status for a run that ended this way.
    pub fn exit_code(&self) -> u8 {
        match self {
            IngestOutcome::StallWarning(_) => STALL_EXIT_CODE,
            IngestOutcome::Shutdown => 0,
        }
    }
}

/// Exit status for a finished run: the outcome's code, or 1 on any fault.
pub fn exit_code(run: &Result<IngestOutcome>) -> u8 {
    match run {
        Ok(outcome) => outcome.exit_code(),
        Err(_) => 1,
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub seen: u64,
    pub matched: u64,
    pub incremented: u64,
    pub increment_failed: u64,
    pub ignored: u64,
}

pub struct Ingestor {
    store: SharedStore,
    watch: WatchList,
    state: IngestState,
    stats: IngestStats,
}

impl Ingestor {
    pub fn new(store: SharedStore, watch: WatchList) -> Self {
        Self {
            store,
            watch,
            state: IngestState::Connecting,
            stats: IngestStats::default(),
        }
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Create missing counters at 0. Store errors here are fatal for startup.
    pub async fn initialize(&self) -> Result<usize> {
        let n = initialize_counters(self.store.as_ref(), &self.watch).await?;
        info!(initialized = n, watched = self.watch.len(), "counters ready");
        Ok(n)
    }

    /// Apply one message. `Some` ends the run.
    pub async fn handle_message(&mut self, msg: StreamMessage) -> Option<IngestOutcome> {
        match msg {
            StreamMessage::Tweet(tweet) => {
                self.stats.seen += 1;
                let Some(tag) = self.watch.first_match(&tweet.hashtags) else {
                    debug!(id = ?tweet.id, "no watched tag");
                    return None;
                };
                self.stats.matched += 1;

                let key = CounterKey::for_tag(tag);
                match self.store.incr(&key).await {
                    Ok(v) => {
                        self.stats.incremented += 1;
                        debug!(%tag, %key, value = v, "counter incremented");
                    }
                    Err(e) => {
                        self.stats.increment_failed += 1;
                        warn!(%tag, %key, error = %e, "increment failed, event dropped");
                    }
                }
                None
            }
            StreamMessage::StallWarning(w) => {
                warn!(code = %w.code, message = %w.message, percent_full = ?w.percent_full,
                    "stall warning received, stopping stream");
                Some(IngestOutcome::StallWarning(w))
            }
            StreamMessage::Disconnect(d) => {
                self.stats.ignored += 1;
                warn!(code = ?d.code, reason = %d.reason, "provider disconnect notice");
                None
            }
            StreamMessage::Other => {
                self.stats.ignored += 1;
                None
            }
        }
    }

    /// Drive `connect`'s source until a stall warning, a shutdown signal or
    /// a fatal stream error.
    pub async fn run<S, F>(
        &mut self,
        connect: F,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<IngestOutcome>
    where
        S: MessageSource,
        F: Future<Output = Result<S>>,
    {
        self.state = IngestState::Connecting;
        if *shutdown.borrow() {
            self.state = IngestState::Terminated;
            return Ok(IngestOutcome::Shutdown);
        }

        let mut source = tokio::select! {
            res = connect => match res {
                Ok(s) => s,
                Err(e) => {
                    self.state = IngestState::Faulted;
                    return Err(e);
                }
            },
            _ = shutdown.changed() => {
                self.state = IngestState::Terminated;
                return Ok(IngestOutcome::Shutdown);
            }
        };

        self.state = IngestState::Streaming;
        info!("ingesting");

        loop {
            let next = tokio::select! {
                _ = shutdown.changed() => None,
                msg = source.next_message() => Some(msg),
            };

            let msg = match next {
                None => {
                    info!("shutdown requested");
                    source.stop().await;
                    self.state = IngestState::Terminated;
                    return Ok(IngestOutcome::Shutdown);
                }
                Some(Ok(Some(msg))) => msg,
                Some(Ok(None)) => {
                    self.state = IngestState::Faulted;
                    return Err(TagRaceError::Stream("stream ended unexpectedly".into()));
                }
                Some(Err(e)) => {
                    self.state = IngestState::Faulted;
                    return Err(e);
                }
            };

            if let Some(outcome) = self.handle_message(msg).await {
                source.stop().await;
                self.state = IngestState::Terminated;
                return Ok(outcome);
            }
        }
    }
}
