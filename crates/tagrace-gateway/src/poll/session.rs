//! One poll session = one spawned task feeding one response body.
//!
//! The task selects between four events and always releases its timer and
//! gauge on the way out:
//! - tick: read counters, push a line
//! - client gone: the body (channel receiver) was dropped by the server
//! - shutdown: process-wide signal
//! - deadline: the write timeout caps session length
//!
//! A write parked on a full channel still yields to shutdown and deadline.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, info_span, Instrument};

use crate::app_state::AppState;
use crate::poll::reading::{PollTarget, TickOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    ClientGone,
    Shutdown,
    Deadline,
}

impl SessionEnd {
    pub fn label(self) -> &'static str {
        match self {
            SessionEnd::ClientGone => "client_gone",
            SessionEnd::Shutdown => "shutdown",
            SessionEnd::Deadline => "deadline",
        }
    }
}

pub struct PollSession {
    app: AppState,
    target: PollTarget,
    shutdown: watch::Receiver<bool>,
    interval: Duration,
    max_duration: Duration,
    buffer: usize,
}

impl PollSession {
    pub fn new(app: AppState, target: PollTarget) -> Self {
        let server = &app.cfg().server;
        let interval = server.poll_interval();
        let max_duration = server.write_timeout();
        let buffer = server.session_buffer;
        let shutdown = app.shutdown_rx();
        Self {
            app,
            target,
            shutdown,
            interval,
            max_duration,
            buffer,
        }
    }

    /// Spawn the ticker task and hand back the receiving end of its lines.
    /// Dropping the receiver ends the session.
    pub fn spawn(self) -> mpsc::Receiver<Bytes> {
        let (tx, rx) = mpsc::channel(self.buffer);
        let span = info_span!("poll_session", kind = self.target.kind(), target = %self.target);
        tokio::spawn(
            async move {
                let end = self.run(tx).await;
                info!(reason = end.label(), "poll session ended");
            }
            .instrument(span),
        );
        rx
    }

    pub async fn run(self, tx: mpsc::Sender<Bytes>) -> SessionEnd {
        let PollSession {
            app,
            target,
            mut shutdown,
            interval,
            max_duration,
            ..
        } = self;

        if *shutdown.borrow() {
            return SessionEnd::Shutdown;
        }

        let kind = target.kind();
        let store = app.store();
        let metrics = app.metrics();
        metrics.sessions_active.inc(&[("kind", kind)]);
        info!("poll session started");

        // first reading one interval after the header, like a plain ticker
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let deadline = tokio::time::sleep(max_duration);
        tokio::pin!(deadline);

        let end = 'session: loop {
            tokio::select! {
                _ = tx.closed() => break 'session SessionEnd::ClientGone,
                _ = shutdown.changed() => break 'session SessionEnd::Shutdown,
                _ = &mut deadline => break 'session SessionEnd::Deadline,
                _ = ticker.tick() => {
                    let outcome = target.read(store.as_ref(), metrics).await;
                    metrics.poll_ticks.inc(&[("kind", kind), ("outcome", outcome.label())]);
                    let Some(line) = outcome.line() else { continue 'session };
                    if let TickOutcome::Value(v) = outcome {
                        debug!(value = v, "write");
                    }
                    // a slow reader parks the ticker here; exit events still apply
                    let delivered = tokio::select! {
                        sent = tx.send(line) => sent.is_ok(),
                        _ = shutdown.changed() => break 'session SessionEnd::Shutdown,
                        _ = &mut deadline => break 'session SessionEnd::Deadline,
                    };
                    if !delivered {
                        break 'session SessionEnd::ClientGone;
                    }
                }
            }
        };

        metrics.sessions_active.dec(&[("kind", kind)]);
        metrics.sessions_ended.inc(&[("reason", end.label())]);
        end
    }
}
