//! Ratio poller: HTTP long-poll sessions over the counter store.
//!
//! - `handler`: axum entry points, request parsing, streamed response body
//! - `session`: per-request ticker task (tick / client gone / shutdown / deadline)
//! - `reading`: one read-compute step against the store

pub mod handler;
pub mod reading;
pub mod session;

pub use reading::{PollTarget, TickOutcome};
pub use session::{PollSession, SessionEnd};
