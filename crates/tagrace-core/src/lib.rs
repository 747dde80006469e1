//! tagrace core: transport-agnostic primitives shared by the ingestor and the
//! ratio gateway.
//!
//! This crate defines the watch-list model, counter key derivation, ratio
//! arithmetic, the stream wire protocol and the shared error surface. It
//! intentionally carries no transport or runtime dependencies so both services
//! (and their tests) can reuse it.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed stream lines and bad request keys surface as `TagRaceError`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod counter;
pub mod error;
pub mod protocol;
pub mod tag;

/// Shared result type.
pub use error::{Result, TagRaceError};
pub use counter::{ratio_percent, CounterKey, KEY_PREFIX};
pub use tag::{first_match, normalize_tag, WatchList, WatchedTag};

/// Exit status used when the stream provider reports a stall warning.
/// Orchestrators treat it as "restart me", distinct from other fatal errors.
pub const STALL_EXIT_CODE: u8 = 24;
