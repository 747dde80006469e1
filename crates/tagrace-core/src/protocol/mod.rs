//! Stream wire protocol.
//!
//! The stream provider delivers newline-delimited JSON over a long-lived HTTP
//! response:
//! - `frame`: turns arbitrary byte chunks into complete lines (keep-alives dropped).
//! - `stream`: decodes one line into a typed `StreamMessage`.
//!
//! Both are panic-free: malformed input is reported as `TagRaceError` so the
//! ingestor can log and move on.

pub mod frame;
pub mod stream;
