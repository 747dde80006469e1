//! tagrace stream ingestor.
//!
//! Opens a filtered provider stream for the watch list, attributes each event
//! to its first watched hashtag and increments that tag's counter.
//!
//! - `config`: strict YAML + environment overrides
//! - `oauth`: OAuth 1.0a request signing
//! - `source`: `MessageSource` seam (real client or scripted test source)
//! - `filter_stream`: reqwest client with framing and bounded reconnects
//! - `ingestor`: lifecycle, matching and increments

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod filter_stream;
pub mod ingestor;
pub mod oauth;
pub mod source;

pub use filter_stream::FilterStream;
pub use ingestor::{exit_code, IngestOutcome, IngestState, IngestStats, Ingestor};
pub use source::MessageSource;
