//! Shared error type across tagrace crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed message.
    BadRequest,
    /// Request body did not arrive in time.
    Timeout,
    /// Counter store unreachable or returned garbage.
    StoreUnavailable,
    /// Stream provider failure.
    StreamFailed,
    /// Invalid configuration.
    Config,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::Timeout => "TIMEOUT",
            ClientCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ClientCode::StreamFailed => "STREAM_FAILED",
            ClientCode::Config => "CONFIG",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TagRaceError>;

/// Unified error type used by core, store, gateway and ingest.
#[derive(Debug, Error)]
pub enum TagRaceError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("store: {0}")]
    Store(String),
    #[error("stream: {0}")]
    Stream(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl TagRaceError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            TagRaceError::BadRequest(_) => ClientCode::BadRequest,
            TagRaceError::Timeout(_) => ClientCode::Timeout,
            TagRaceError::Store(_) => ClientCode::StoreUnavailable,
            TagRaceError::Stream(_) => ClientCode::StreamFailed,
            TagRaceError::Config(_) => ClientCode::Config,
            TagRaceError::Internal(_) => ClientCode::Internal,
        }
    }
}
