//! Store error types

use tagrace_core::TagRaceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("value at {key} is not an integer: {value:?}")]
    Decode { key: String, value: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for TagRaceError {
    fn from(e: StoreError) -> Self {
        TagRaceError::Store(e.to_string())
    }
}
