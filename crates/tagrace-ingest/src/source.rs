use async_trait::async_trait;

use tagrace_core::protocol::stream::StreamMessage;
use tagrace_core::Result;

/// A single-reader, non-restartable sequence of stream messages.
#[async_trait]
pub trait MessageSource: Send {
    /// Next message. `Ok(None)` once the source is stopped or exhausted.
    async fn next_message(&mut self) -> Result<Option<StreamMessage>>;

    /// Close the underlying connection. Idempotent.
    async fn stop(&mut self);
}
