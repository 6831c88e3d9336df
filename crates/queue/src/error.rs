//! Queue error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("publish error: {0}")]
    Publish(String),

    #[error("timeout after {0}ms")]
    Timeout(u64),

    #[error("queue not configured: {0}")]
    NotConfigured(String),

    #[error("provider error: {0}")]
    Provider(String),
}
