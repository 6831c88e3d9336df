//! Job publisher trait and types.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::QueueError;

/// Wire payload for one enqueue notification.
///
/// The consumer dedupes on `importId`, so at-least-once delivery is fine
/// from this side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueMessage {
    #[serde(rename = "importId")]
    pub import_id: String,
}

impl EnqueueMessage {
    pub fn new(import_id: impl Into<String>) -> Self {
        Self { import_id: import_id.into() }
    }
}

/// Health status of the queue connection.
#[derive(Debug, Clone, Serialize)]
pub struct QueueHealth {
    /// Whether the queue is reachable.
    pub connected: bool,
    /// Approximate number of messages waiting in the queue.
    pub approximate_message_count: Option<u64>,
    /// Queue provider name (e.g., "sqs").
    pub provider: String,
}

impl fmt::Display for QueueHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QueueHealth {{ connected: {}, messages: {:?}, provider: {} }}",
            self.connected, self.approximate_message_count, self.provider
        )
    }
}

/// Trait for producer-side queue backends.
///
/// Implementations publish enqueue notifications to the well-known import
/// topic. A returned error means the broker did not acknowledge the message;
/// it never implies anything about the already-persisted job record.
#[async_trait]
pub trait JobPublisher: Send + Sync {
    /// Publish one enqueue notification for a committed import.
    async fn publish(&self, import_id: &str) -> Result<(), QueueError>;

    /// Check queue connectivity and return health status.
    async fn health_check(&self) -> Result<QueueHealth, QueueError>;
}
