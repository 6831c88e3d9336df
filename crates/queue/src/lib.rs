pub mod error;
pub mod publisher;
pub mod sqs;

pub use error::QueueError;
pub use publisher::{EnqueueMessage, JobPublisher, QueueHealth};
pub use sqs::SqsPublisher;
