//! AWS SQS publisher implementation.

use std::time::Duration;

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_sqs::config::BehaviorVersion;
use aws_sdk_sqs::types::QueueAttributeName;
use aws_sdk_sqs::Client;
use tracing::{debug, info};

use fieldgate_core::config::QueueConfig;

use crate::error::QueueError;
use crate::publisher::{EnqueueMessage, JobPublisher, QueueHealth};

/// SQS-backed job publisher.
///
/// One instance is created at startup and shared by all commit calls and
/// the retry sweep; the underlying client is safe for concurrent use.
#[derive(Debug)]
pub struct SqsPublisher {
    client: Client,
    queue_url: String,
    publish_timeout: Duration,
}

impl SqsPublisher {
    /// Create a new SQS publisher from project config.
    pub async fn new(queue: &QueueConfig) -> Result<Self, QueueError> {
        if !queue.is_configured() {
            return Err(QueueError::NotConfigured("QUEUE_URL is empty".into()));
        }

        let region = aws_sdk_sqs::config::Region::new(queue.region.clone());

        // Build SQS client config directly, do NOT use aws_config::defaults()
        // because it reads AWS_ENDPOINT_URL from the environment, which may
        // point to another service and misroute SQS requests.
        let mut sqs_config = aws_sdk_sqs::Config::builder()
            .region(region)
            .behavior_version(BehaviorVersion::latest());

        // Use static credentials if provided (local dev / explicit config).
        if let (Some(key_id), Some(secret)) =
            (&queue.access_key_id, &queue.secret_access_key)
        {
            let creds = Credentials::new(
                key_id,
                secret,
                queue.session_token.clone(),
                None,
                "fieldgate-queue-static",
            );
            sqs_config = sqs_config.credentials_provider(creds);
        }

        // Only apply endpoint override if QUEUE_AWS_ENDPOINT_URL is explicitly set.
        if let Some(ref endpoint) = queue.endpoint_url {
            if !endpoint.is_empty() {
                let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                    endpoint.clone()
                } else {
                    format!("https://{endpoint}")
                };
                sqs_config = sqs_config.endpoint_url(&url);
            }
        }

        let client = Client::from_conf(sqs_config.build());

        info!(
            queue_url = %queue.queue_url,
            region = %queue.region,
            "SQS publisher initialized"
        );

        Ok(Self {
            client,
            queue_url: queue.queue_url.clone(),
            publish_timeout: Duration::from_millis(queue.publish_timeout_ms),
        })
    }
}

#[async_trait]
impl JobPublisher for SqsPublisher {
    async fn publish(&self, import_id: &str) -> Result<(), QueueError> {
        let body = serde_json::to_string(&EnqueueMessage::new(import_id))
            .map_err(|e| QueueError::Publish(format!("payload serialization failed: {e}")))?;

        debug!(import_id, "Publishing enqueue message to SQS");

        let send = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send();

        let resp = tokio::time::timeout(self.publish_timeout, send)
            .await
            .map_err(|_| QueueError::Timeout(self.publish_timeout.as_millis() as u64))?
            .map_err(|e| QueueError::Publish(format!("SQS send failed: {e:?}")))?;

        debug!(
            import_id,
            message_id = resp.message_id().unwrap_or("unknown"),
            "SQS publish acknowledged"
        );

        Ok(())
    }

    async fn health_check(&self) -> Result<QueueHealth, QueueError> {
        let resp = self
            .client
            .get_queue_attributes()
            .queue_url(&self.queue_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await
            .map_err(|e| QueueError::Connection(format!("SQS health check failed: {e:?}")))?;

        let count = resp
            .attributes()
            .and_then(|attrs| attrs.get(&QueueAttributeName::ApproximateNumberOfMessages))
            .and_then(|v| v.parse::<u64>().ok());

        Ok(QueueHealth {
            connected: true,
            approximate_message_count: count,
            provider: "sqs".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldgate_core::config::QueueConfig;

    fn unconfigured() -> QueueConfig {
        QueueConfig {
            queue_url: String::new(),
            region: "eu-west-1".into(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            endpoint_url: None,
            publish_timeout_ms: 5000,
        }
    }

    #[tokio::test]
    async fn test_new_rejects_missing_queue_url() {
        let err = SqsPublisher::new(&unconfigured()).await.unwrap_err();
        assert!(matches!(err, QueueError::NotConfigured(_)));
        assert!(err.to_string().contains("QUEUE_URL"));
    }
}
