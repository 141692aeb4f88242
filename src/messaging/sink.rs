use async_trait::async_trait;
use std::time::Duration;

// ============================================================================
// Order Sink Abstraction
// ============================================================================
//
// The publisher loop talks to the broker only through this trait. Each send
// resolves to an explicit result that the caller inspects before moving on.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Kafka send error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Failed to serialize order: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Injected delivery failure for message #{0}")]
    Injected(u64),

    #[error("Broker metadata probe failed: {0}")]
    Probe(String),

    #[error("Flush failed: {0}")]
    Flush(String),

    #[error("Topic creation failed: {0}")]
    TopicCreation(String),
}

impl PublishError {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            PublishError::Kafka(_) => "kafka",
            PublishError::Serialize(_) => "serialize",
            PublishError::Injected(_) => "injected",
            PublishError::Probe(_) => "probe",
            PublishError::Flush(_) => "flush",
            PublishError::TopicCreation(_) => "topic_creation",
        }
    }
}

/// Where the broker stored an acknowledged message.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

#[async_trait]
pub trait OrderSink: Send + Sync {
    /// Send one keyed payload and wait for the broker's verdict.
    async fn send(&self, topic: &str, key: &str, payload: &str) -> Result<Delivery, PublishError>;

    /// Block until every accepted send is acknowledged or the timeout expires.
    async fn flush(&self, timeout: Duration) -> Result<(), PublishError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_labels() {
        assert_eq!(PublishError::Injected(2).reason(), "injected");
        assert_eq!(PublishError::Probe("join".into()).reason(), "probe");
        assert_eq!(PublishError::Flush("timeout".into()).reason(), "flush");
    }

    #[test]
    fn test_probe_error_message() {
        let err = PublishError::Probe("task cancelled".into());
        assert_eq!(err.to_string(), "Broker metadata probe failed: task cancelled");
    }
}
