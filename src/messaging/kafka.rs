use async_trait::async_trait;
use rdkafka::{
    admin::{AdminClient, AdminOptions, NewTopic, TopicReplication},
    client::DefaultClientContext,
    config::ClientConfig,
    producer::{FutureProducer, FutureRecord, Producer},
};
use std::time::Duration;

use super::sink::{Delivery, OrderSink, PublishError};

/// Resend attempts delegated to librdkafka on transient failures.
const SEND_RETRIES: &str = "3";
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct KafkaSettings {
    pub brokers: Vec<String>,
    pub message_timeout: Duration,
}

impl KafkaSettings {
    pub fn bootstrap_servers(&self) -> String {
        self.brokers.join(",")
    }

    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", self.bootstrap_servers());
        config
    }

    fn producer_config(&self) -> ClientConfig {
        let mut config = self.client_config();
        config
            .set("acks", "all")
            .set("message.send.max.retries", SEND_RETRIES)
            .set("message.timeout.ms", self.message_timeout.as_millis().to_string());
        config
    }
}

pub struct KafkaSink {
    producer: FutureProducer,
    settings: KafkaSettings,
}

impl KafkaSink {
    pub fn new(settings: KafkaSettings) -> Result<Self, PublishError> {
        let producer: FutureProducer = settings.producer_config().create()?;

        Ok(Self { producer, settings })
    }

    /// Fetch cluster metadata once so an unreachable broker fails startup
    /// instead of every send.
    pub async fn probe(&self) -> Result<(), PublishError> {
        let producer = self.producer.clone();
        let (broker_count, topic_count) = tokio::task::spawn_blocking(move || {
            producer
                .client()
                .fetch_metadata(None, METADATA_TIMEOUT)
                .map(|metadata| (metadata.brokers().len(), metadata.topics().len()))
        })
        .await
        .map_err(|e| PublishError::Probe(e.to_string()))??;

        tracing::info!(
            brokers = %self.settings.bootstrap_servers(),
            broker_count,
            topic_count,
            "Connected to Kafka"
        );
        Ok(())
    }

    /// Create the topic unless it already exists.
    pub async fn ensure_topic(&self, topic: &str, partitions: i32) -> Result<(), PublishError> {
        let admin_client: AdminClient<DefaultClientContext> = self.settings.client_config().create()?;

        let new_topic = NewTopic::new(topic, partitions, TopicReplication::Fixed(1));
        let opts = AdminOptions::new().operation_timeout(Some(Duration::from_secs(5)));

        let results = admin_client
            .create_topics(&[new_topic], &opts)
            .await
            .map_err(|e| PublishError::TopicCreation(e.to_string()))?;

        for result in results {
            match result {
                Ok(topic_name) => tracing::info!(topic = %topic_name, "Topic created"),
                Err((topic_name, err)) => {
                    if err.to_string().contains("already exists") {
                        tracing::info!(topic = %topic_name, "Topic already exists");
                    } else {
                        return Err(PublishError::TopicCreation(format!("{topic_name}: {err}")));
                    }
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl OrderSink for KafkaSink {
    async fn send(&self, topic: &str, key: &str, payload: &str) -> Result<Delivery, PublishError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        let delivered = self
            .producer
            .send(record, self.settings.message_timeout)
            .await
            .map_err(|(e, _)| PublishError::Kafka(e))?;

        Ok(Delivery {
            topic: topic.to_string(),
            partition: delivered.partition,
            offset: delivered.offset,
        })
    }

    async fn flush(&self, timeout: Duration) -> Result<(), PublishError> {
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|e| PublishError::Flush(e.to_string()))??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> KafkaSettings {
        KafkaSettings {
            brokers: vec!["kafka-1:9092".to_string(), "kafka-2:9092".to_string()],
            message_timeout: Duration::from_millis(5000),
        }
    }

    #[test]
    fn test_bootstrap_servers_joined() {
        assert_eq!(settings().bootstrap_servers(), "kafka-1:9092,kafka-2:9092");
    }

    #[test]
    fn test_producer_config_requests_all_acks() {
        let config = settings().producer_config();

        assert_eq!(config.get("acks"), Some("all"));
        assert_eq!(config.get("message.send.max.retries"), Some("3"));
        assert_eq!(config.get("message.timeout.ms"), Some("5000"));
        assert_eq!(config.get("bootstrap.servers"), Some("kafka-1:9092,kafka-2:9092"));
    }

    #[test]
    fn test_producer_creation_does_not_connect() {
        // librdkafka connects lazily, so building the client succeeds offline.
        assert!(KafkaSink::new(settings()).is_ok());
    }
}
