use clap::Parser;
use std::time::Duration;

use crate::messaging::KafkaSettings;

// ============================================================================
// Runtime Configuration
// ============================================================================
//
// Read once at startup. Every flag can also come from the environment;
// flags win over env vars.
//
// ============================================================================

#[derive(Parser, Debug, Clone)]
#[command(name = "order_producer", about = "Publish synthetic orders to a Kafka topic")]
pub struct Cli {
    /// Kafka brokers (comma-separated, e.g. "localhost:29092,localhost:39092")
    #[arg(long, env = "KAFKA_BROKERS", value_delimiter = ',', default_value = "localhost:29092")]
    pub brokers: Vec<String>,

    /// Topic receiving the orders
    #[arg(long, env = "KAFKA_TOPIC", default_value = "orders")]
    pub topic: String,

    /// Number of orders to publish
    #[arg(long, env = "MESSAGE_COUNT", default_value = "20")]
    pub count: u64,

    /// Delay between messages in seconds (fractional allowed)
    #[arg(long, env = "MESSAGE_DELAY", default_value = "1.0")]
    pub delay: f64,

    /// Broker-side delivery timeout per message
    #[arg(long, env = "MESSAGE_TIMEOUT_MS", default_value = "5000")]
    pub message_timeout_ms: u64,

    /// Upper bound on waiting for outstanding acknowledgements at shutdown
    #[arg(long, env = "FLUSH_TIMEOUT_SECS", default_value = "30")]
    pub flush_timeout_secs: u64,

    /// Random seed for reproducible orders (entropy when omitted)
    #[arg(long, env = "ORDER_SEED")]
    pub seed: Option<u64>,

    /// Create the topic before publishing if it does not exist
    #[arg(long, env = "CREATE_TOPIC")]
    pub create_topic: bool,

    /// Partition count used when creating the topic
    #[arg(long, env = "TOPIC_PARTITIONS", default_value = "1")]
    pub partitions: i32,

    /// Message numbers (1-based, comma-separated) that fail without being sent
    #[arg(long, env = "FAIL_ON", value_delimiter = ',')]
    pub fail_on: Vec<u64>,

    /// Serve Prometheus metrics on this port
    #[arg(long, env = "METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("At least one Kafka broker is required")]
    NoBrokers,

    #[error("Topic name cannot be empty")]
    EmptyTopic,

    #[error("Message count must be positive")]
    ZeroCount,

    #[error("Message delay must be a non-negative number of seconds, got {0}")]
    InvalidDelay(f64),

    #[error("Partition count must be positive, got {0}")]
    InvalidPartitions(i32),
}

#[derive(Debug, Clone)]
pub struct ProducerConfig {
    pub kafka: KafkaSettings,
    pub topic: String,
    pub count: u64,
    pub delay: Duration,
    pub flush_timeout: Duration,
    pub seed: Option<u64>,
    pub create_topic: bool,
    pub partitions: i32,
    pub fail_on: Vec<u64>,
    pub metrics_port: Option<u16>,
}

impl Cli {
    pub fn into_config(self) -> Result<ProducerConfig, ConfigError> {
        let brokers: Vec<String> = self
            .brokers
            .iter()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();
        if brokers.is_empty() {
            return Err(ConfigError::NoBrokers);
        }

        let topic = self.topic.trim().to_string();
        if topic.is_empty() {
            return Err(ConfigError::EmptyTopic);
        }
        if self.count == 0 {
            return Err(ConfigError::ZeroCount);
        }
        let delay = Duration::try_from_secs_f64(self.delay)
            .map_err(|_| ConfigError::InvalidDelay(self.delay))?;
        if self.partitions < 1 {
            return Err(ConfigError::InvalidPartitions(self.partitions));
        }

        Ok(ProducerConfig {
            kafka: KafkaSettings {
                brokers,
                message_timeout: Duration::from_millis(self.message_timeout_ms),
            },
            topic,
            count: self.count,
            delay,
            flush_timeout: Duration::from_secs(self.flush_timeout_secs),
            seed: self.seed,
            create_topic: self.create_topic,
            partitions: self.partitions,
            fail_on: self.fail_on,
            metrics_port: self.metrics_port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["order_producer"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_parse_into_config() {
        let config = parse(&[
            "--brokers", "a:9092, b:9092",
            "--topic", "orders-test",
            "--count", "3",
            "--delay", "0.25",
            "--seed", "42",
            "--fail-on", "2,5",
        ])
        .into_config()
        .unwrap();

        assert_eq!(config.kafka.brokers, vec!["a:9092", "b:9092"]);
        assert_eq!(config.topic, "orders-test");
        assert_eq!(config.count, 3);
        assert_eq!(config.delay, Duration::from_millis(250));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.fail_on, vec![2, 5]);
    }

    #[test]
    fn test_zero_delay_allowed() {
        let config = parse(&["--delay", "0", "--count", "1"]).into_config().unwrap();
        assert_eq!(config.delay, Duration::ZERO);
    }

    #[test]
    fn test_zero_count_rejected() {
        let err = parse(&["--count", "0"]).into_config().unwrap_err();
        assert_eq!(err, ConfigError::ZeroCount);
    }

    #[test]
    fn test_negative_delay_rejected() {
        let err = parse(&["--delay=-1.5", "--count", "1"]).into_config().unwrap_err();
        assert_eq!(err, ConfigError::InvalidDelay(-1.5));
    }

    #[test]
    fn test_huge_delay_rejected() {
        let err = parse(&["--delay", "1e30", "--count", "1"]).into_config().unwrap_err();
        assert_eq!(err, ConfigError::InvalidDelay(1e30));
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).into_config().unwrap();

        assert_eq!(config.kafka.brokers, vec!["localhost:29092"]);
        assert_eq!(config.topic, "orders");
        assert_eq!(config.count, 20);
        assert_eq!(config.delay, Duration::from_secs(1));
        assert_eq!(config.kafka.message_timeout, Duration::from_millis(5000));
        assert_eq!(config.flush_timeout, Duration::from_secs(30));
        assert_eq!(config.seed, None);
        assert!(!config.create_topic);
        assert!(config.fail_on.is_empty());
        assert_eq!(config.metrics_port, None);
    }

    #[test]
    fn test_blank_brokers_rejected() {
        let err = parse(&["--brokers", " , ", "--count", "1"]).into_config().unwrap_err();
        assert_eq!(err, ConfigError::NoBrokers);
    }

    #[test]
    fn test_non_numeric_count_fails_parse() {
        assert!(Cli::try_parse_from(["order_producer", "--count", "many"]).is_err());
    }
}
