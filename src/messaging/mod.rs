mod fault;
mod kafka;
mod sink;

pub use fault::FaultInjectingSink;
pub use kafka::{KafkaSettings, KafkaSink};
pub use sink::{Delivery, OrderSink, PublishError};

#[cfg(test)]
pub(crate) use fault::testing::RecordingSink;
