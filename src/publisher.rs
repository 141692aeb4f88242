use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::generator::OrderGenerator;
use crate::messaging::{Delivery, OrderSink, PublishError};
use crate::metrics::Metrics;
use crate::models::Order;

// ============================================================================
// Publisher Loop
// ============================================================================
//
// INIT -> (BUILD -> SERIALIZE -> SEND -> WAIT) x N -> FLUSH -> DONE
//
// A failed send is logged and counted; the loop keeps going. Cancellation is
// checked before each message and during the wait, and always ends in FLUSH.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub topic: String,
    pub count: u64,
    pub delay: Duration,
    pub flush_timeout: Duration,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub attempted: u64,
    pub delivered: u64,
    pub failed: u64,
    pub interrupted: bool,
    pub order_uids: Vec<String>,
}

pub struct Publisher<S> {
    sink: S,
    settings: LoopSettings,
    metrics: Arc<Metrics>,
}

impl<S: OrderSink> Publisher<S> {
    pub fn new(sink: S, settings: LoopSettings, metrics: Arc<Metrics>) -> Self {
        Self {
            sink,
            settings,
            metrics,
        }
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub async fn run<R: Rng>(
        &self,
        generator: &mut OrderGenerator<R>,
        shutdown: &CancellationToken,
    ) -> RunSummary {
        let total = self.settings.count;
        let mut summary = RunSummary::default();

        for sequence in 1..=total {
            if shutdown.is_cancelled() {
                summary.interrupted = true;
                break;
            }

            let order = generator.next_order();
            self.metrics.record_generated(order.items.len());

            summary.attempted += 1;
            match self.publish(&order).await {
                Ok(delivery) => {
                    summary.delivered += 1;
                    tracing::debug!(
                        order_uid = %order.order_uid,
                        "Message delivered to {} [{}] at offset {}",
                        delivery.topic,
                        delivery.partition,
                        delivery.offset
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(
                        order_uid = %order.order_uid,
                        error = %e,
                        "❌ Message delivery failed"
                    );
                }
            }

            tracing::info!(
                order_uid = %order.order_uid,
                items = order.items.len(),
                "Sent order {} ({}/{})",
                order.order_uid,
                sequence,
                total
            );
            summary.order_uids.push(order.order_uid);

            if sequence < total && !self.wait(shutdown).await {
                summary.interrupted = true;
                break;
            }
        }

        if summary.interrupted {
            tracing::warn!(sent = summary.attempted, "Interrupted, flushing pending messages");
        }

        if let Err(e) = self.sink.flush(self.settings.flush_timeout).await {
            tracing::error!(error = %e, "Failed to flush pending messages");
        }

        tracing::info!(
            attempted = summary.attempted,
            delivered = summary.delivered,
            failed = summary.failed,
            interrupted = summary.interrupted,
            "Finished sending {} messages to Kafka",
            summary.attempted
        );

        summary
    }

    /// Serialize and send one order, reporting the outcome to metrics.
    async fn publish(&self, order: &Order) -> Result<Delivery, PublishError> {
        let started = Instant::now();

        let result = match order.to_json() {
            Ok(payload) => {
                self.sink
                    .send(&self.settings.topic, &order.order_uid, &payload)
                    .await
            }
            Err(e) => Err(PublishError::from(e)),
        };

        let failure = result.as_ref().err().map(PublishError::reason);
        self.metrics.record_send(started.elapsed(), failure);

        result
    }

    /// Returns false when cancelled before the delay elapsed.
    async fn wait(&self, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            _ = shutdown.cancelled() => false,
            _ = tokio::time::sleep(self.settings.delay) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ReferenceData;
    use crate::messaging::{FaultInjectingSink, RecordingSink};

    fn settings(count: u64, delay: Duration) -> LoopSettings {
        LoopSettings {
            topic: "orders".to_string(),
            count,
            delay,
            flush_timeout: Duration::from_secs(1),
        }
    }

    fn generator() -> OrderGenerator {
        OrderGenerator::seeded(ReferenceData::default(), 1).unwrap()
    }

    fn metrics() -> Arc<Metrics> {
        Arc::new(Metrics::new().unwrap())
    }

    #[tokio::test]
    async fn test_sends_exactly_count_messages() {
        let publisher = Publisher::new(RecordingSink::default(), settings(3, Duration::ZERO), metrics());

        let summary = publisher.run(&mut generator(), &CancellationToken::new()).await;

        assert_eq!(publisher.sink().keys(), vec!["b1", "b2", "b3"]);
        assert_eq!(summary.order_uids, vec!["b1", "b2", "b3"]);
        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.delivered, 3);
        assert!(!summary.interrupted);
        assert_eq!(publisher.sink().flush_count(), 1);
    }

    #[tokio::test]
    async fn test_payload_is_order_json_keyed_by_uid() {
        let publisher = Publisher::new(RecordingSink::default(), settings(2, Duration::ZERO), metrics());
        publisher.run(&mut generator(), &CancellationToken::new()).await;

        let sent = publisher.sink().sent.lock().unwrap().clone();
        for (topic, key, payload) in sent {
            let order: Order = serde_json::from_str(&payload).unwrap();
            assert_eq!(topic, "orders");
            assert_eq!(order.order_uid, key);
            assert_eq!(order.payment.goods_total, order.items_total());
        }
    }

    #[tokio::test]
    async fn test_single_failure_does_not_stop_loop() {
        let sink = FaultInjectingSink::new(RecordingSink::default(), [2]);
        let metrics = metrics();
        let publisher = Publisher::new(sink, settings(3, Duration::ZERO), metrics.clone());

        let summary = publisher.run(&mut generator(), &CancellationToken::new()).await;

        assert_eq!(publisher.sink().attempts(), 3);
        assert_eq!(publisher.sink().inner().keys(), vec!["b1", "b3"]);
        assert_eq!(summary.order_uids, vec!["b1", "b2", "b3"]);
        assert_eq!(summary.delivered, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.interrupted);
        assert_eq!(metrics.orders_failed.with_label_values(&["injected"]).get(), 1);
        assert_eq!(metrics.orders_delivered.get(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_sends_nothing_but_flushes() {
        let publisher = Publisher::new(RecordingSink::default(), settings(5, Duration::ZERO), metrics());
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let summary = publisher.run(&mut generator(), &shutdown).await;

        assert_eq!(summary.attempted, 0);
        assert!(summary.interrupted);
        assert!(publisher.sink().keys().is_empty());
        assert_eq!(publisher.sink().flush_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_wait_stops_loop() {
        let publisher = Publisher::new(
            RecordingSink::default(),
            settings(10, Duration::from_secs(60)),
            metrics(),
        );
        let shutdown = CancellationToken::new();

        let canceller = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(90)).await;
            canceller.cancel();
        });

        let summary = publisher.run(&mut generator(), &shutdown).await;

        // Sends at t=0 and t=60; cancelled during the second wait.
        assert_eq!(summary.order_uids, vec!["b1", "b2"]);
        assert!(summary.interrupted);
        assert_eq!(publisher.sink().flush_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_last_message() {
        let publisher = Publisher::new(
            RecordingSink::default(),
            settings(3, Duration::from_secs(10)),
            metrics(),
        );

        let started = tokio::time::Instant::now();
        publisher.run(&mut generator(), &CancellationToken::new()).await;

        // Two waits between three messages, none after the last.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(20));
        assert!(elapsed < Duration::from_secs(30));
    }
}
