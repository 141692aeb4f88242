// Private module declaration
mod server;

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::time::Duration;

// Re-export for public API
pub use server::spawn_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for the producer run
// ============================================================================
//
// Tracks:
// - Orders generated, delivered and failed (by reason)
// - Send latency per message
// - Item count of the most recent order
//
// Exposed on /metrics when a metrics port is configured.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub orders_generated: IntCounter,
    pub orders_delivered: IntCounter,
    pub orders_failed: IntCounterVec,
    pub send_duration: Histogram,
    pub order_items_last: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_generated =
            IntCounter::new("orders_generated_total", "Total synthetic orders generated")?;
        registry.register(Box::new(orders_generated.clone()))?;

        let orders_delivered =
            IntCounter::new("orders_delivered_total", "Total orders acknowledged by the broker")?;
        registry.register(Box::new(orders_delivered.clone()))?;

        let orders_failed = IntCounterVec::new(
            Opts::new("orders_failed_total", "Total orders that failed to publish"),
            &["reason"],
        )?;
        registry.register(Box::new(orders_failed.clone()))?;

        let send_duration = Histogram::with_opts(
            HistogramOpts::new("order_send_duration_seconds", "Time from send to broker verdict")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(send_duration.clone()))?;

        let order_items_last =
            IntGauge::new("order_items_last", "Number of items in the last generated order")?;
        registry.register(Box::new(order_items_last.clone()))?;

        Ok(Self {
            registry,
            orders_generated,
            orders_delivered,
            orders_failed,
            send_duration,
            order_items_last,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_generated(&self, item_count: usize) {
        self.orders_generated.inc();
        self.order_items_last.set(item_count as i64);
    }

    /// `failure` is `None` for an acknowledged send.
    pub fn record_send(&self, elapsed: Duration, failure: Option<&str>) {
        self.send_duration.observe(elapsed.as_secs_f64());
        match failure {
            None => self.orders_delivered.inc(),
            Some(reason) => self.orders_failed.with_label_values(&[reason]).inc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_generated() {
        let metrics = Metrics::new().unwrap();
        metrics.record_generated(3);
        metrics.record_generated(5);

        assert_eq!(metrics.orders_generated.get(), 2);
        assert_eq!(metrics.order_items_last.get(), 5);
    }

    #[test]
    fn test_record_send_outcomes() {
        let metrics = Metrics::new().unwrap();
        metrics.record_send(Duration::from_millis(3), None);
        metrics.record_send(Duration::from_millis(4), None);
        metrics.record_send(Duration::from_millis(5), Some("kafka"));

        assert_eq!(metrics.orders_delivered.get(), 2);
        assert_eq!(metrics.orders_failed.with_label_values(&["kafka"]).get(), 1);
        assert_eq!(metrics.send_duration.get_sample_count(), 3);
    }
}
