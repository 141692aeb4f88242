use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::sink::{Delivery, OrderSink, PublishError};

// ============================================================================
// Fault Injection
// ============================================================================
//
// Wraps another sink and fails selected sends (1-based sequence numbers)
// without forwarding them. Everything else passes through untouched.
//
// ============================================================================

pub struct FaultInjectingSink<S> {
    inner: S,
    fail_on: BTreeSet<u64>,
    attempts: AtomicU64,
}

impl<S: OrderSink> FaultInjectingSink<S> {
    pub fn new(inner: S, fail_on: impl IntoIterator<Item = u64>) -> Self {
        Self {
            inner,
            fail_on: fail_on.into_iter().collect(),
            attempts: AtomicU64::new(0),
        }
    }

    /// Total sends seen, including injected failures.
    #[cfg(test)]
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: OrderSink> OrderSink for FaultInjectingSink<S> {
    async fn send(&self, topic: &str, key: &str, payload: &str) -> Result<Delivery, PublishError> {
        let sequence = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if self.fail_on.contains(&sequence) {
            tracing::warn!(sequence, key = %key, "Injecting delivery failure");
            return Err(PublishError::Injected(sequence));
        }

        self.inner.send(topic, key, payload).await
    }

    async fn flush(&self, timeout: Duration) -> Result<(), PublishError> {
        self.inner.flush(timeout).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;

    #[tokio::test]
    async fn test_fails_only_selected_sequences() {
        let sink = FaultInjectingSink::new(RecordingSink::default(), [2]);

        let first = sink.send("orders", "b1", "{}").await.unwrap();
        let err = sink.send("orders", "b2", "{}").await.unwrap_err();
        assert!(matches!(err, PublishError::Injected(2)));
        let third = sink.send("orders", "b3", "{}").await.unwrap();

        assert_eq!((first.partition, first.offset), (0, 0));
        assert_eq!((third.partition, third.offset), (0, 1));

        assert_eq!(sink.attempts(), 3);
        assert_eq!(sink.inner().keys(), vec!["b1", "b3"]);
    }

    #[tokio::test]
    async fn test_flush_passes_through() {
        let sink = FaultInjectingSink::new(RecordingSink::default(), Vec::new());

        sink.flush(Duration::from_secs(1)).await.unwrap();
        assert_eq!(sink.inner().flush_count(), 1);
    }
}
