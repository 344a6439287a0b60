//! Bounded, drop-on-full progress forwarding.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use super::{DeviceCompleted, ProgressSink};

/// Counters for the bounded sink.
#[derive(Debug, Default)]
pub struct SinkMetrics {
    emitted: AtomicU64,
    dropped: AtomicU64,
}

impl SinkMetrics {
    /// Records a successfully queued event.
    pub fn record_emit(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a dropped event.
    pub fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of queued events.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Number of dropped events.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Decorator forwarding events to a downstream sink through a bounded queue.
///
/// When the queue is full, `try_emit` drops the event and counts it instead
/// of waiting: a slow observer can lose progress lines but can never stall a
/// worker.
pub struct BoundedProgressSink {
    tx: Mutex<Option<mpsc::Sender<DeviceCompleted>>>,
    metrics: Arc<SinkMetrics>,
    forwarder: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl BoundedProgressSink {
    /// Spawns the forwarding task with the given queue capacity.
    #[must_use]
    pub fn new(downstream: Arc<dyn ProgressSink>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<DeviceCompleted>(capacity.max(1));
        let forwarder = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                downstream.emit(&event).await;
            }
        });

        Self {
            tx: Mutex::new(Some(tx)),
            metrics: Arc::new(SinkMetrics::default()),
            forwarder: Mutex::new(Some(forwarder)),
        }
    }

    /// The sink's counters.
    #[must_use]
    pub fn metrics(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Closes the queue, drains what is buffered and stops the forwarder.
    pub async fn shutdown(&self) {
        let tx = self.tx.lock().take();
        drop(tx);
        let forwarder = self.forwarder.lock().take();
        if let Some(handle) = forwarder {
            let _ = handle.await;
        }
    }
}

#[async_trait]
impl ProgressSink for BoundedProgressSink {
    async fn emit(&self, event: &DeviceCompleted) {
        let tx = self.tx.lock().clone();
        if let Some(tx) = tx {
            if tx.send(event.clone()).await.is_ok() {
                self.metrics.record_emit();
                return;
            }
        }
        self.metrics.record_drop();
    }

    fn try_emit(&self, event: &DeviceCompleted) {
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            self.metrics.record_drop();
            return;
        };
        match tx.try_send(event.clone()) {
            Ok(()) => self.metrics.record_emit(),
            Err(_) => {
                self.metrics.record_drop();
                warn!(device = %event.device, "progress queue full, event dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingProgressSink;
    use tokio::sync::Notify;

    fn event(device: &str) -> DeviceCompleted {
        DeviceCompleted {
            device: device.to_string(),
            hostname: "10.0.0.1".to_string(),
            failed: false,
            kind: None,
        }
    }

    #[tokio::test]
    async fn forwards_to_the_downstream_sink() {
        let downstream = Arc::new(CollectingProgressSink::new());
        let sink = BoundedProgressSink::new(
            Arc::clone(&downstream) as Arc<dyn ProgressSink>,
            8,
        );

        sink.try_emit(&event("SW1"));
        sink.try_emit(&event("SW2"));
        sink.shutdown().await;

        assert_eq!(downstream.len(), 2);
        assert_eq!(sink.metrics().emitted(), 2);
        assert_eq!(sink.metrics().dropped(), 0);
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        // A downstream that never finishes its first emit keeps the queue
        // from draining.
        struct StuckSink {
            gate: Notify,
        }

        #[async_trait]
        impl ProgressSink for StuckSink {
            async fn emit(&self, _event: &DeviceCompleted) {
                self.gate.notified().await;
            }

            fn try_emit(&self, _event: &DeviceCompleted) {}
        }

        let sink = BoundedProgressSink::new(
            Arc::new(StuckSink {
                gate: Notify::new(),
            }),
            1,
        );

        for i in 0..5 {
            sink.try_emit(&event(&format!("SW{i}")));
        }

        let metrics = sink.metrics();
        assert_eq!(metrics.emitted() + metrics.dropped(), 5);
        assert!(metrics.dropped() >= 1);
    }

    #[tokio::test]
    async fn emitting_after_shutdown_counts_as_dropped() {
        let downstream = Arc::new(CollectingProgressSink::new());
        let sink = BoundedProgressSink::new(
            Arc::clone(&downstream) as Arc<dyn ProgressSink>,
            8,
        );
        sink.shutdown().await;

        sink.try_emit(&event("SW1"));
        assert_eq!(sink.metrics().dropped(), 1);
        assert_eq!(downstream.len(), 0);
    }
}
