//! Progress sink trait and basic implementations.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::core::FailureKind;

/// Emitted exactly once per device reaching a terminal pipeline state.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCompleted {
    /// Device name.
    pub device: String,
    /// Network address.
    pub hostname: String,
    /// Whether the device's pipeline failed.
    pub failed: bool,
    /// The failure classification, when failed.
    pub kind: Option<FailureKind>,
}

/// Observer for per-device completion.
///
/// Implementations must treat events as read-only facts: no outcome
/// mutation, no feedback into scheduling.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Emits a completion event asynchronously.
    async fn emit(&self, event: &DeviceCompleted);

    /// Emits without blocking and without failing; errors are swallowed.
    fn try_emit(&self, event: &DeviceCompleted);
}

/// Discards all events. The default when no observer is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgressSink;

#[async_trait]
impl ProgressSink for NoOpProgressSink {
    async fn emit(&self, _event: &DeviceCompleted) {}

    fn try_emit(&self, _event: &DeviceCompleted) {}
}

/// Logs completions through the tracing framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingProgressSink;

impl LoggingProgressSink {
    fn log(event: &DeviceCompleted) {
        if event.failed {
            warn!(
                device = %event.device,
                hostname = %event.hostname,
                kind = ?event.kind,
                "device completed with error"
            );
        } else {
            info!(
                device = %event.device,
                hostname = %event.hostname,
                "device completed successfully"
            );
        }
    }
}

#[async_trait]
impl ProgressSink for LoggingProgressSink {
    async fn emit(&self, event: &DeviceCompleted) {
        Self::log(event);
    }

    fn try_emit(&self, event: &DeviceCompleted) {
        Self::log(event);
    }
}

/// Collects events for test assertions.
#[derive(Debug, Default)]
pub struct CollectingProgressSink {
    events: parking_lot::RwLock<Vec<DeviceCompleted>>,
}

impl CollectingProgressSink {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything collected so far.
    #[must_use]
    pub fn events(&self) -> Vec<DeviceCompleted> {
        self.events.read().clone()
    }

    /// Number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// True when nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

#[async_trait]
impl ProgressSink for CollectingProgressSink {
    async fn emit(&self, event: &DeviceCompleted) {
        self.events.write().push(event.clone());
    }

    fn try_emit(&self, event: &DeviceCompleted) {
        self.events.write().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(device: &str, failed: bool) -> DeviceCompleted {
        DeviceCompleted {
            device: device.to_string(),
            hostname: "10.0.0.1".to_string(),
            failed,
            kind: failed.then_some(FailureKind::Unreachable),
        }
    }

    #[tokio::test]
    async fn collecting_sink_records_both_paths() {
        let sink = CollectingProgressSink::new();
        sink.emit(&event("SW1", false)).await;
        sink.try_emit(&event("SW2", true));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].device, "SW1");
        assert!(events[1].failed);
    }

    #[tokio::test]
    async fn noop_sink_discards_everything() {
        let sink = NoOpProgressSink;
        sink.emit(&event("SW1", false)).await;
        sink.try_emit(&event("SW1", false));
    }
}
