//! Run observability: per-device completion events and their sinks.
//!
//! Sinks are pure observers subscribed to worker completions. They never
//! influence pipeline outcomes, and the non-blocking `try_emit` path is what
//! the dispatcher uses so a slow observer cannot stall a worker.

mod bounded;
mod progress;
mod sink;

pub use bounded::{BoundedProgressSink, SinkMetrics};
pub use progress::ProgressBarSink;
pub use sink::{
    CollectingProgressSink, DeviceCompleted, LoggingProgressSink, NoOpProgressSink, ProgressSink,
};
