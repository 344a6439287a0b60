//! Bounded-parallel dispatch of device pipelines.
//!
//! The runner fans one [`DevicePipeline`] out across the selected device set.
//! Each device runs in its own spawned task gated by a semaphore; outcomes
//! land in completion order at a single consumer point, so no shared map is
//! ever written from two workers. A panicking worker is caught at the pool
//! boundary and degrades only its own device's outcome.


use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::core::{DeviceOutcome, RunResult};
use crate::events::{DeviceCompleted, ProgressSink};
use crate::inventory::Device;
use crate::pipeline::DevicePipeline;

/// Fans the pipeline out across devices with bounded parallelism.
#[derive(Debug, Clone)]
pub struct Runner {
    num_workers: usize,
}

impl Runner {
    /// Creates a runner with the given pool width.
    #[must_use]
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers: num_workers.max(1),
        }
    }

    /// The pool width.
    #[must_use]
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Runs every device to a terminal state and returns exactly one outcome
    /// per input device. Completion order is not submission order.
    pub async fn run(
        &self,
        devices: Vec<Device>,
        pipeline: Arc<DevicePipeline>,
        progress: Arc<dyn ProgressSink>,
    ) -> RunResult {
        info!(
            devices = devices.len(),
            workers = self.num_workers,
            "dispatching device pipelines"
        );

        let semaphore = Arc::new(Semaphore::new(self.num_workers));
        let mut in_flight = FuturesUnordered::new();

        for device in devices {
            let semaphore = Arc::clone(&semaphore);
            let pipeline = Arc::clone(&pipeline);
            let name = device.name.clone();
            let hostname = device.hostname.clone();

            let handle = tokio::spawn(async move {
                // Acquired inside the task so submission never blocks.
                let _permit = semaphore.acquire_owned().await.ok();
                pipeline.run(&device).await
            });

            in_flight.push(async move {
                match handle.await {
                    Ok(outcome) => outcome,
                    Err(join_err) => {
                        // Pool boundary: a dead worker still yields an outcome.
                        error!(device = %name, error = %join_err, "worker terminated abnormally");
                        DeviceOutcome::unhandled(name, hostname, join_err.to_string())
                    }
                }
            });
        }

        let mut result = RunResult::new();
        while let Some(outcome) = in_flight.next().await {
            progress.try_emit(&DeviceCompleted {
                device: outcome.device.clone(),
                hostname: outcome.hostname.clone(),
                failed: outcome.is_failed(),
                kind: outcome.failure_kind(),
            });
            debug!(device = %outcome.device, failed = outcome.is_failed(), "device pipeline finished");
            result.insert(outcome);
        }
        result
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}
