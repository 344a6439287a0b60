//! Run identity and the run-wide result map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::DeviceOutcome;

/// Correlates all artifacts of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a fresh run ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One outcome per selected device, keyed by device name.
///
/// Built incrementally by the dispatcher's single consumer loop; read-only
/// once the run finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    run_id: RunId,
    outcomes: BTreeMap<String, DeviceOutcome>,
}

impl RunResult {
    /// Creates an empty result for a new run.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: RunId::new(),
            outcomes: BTreeMap::new(),
        }
    }

    /// The run's correlation ID.
    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Records a device outcome, keyed by its device name.
    pub fn insert(&mut self, outcome: DeviceOutcome) {
        self.outcomes.insert(outcome.device.clone(), outcome);
    }

    /// The outcome for one device, if recorded.
    #[must_use]
    pub fn get(&self, device: &str) -> Option<&DeviceOutcome> {
        self.outcomes.get(device)
    }

    /// Number of recorded outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// True when no outcome has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Iterates outcomes in device-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DeviceOutcome)> {
        self.outcomes.iter()
    }

    /// Iterates the failed outcomes only.
    pub fn failed(&self) -> impl Iterator<Item = &DeviceOutcome> {
        self.outcomes.values().filter(|o| o.is_failed())
    }

    /// Number of failed devices.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    /// True when every device completed without failure.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed_count() == 0
    }
}

impl Default for RunResult {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FailureKind;

    #[test]
    fn run_result_keys_by_device_name() {
        let mut run = RunResult::new();
        run.insert(DeviceOutcome::success("SW1", "10.0.0.1", Vec::new()));
        run.insert(DeviceOutcome::fail(
            "SW2",
            "10.0.0.2",
            Vec::new(),
            FailureKind::Unreachable,
            "no route",
        ));

        assert_eq!(run.len(), 2);
        assert_eq!(run.failed_count(), 1);
        assert!(!run.all_succeeded());
        assert!(run.get("SW1").is_some());
        assert!(run.get("SW3").is_none());
    }

    #[test]
    fn reinserting_a_device_keeps_one_entry() {
        let mut run = RunResult::new();
        run.insert(DeviceOutcome::success("SW1", "10.0.0.1", Vec::new()));
        run.insert(DeviceOutcome::success("SW1", "10.0.0.1", Vec::new()));
        assert_eq!(run.len(), 1);
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
