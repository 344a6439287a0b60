//! Per-step and per-device outcome types.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::FailureKind;

/// One step of the fixed device pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Diagnostic probe command against the live device.
    Probe,
    /// Template rendering; no network I/O.
    Render,
    /// Batch configuration push.
    Push,
    /// Save to non-volatile storage.
    Save,
}

impl Step {
    /// Label used in the log artifacts.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Probe => "Probing Device State",
            Self::Render => "Rendering Configuration from Template",
            Self::Push => "Loading Configuration on the Device",
            Self::Save => "Saving Configuration on the Device",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Probe => write!(f, "probe"),
            Self::Render => write!(f, "render"),
            Self::Push => write!(f, "push"),
            Self::Save => write!(f, "save"),
        }
    }
}

/// The tagged result of one executed step: captured text on success, a
/// classification plus message on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResult {
    /// The step succeeded; `output` is the command output or rendered text.
    Ok {
        /// Captured textual result.
        output: String,
    },
    /// The step failed.
    Failed {
        /// The failure classification.
        kind: FailureKind,
        /// The underlying error message.
        message: String,
    },
}

/// One step plus its result. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Which pipeline step this records.
    pub step: Step,
    /// What happened.
    #[serde(flatten)]
    pub result: StepResult,
}

impl StepOutcome {
    /// Records a successful step.
    #[must_use]
    pub fn ok(step: Step, output: impl Into<String>) -> Self {
        Self {
            step,
            result: StepResult::Ok {
                output: output.into(),
            },
        }
    }

    /// Records a failed step.
    #[must_use]
    pub fn failed(step: Step, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            step,
            result: StepResult::Failed {
                kind,
                message: message.into(),
            },
        }
    }

    /// True when this step failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.result, StepResult::Failed { .. })
    }

    /// The captured text: command output on success, error message on failure.
    #[must_use]
    pub fn text(&self) -> &str {
        match &self.result {
            StepResult::Ok { output } => output,
            StepResult::Failed { message, .. } => message,
        }
    }
}

/// Terminal failure marker on a device outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    /// The failure classification.
    pub kind: FailureKind,
    /// The underlying error message.
    pub message: String,
}

/// Everything recorded for one device's pipeline run.
///
/// Owned exclusively by the worker that produced it and handed off complete;
/// nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceOutcome {
    /// Device name: the join key for logs, retry inventory and aggregation.
    pub device: String,
    /// Network address, carried for artifact naming.
    pub hostname: String,
    /// Every step attempted, in pipeline order.
    pub steps: Vec<StepOutcome>,
    /// The terminal failure, if the pipeline did not reach the end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    /// True once the configuration push succeeded. A failed outcome with this
    /// set means the device is running the new configuration without having
    /// saved it.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub config_applied: bool,
}

impl DeviceOutcome {
    /// Records a fully successful pipeline run.
    #[must_use]
    pub fn success(
        device: impl Into<String>,
        hostname: impl Into<String>,
        steps: Vec<StepOutcome>,
    ) -> Self {
        Self {
            device: device.into(),
            hostname: hostname.into(),
            steps,
            failure: None,
            config_applied: false,
        }
    }

    /// Records a failed pipeline run with its terminal classification.
    #[must_use]
    pub fn fail(
        device: impl Into<String>,
        hostname: impl Into<String>,
        steps: Vec<StepOutcome>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            device: device.into(),
            hostname: hostname.into(),
            steps,
            failure: Some(Failure {
                kind,
                message: message.into(),
            }),
            config_applied: false,
        }
    }

    /// Records a worker that died without producing an outcome.
    #[must_use]
    pub fn unhandled(
        device: impl Into<String>,
        hostname: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::fail(device, hostname, Vec::new(), FailureKind::Unhandled, message)
    }

    /// Marks the configuration as applied on the device.
    #[must_use]
    pub fn with_config_applied(mut self) -> Self {
        self.config_applied = true;
        self
    }

    /// True iff any step failed or the run ended early.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// The terminal failure classification, if any.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|f| f.kind)
    }

    /// The steps in execution order, for the artifacts.
    #[must_use]
    pub fn step_sequence(&self) -> Vec<Step> {
        self.steps.iter().map(|s| s.step).collect()
    }
}
