//! Core domain model types for fleetconf.
//!
//! This module contains the types the rest of the engine communicates with:
//! - The fixed pipeline step enum and per-step outcome
//! - The per-device outcome with its failure classification
//! - The run-wide result map

mod failure;
mod outcome;
mod run;

pub use failure::FailureKind;
pub use outcome::{DeviceOutcome, Failure, Step, StepOutcome, StepResult};
pub use run::{RunId, RunResult};
