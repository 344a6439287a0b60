//! # Fleetconf
//!
//! A concurrent configuration engine for fleets of network switches.
//!
//! Fleetconf runs a fixed pipeline — reachability check, diagnostic probe,
//! template render, configuration push, save — against many independent
//! devices in parallel:
//!
//! - **Bounded parallelism**: a fixed-width worker pool, one pipeline per
//!   device, no ordering between devices
//! - **Failure isolation**: one device's failure (or panic) degrades only
//!   that device's outcome, never the run
//! - **Typed classification**: every failure is tagged with its cause, from
//!   `Unreachable` through `Persist`
//! - **Replayable artifacts**: per-device logs, a consolidated run log and a
//!   retry inventory holding exactly the failed devices, ready to be fed
//!   back in as the next run's input
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fleetconf::prelude::*;
//!
//! let inventory = Inventory::load(Path::new("hosts.yaml"))?;
//! let credentials = Credentials::new("admin", "secret");
//! let devices: Vec<Device> = inventory
//!     .select(&Selection::group("switch"))
//!     .iter()
//!     .map(|d| d.with_credentials(&credentials))
//!     .collect();
//!
//! let pipeline = Arc::new(DevicePipeline::new(transport, templates, settings));
//! let result = Runner::default()
//!     .run(devices, pipeline, Arc::new(LoggingProgressSink))
//!     .await;
//!
//! Reporter::new("logs")?.write_all(&result, &inventory)?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod inventory;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod template;
pub mod testing;
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::RunConfig;
    pub use crate::core::{
        DeviceOutcome, Failure, FailureKind, RunId, RunResult, Step, StepOutcome, StepResult,
    };
    pub use crate::errors::{FleetError, TransportError};
    pub use crate::events::{
        BoundedProgressSink, CollectingProgressSink, DeviceCompleted, LoggingProgressSink,
        NoOpProgressSink, ProgressBarSink, ProgressSink,
    };
    pub use crate::inventory::{Credentials, Device, HostRecord, Inventory, Selection};
    pub use crate::pipeline::{DevicePipeline, PipelineSettings};
    pub use crate::report::{retry_inventory, Reporter};
    pub use crate::runner::Runner;
    pub use crate::template::{
        FileTemplates, StaticTemplates, TemplateEngine, TemplateError, TemplateVars,
    };
    pub use crate::transport::{OpenSshTransport, Session, Transport};
}
