//! Durable run artifacts.
//!
//! The reporter turns a finished [`RunResult`] into:
//! - one log file per device under `<log_dir>/devices/`
//! - the consolidated `extended_run.log`, appended across invocations
//! - the retry inventory `retry_hosts.yaml`, holding exactly the failed
//!   devices (and deleted when a run has none — its absence is the
//!   converged signal)
//! - the `devices_report.csv` summary
//!
//! Artifact formats are stable: downstream tooling parses the banner and
//! task-block layout.

use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::core::{DeviceOutcome, RunResult};
use crate::errors::FleetError;
use crate::inventory::Inventory;

/// File name of the retry inventory artifact.
pub const RETRY_INVENTORY_FILE: &str = "retry_hosts.yaml";
/// File name of the consolidated run log.
pub const RUN_LOG_FILE: &str = "extended_run.log";
/// File name of the CSV device report.
pub const DEVICE_REPORT_FILE: &str = "devices_report.csv";

const BANNER_WIDTH: usize = 80;

/// Writes every artifact for a finished run.
pub struct Reporter {
    log_dir: PathBuf,
    device_dir: PathBuf,
}

impl Reporter {
    /// Creates the artifact directories up front. Failing here is a
    /// run-level error, surfaced before any worker starts.
    pub fn new(log_dir: impl Into<PathBuf>) -> Result<Self, FleetError> {
        let log_dir = log_dir.into();
        let device_dir = log_dir.join("devices");
        fs::create_dir_all(&device_dir)?;
        Ok(Self {
            log_dir,
            device_dir,
        })
    }

    /// The per-device artifact path. Failed devices carry the `ERROR` marker
    /// token in the name so a directory listing shows the damage at a glance.
    #[must_use]
    pub fn device_log_path(&self, outcome: &DeviceOutcome) -> PathBuf {
        let marker = if outcome.is_failed() { "~&ERROR" } else { "" };
        self.device_dir.join(format!(
            "Name-{}~&IP-{}{marker}.log",
            outcome.device, outcome.hostname
        ))
    }

    /// Writes all artifacts: per-device logs, the consolidated log, the CSV
    /// report and the retry inventory.
    pub fn write_all(&self, run: &RunResult, inventory: &Inventory) -> Result<(), FleetError> {
        for (_, outcome) in run.iter() {
            self.write_device_log(outcome)?;
        }
        self.append_run_log(run)?;
        self.write_device_report(run)?;
        self.write_retry_inventory(run, inventory)?;
        info!(
            run_id = %run.run_id(),
            devices = run.len(),
            failed = run.failed_count(),
            "run artifacts written"
        );
        Ok(())
    }

    /// Writes one device's artifact, replacing any previous version. A stale
    /// artifact from an earlier run may carry the other marker, so both
    /// candidate names are cleared first.
    pub fn write_device_log(&self, outcome: &DeviceOutcome) -> Result<(), FleetError> {
        let stale = self.device_dir.join(format!(
            "Name-{}~&IP-{}{}.log",
            outcome.device,
            outcome.hostname,
            if outcome.is_failed() { "" } else { "~&ERROR" }
        ));
        if stale.exists() {
            fs::remove_file(&stale)?;
        }

        let mut text = String::new();
        render_outcome(&mut text, outcome);
        fs::write(self.device_log_path(outcome), text)?;
        Ok(())
    }

    /// Appends one banner + step block per device to the consolidated log.
    pub fn append_run_log(&self, run: &RunResult) -> Result<(), FleetError> {
        let mut text = String::new();
        text.push_str(&format!(
            "==== RUN {} at {} ({} devices, {} failed)\n",
            run.run_id(),
            Utc::now().to_rfc3339(),
            run.len(),
            run.failed_count()
        ));
        for (_, outcome) in run.iter() {
            render_outcome(&mut text, outcome);
            text.push_str(&"~".repeat(BANNER_WIDTH));
            text.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_dir.join(RUN_LOG_FILE))?;
        file.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Writes the retry inventory, or deletes a stale one when the run has no
    /// failures. Returns the written path, if any.
    pub fn write_retry_inventory(
        &self,
        run: &RunResult,
        inventory: &Inventory,
    ) -> Result<Option<PathBuf>, FleetError> {
        let path = self.log_dir.join(RETRY_INVENTORY_FILE);
        let retry = retry_inventory(run, inventory);
        if retry.is_empty() {
            if path.exists() {
                fs::remove_file(&path)?;
                debug!(path = %path.display(), "stale retry inventory removed");
            }
            return Ok(None);
        }
        retry.save(&path)?;
        Ok(Some(path))
    }

    /// Writes the CSV device report: one row per device with its failure
    /// classification, empty for successes.
    pub fn write_device_report(&self, run: &RunResult) -> Result<PathBuf, FleetError> {
        let mut text = String::from("Hostname,IP Address,Error\n");
        for (name, outcome) in run.iter() {
            let error = outcome
                .failure_kind()
                .map(|k| format!("{k}!"))
                .unwrap_or_default();
            text.push_str(&format!(
                "{},{},{}\n",
                csv_field(name),
                csv_field(&outcome.hostname),
                csv_field(&error)
            ));
        }
        let path = self.log_dir.join(DEVICE_REPORT_FILE);
        fs::write(&path, text)?;
        Ok(path)
    }
}

/// Builds the failed-device subset, re-hydrated from the canonical records
/// by name so the artifact round-trips as the next run's input.
#[must_use]
pub fn retry_inventory(run: &RunResult, inventory: &Inventory) -> Inventory {
    let mut retry = Inventory::new();
    for outcome in run.failed() {
        if let Some(record) = inventory.get(&outcome.device) {
            retry.insert(outcome.device.clone(), record.clone());
        } else {
            warn!(device = %outcome.device, "failed device missing from inventory, not retryable");
        }
    }
    retry
}

fn render_outcome(out: &mut String, outcome: &DeviceOutcome) {
    let verdict = if outcome.is_failed() {
        "FAILED!"
    } else {
        "SUCCESS!"
    };
    let banner = format!(
        "**** PLAY on Device: (Name: {}, IP Address: {}) - {} ",
        outcome.device, outcome.hostname, verdict
    );
    out.push_str(&pad_center(&banner, '*'));
    out.push('\n');

    for (index, step) in outcome.steps.iter().enumerate() {
        let header = format!("---- TASK-{}: [{}] ", index + 1, step.step.label());
        out.push_str(&pad_right(&header, '-'));
        out.push('\n');
        out.push_str(step.text());
        out.push('\n');
    }

    if let Some(failure) = &outcome.failure {
        let header = format!("---- FAILURE: [{}] ", failure.kind);
        out.push_str(&pad_right(&header, '-'));
        out.push('\n');
        out.push_str(&failure.message);
        out.push('\n');
        if outcome.config_applied {
            out.push_str(
                "NOTE: configuration was applied to the device but not saved to startup.\n",
            );
        }
    }
}

fn pad_center(text: &str, fill: char) -> String {
    let len = text.chars().count();
    if len >= BANNER_WIDTH {
        return text.to_string();
    }
    let pad = BANNER_WIDTH - len;
    let left = pad / 2;
    let right = pad - left;
    format!(
        "{}{}{}",
        fill.to_string().repeat(left),
        text,
        fill.to_string().repeat(right)
    )
}

fn pad_right(text: &str, fill: char) -> String {
    let len = text.chars().count();
    if len >= BANNER_WIDTH {
        return text.to_string();
    }
    format!("{}{}", text, fill.to_string().repeat(BANNER_WIDTH - len))
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FailureKind, Step, StepOutcome};
    use crate::inventory::HostRecord;
    use pretty_assertions::assert_eq;

    fn success_outcome() -> DeviceOutcome {
        DeviceOutcome::success(
            "SW1",
            "10.0.0.1",
            vec![
                StepOutcome::ok(Step::Probe, "hostname SW1"),
                StepOutcome::ok(Step::Render, "hostname SW1\n"),
                StepOutcome::ok(Step::Push, "applied"),
                StepOutcome::ok(Step::Save, "saved"),
            ],
        )
        .with_config_applied()
    }

    fn failed_outcome() -> DeviceOutcome {
        DeviceOutcome::fail(
            "SW2",
            "10.0.0.2",
            Vec::new(),
            FailureKind::Unreachable,
            "no route to 10.0.0.2:22",
        )
    }

    fn inventory() -> Inventory {
        let mut inv = Inventory::new();
        inv.insert(
            "SW1",
            HostRecord::new("10.0.0.1", "ios").with_groups(vec!["switch".into()]),
        );
        inv.insert(
            "SW2",
            HostRecord::new("10.0.0.2", "ios").with_groups(vec!["switch".into()]),
        );
        inv
    }

    #[test]
    fn banner_is_centered_to_eighty_columns() {
        let mut text = String::new();
        render_outcome(&mut text, &success_outcome());
        let first = text.lines().next().unwrap();
        assert_eq!(first.chars().count(), 80);
        assert!(first.contains("**** PLAY on Device: (Name: SW1, IP Address: 10.0.0.1) - SUCCESS!"));
    }

    #[test]
    fn task_blocks_appear_in_pipeline_order() {
        let mut text = String::new();
        render_outcome(&mut text, &success_outcome());
        let probe = text.find("TASK-1: [Probing Device State]").unwrap();
        let save = text.find("TASK-4: [Saving Configuration on the Device]").unwrap();
        assert!(probe < save);
    }

    #[test]
    fn failed_device_log_carries_the_error_marker() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Reporter::new(dir.path()).unwrap();

        let path = reporter.device_log_path(&failed_outcome());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("Name-SW2~&IP-10.0.0.2~&ERROR.log"));

        reporter.write_device_log(&failed_outcome()).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("FAILED!"));
        assert!(text.contains("FAILURE: [Unreachable]"));
    }

    #[test]
    fn recovering_device_replaces_its_error_log() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Reporter::new(dir.path()).unwrap();

        reporter.write_device_log(&failed_outcome()).unwrap();
        let recovered = DeviceOutcome::success("SW2", "10.0.0.2", Vec::new());
        reporter.write_device_log(&recovered).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path().join("devices"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Name-SW2~&IP-10.0.0.2.log".to_string()]);
    }

    #[test]
    fn pushed_but_not_saved_is_called_out() {
        let outcome = DeviceOutcome::fail(
            "SW3",
            "10.0.0.3",
            vec![StepOutcome::failed(
                Step::Save,
                FailureKind::Persist,
                "startup write failed",
            )],
            FailureKind::Persist,
            "startup write failed",
        )
        .with_config_applied();

        let mut text = String::new();
        render_outcome(&mut text, &outcome);
        assert!(text.contains("applied to the device but not saved"));
    }

    #[test]
    fn consolidated_log_appends_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Reporter::new(dir.path()).unwrap();

        let mut run = RunResult::new();
        run.insert(success_outcome());
        reporter.append_run_log(&run).unwrap();
        reporter.append_run_log(&run).unwrap();

        let text = fs::read_to_string(dir.path().join(RUN_LOG_FILE)).unwrap();
        assert_eq!(text.matches("SUCCESS!").count(), 2);
        assert_eq!(text.matches("==== RUN").count(), 2);
    }

    #[test]
    fn retry_inventory_holds_exactly_the_failed_devices() {
        let mut run = RunResult::new();
        run.insert(success_outcome());
        run.insert(failed_outcome());

        let retry = retry_inventory(&run, &inventory());
        assert_eq!(retry.len(), 1);
        let record = retry.get("SW2").unwrap();
        assert_eq!(record.hostname, "10.0.0.2");
        assert_eq!(record.platform, "ios");
    }

    #[test]
    fn zero_failures_removes_the_stale_retry_file() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Reporter::new(dir.path()).unwrap();
        let inv = inventory();

        let mut failing = RunResult::new();
        failing.insert(failed_outcome());
        let written = reporter.write_retry_inventory(&failing, &inv).unwrap();
        assert!(written.is_some());

        let mut clean = RunResult::new();
        clean.insert(success_outcome());
        let written = reporter.write_retry_inventory(&clean, &inv).unwrap();
        assert!(written.is_none());
        assert!(!dir.path().join(RETRY_INVENTORY_FILE).exists());

        // Idempotent: a second aggregation pass leaves no artifact behind.
        reporter.write_retry_inventory(&clean, &inv).unwrap();
        assert!(!dir.path().join(RETRY_INVENTORY_FILE).exists());
    }

    #[test]
    fn csv_report_lists_every_device_with_its_error() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Reporter::new(dir.path()).unwrap();

        let mut run = RunResult::new();
        run.insert(success_outcome());
        run.insert(failed_outcome());
        let path = reporter.write_device_report(&run).unwrap();

        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Hostname,IP Address,Error");
        assert_eq!(lines[1], "SW1,10.0.0.1,");
        assert_eq!(lines[2], "SW2,10.0.0.2,Unreachable!");
    }
}
