//! Run configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::FleetError;

/// Tunables for one invocation, loadable from a YAML document.
///
/// Every field has a default, so running without a config file works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Worker pool width.
    pub num_workers: usize,
    /// Port the reachability probe targets.
    pub port: u16,
    /// Deadline for reachability and session establishment, in seconds.
    pub connect_timeout_secs: u64,
    /// Deadline for each remote command, in seconds.
    pub command_timeout_secs: u64,
    /// The diagnostic probe command.
    pub probe_command: String,
    /// Directory the run artifacts land in.
    pub log_dir: PathBuf,
    /// Directory the configuration templates live in.
    pub template_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            port: 22,
            connect_timeout_secs: 10,
            command_timeout_secs: 30,
            probe_command: "show running-config | include hostname".to_string(),
            log_dir: PathBuf::from("logs"),
            template_dir: PathBuf::from("templates"),
        }
    }
}

impl RunConfig {
    /// Loads a config document. Unreadable or unparsable files are run-level
    /// fatal errors.
    pub fn load(path: &Path) -> Result<Self, FleetError> {
        let text = fs::read_to_string(path)
            .map_err(|e| FleetError::config(format!("{}: {e}", path.display())))?;
        serde_yml::from_str(&text)
            .map_err(|e| FleetError::config(format!("{}: {e}", path.display())))
    }

    /// The connect deadline as a duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// The per-command deadline as a duration.
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_usable_without_a_file() {
        let config = RunConfig::default();
        assert!(config.num_workers >= 1);
        assert_eq!(config.port, 22);
        assert_eq!(config.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let config: RunConfig = serde_yml::from_str("num_workers: 4\nport: 2222\n").unwrap();
        assert_eq!(config.num_workers, 4);
        assert_eq!(config.port, 2222);
        assert_eq!(config.command_timeout_secs, 30);
    }

    #[test]
    fn load_reports_missing_file_as_config_error() {
        let err = RunConfig::load(Path::new("/nonexistent/run.yaml")).unwrap_err();
        assert!(err.to_string().starts_with("configuration error"));
    }

    #[test]
    fn load_round_trips_through_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        let config = RunConfig {
            num_workers: 2,
            ..RunConfig::default()
        };
        fs::write(&path, serde_yml::to_string(&config).unwrap()).unwrap();
        assert_eq!(RunConfig::load(&path).unwrap(), config);
    }
}
