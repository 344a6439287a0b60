//! Device inventory: the canonical record set a run selects from.
//!
//! The on-disk shape is a YAML document mapping device name to record:
//!
//! ```yaml
//! SW1:
//!   hostname: 192.168.1.201
//!   platform: ios
//!   groups: [switch]
//! ```
//!
//! The retry inventory a run emits uses the same shape, so it can be fed
//! straight back in as the next run's input.

mod device;
mod filter;

pub use device::{Credentials, Device, HostRecord};
pub use filter::Selection;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::errors::FleetError;

/// The full inventory document: device name → record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    hosts: BTreeMap<String, HostRecord>,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads an inventory document. Unreadable or unparsable files are
    /// run-level fatal errors.
    pub fn load(path: &Path) -> Result<Self, FleetError> {
        let text = fs::read_to_string(path)
            .map_err(|e| FleetError::inventory(format!("{}: {e}", path.display())))?;
        serde_yml::from_str(&text)
            .map_err(|e| FleetError::inventory(format!("{}: {e}", path.display())))
    }

    /// Writes the inventory document.
    pub fn save(&self, path: &Path) -> Result<(), FleetError> {
        let text = serde_yml::to_string(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Adds or replaces one record.
    pub fn insert(&mut self, name: impl Into<String>, record: HostRecord) {
        self.hosts.insert(name.into(), record);
    }

    /// Looks a record up by device name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&HostRecord> {
        self.hosts.get(name)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// True when the inventory holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Device names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.hosts.keys()
    }

    /// Every device, joined with its name.
    #[must_use]
    pub fn devices(&self) -> Vec<Device> {
        self.hosts
            .iter()
            .map(|(name, record)| Device::from_record(name, record))
            .collect()
    }

    /// The devices matching a selection.
    #[must_use]
    pub fn select(&self, selection: &Selection) -> Vec<Device> {
        self.devices()
            .into_iter()
            .filter(|d| selection.matches(d))
            .collect()
    }
}
