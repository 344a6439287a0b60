//! Builders for common test data.

use crate::inventory::{Credentials, Device, HostRecord, Inventory};
use crate::template::StaticTemplates;

/// A switch-group device with injected lab credentials.
#[must_use]
pub fn device(name: &str, hostname: &str) -> Device {
    device_in_group(name, hostname, "switch")
}

/// A device in an arbitrary group.
#[must_use]
pub fn device_in_group(name: &str, hostname: &str, group: &str) -> Device {
    let record = HostRecord::new(hostname, "ios").with_groups(vec![group.to_string()]);
    Device::from_record(name, &record).with_credentials(&credentials())
}

/// The lab credentials used across tests.
#[must_use]
pub fn credentials() -> Credentials {
    Credentials::new("admin", "Admin123")
}

/// An inventory built from `(name, hostname)` pairs, all in the switch group.
#[must_use]
pub fn inventory(devices: &[(&str, &str)]) -> Inventory {
    let mut inv = Inventory::new();
    for (name, hostname) in devices {
        inv.insert(
            *name,
            HostRecord::new(*hostname, "ios").with_groups(vec!["switch".to_string()]),
        );
    }
    inv
}

/// A template set covering the switch group, using the device name variable.
#[must_use]
pub fn static_templates() -> StaticTemplates {
    StaticTemplates::new().with("switch", "hostname {{ name }}\n")
}
