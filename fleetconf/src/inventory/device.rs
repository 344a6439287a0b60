//! Device records and the credential transform.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Login material injected before dispatch.
///
/// Never serialized: credentials exist only on the in-memory device view a
/// run works with, not in any inventory document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login username.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Enable password, where the platform needs one.
    pub secret: Option<String>,
}

impl Credentials {
    /// Creates credentials without an enable password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            secret: None,
        }
    }

    /// Sets the enable password.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }
}

/// One inventory record, keyed externally by device name.
///
/// This is the serialized shape: the input inventory document and the retry
/// inventory both map `name -> HostRecord`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Network address (hostname or IP).
    pub hostname: String,
    /// Vendor OS family tag, used to pick templates.
    pub platform: String,
    /// Ordered group memberships.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    /// Free-form extension fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, serde_json::Value>,
}

impl HostRecord {
    /// Creates a record with the two mandatory fields.
    #[must_use]
    pub fn new(hostname: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            platform: platform.into(),
            groups: Vec::new(),
            data: BTreeMap::new(),
        }
    }

    /// Sets the group memberships.
    #[must_use]
    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    /// Adds one extension field.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// A managed device: an inventory record joined with its name and, after the
/// credential transform, with login material.
///
/// Pipeline execution never mutates a `Device`; run state lives in the
/// per-device outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    /// Identity and join key across logs, retry inventory and aggregation.
    pub name: String,
    /// Network address.
    pub hostname: String,
    /// Vendor OS family tag.
    pub platform: String,
    /// Ordered group memberships.
    pub groups: Vec<String>,
    /// Free-form extension fields.
    pub data: BTreeMap<String, serde_json::Value>,
    /// Login material; `None` until the credential transform runs.
    pub credentials: Option<Credentials>,
}

impl Device {
    /// Joins an inventory record with its name.
    #[must_use]
    pub fn from_record(name: impl Into<String>, record: &HostRecord) -> Self {
        Self {
            name: name.into(),
            hostname: record.hostname.clone(),
            platform: record.platform.clone(),
            groups: record.groups.clone(),
            data: record.data.clone(),
            credentials: None,
        }
    }

    /// Re-hydrates the serializable record, e.g. for the retry inventory.
    #[must_use]
    pub fn record(&self) -> HostRecord {
        HostRecord {
            hostname: self.hostname.clone(),
            platform: self.platform.clone(),
            groups: self.groups.clone(),
            data: self.data.clone(),
        }
    }

    /// Pure credential injection: returns a new device view carrying the
    /// login material. The canonical inventory record stays untouched.
    #[must_use]
    pub fn with_credentials(&self, credentials: &Credentials) -> Self {
        Self {
            credentials: Some(credentials.clone()),
            ..self.clone()
        }
    }

    /// True when the device belongs to the named group.
    #[must_use]
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// The key the rendering collaborator is addressed by: the primary group
    /// when one exists, otherwise the platform tag.
    #[must_use]
    pub fn template_key(&self) -> &str {
        self.groups.first().map_or(&self.platform, |g| g.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_injection_is_pure() {
        let record = HostRecord::new("192.168.1.201", "ios");
        let device = Device::from_record("SW1", &record);
        let creds = Credentials::new("admin", "Admin123").with_secret("Enable123");

        let armed = device.with_credentials(&creds);

        assert!(device.credentials.is_none());
        assert_eq!(armed.credentials, Some(creds));
        assert_eq!(armed.name, device.name);
    }

    #[test]
    fn template_key_prefers_the_primary_group() {
        let record =
            HostRecord::new("10.0.0.1", "ios").with_groups(vec!["switch".into(), "edge".into()]);
        let device = Device::from_record("SW1", &record);
        assert_eq!(device.template_key(), "switch");

        let bare = Device::from_record("SW2", &HostRecord::new("10.0.0.2", "nxos"));
        assert_eq!(bare.template_key(), "nxos");
    }

    #[test]
    fn record_round_trip_preserves_all_fields() {
        let record = HostRecord::new("10.0.0.1", "ios")
            .with_groups(vec!["switch".into()])
            .with_data("site", serde_json::json!("dc-1"));
        let device = Device::from_record("SW1", &record);
        assert_eq!(device.record(), record);
    }
}
