//! Device selection predicates.

use super::Device;

/// Which subset of the inventory this invocation runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every device.
    All,
    /// Only the named devices.
    Names(Vec<String>),
    /// Only devices belonging to the named group.
    Group(String),
}

impl Selection {
    /// Builds a name selection from anything iterable.
    #[must_use]
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Names(names.into_iter().map(Into::into).collect())
    }

    /// Builds a group selection.
    #[must_use]
    pub fn group(name: impl Into<String>) -> Self {
        Self::Group(name.into())
    }

    /// True when the device is in this selection.
    #[must_use]
    pub fn matches(&self, device: &Device) -> bool {
        match self {
            Self::All => true,
            Self::Names(names) => names.iter().any(|n| n == &device.name),
            Self::Group(group) => device.in_group(group),
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::All
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::HostRecord;

    fn device(name: &str, groups: &[&str]) -> Device {
        let record = HostRecord::new("10.0.0.1", "ios")
            .with_groups(groups.iter().map(ToString::to_string).collect());
        Device::from_record(name, &record)
    }

    #[test]
    fn all_matches_everything() {
        assert!(Selection::All.matches(&device("SW1", &[])));
    }

    #[test]
    fn names_match_exactly() {
        let selection = Selection::names(["SW1", "SW3"]);
        assert!(selection.matches(&device("SW1", &[])));
        assert!(!selection.matches(&device("SW2", &[])));
    }

    #[test]
    fn group_matches_membership() {
        let selection = Selection::group("switch");
        assert!(selection.matches(&device("SW1", &["switch"])));
        assert!(!selection.matches(&device("SW2", &["router"])));
    }
}
