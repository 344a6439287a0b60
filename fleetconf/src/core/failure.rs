//! Failure classification for device outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Step;
use crate::errors::TransportError;

/// Why a device's pipeline failed.
///
/// Attached to the failed step and to the outcome's terminal failure marker;
/// the consolidated artifacts report it verbatim so a re-run can be targeted
/// by cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The connectivity probe failed; nothing was attempted on the device.
    Unreachable,
    /// Session establishment failed after the reachability check passed.
    Connection,
    /// The device rejected the supplied credentials.
    Authentication,
    /// Transport/cipher negotiation failed.
    KeyExchange,
    /// The rendering collaborator failed; no device mutation happened.
    Template,
    /// The device rejected one or more configuration lines.
    ConfigPush,
    /// Saving to non-volatile storage failed; the configuration is already
    /// live on the device despite the failed status.
    Persist,
    /// Anything not matching the above, caught at the pool boundary.
    Unhandled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "Unreachable"),
            Self::Connection => write!(f, "Connection Error"),
            Self::Authentication => write!(f, "Authentication Error"),
            Self::KeyExchange => write!(f, "Key Exchange Error"),
            Self::Template => write!(f, "Template Error"),
            Self::ConfigPush => write!(f, "Config Push Error"),
            Self::Persist => write!(f, "Persist Error"),
            Self::Unhandled => write!(f, "Unhandled Error"),
        }
    }
}

impl FailureKind {
    /// Maps an adapter failure onto its classification.
    ///
    /// Most variants classify on their own; generic command failures and
    /// timeouts classify by the step they occurred in.
    #[must_use]
    pub fn from_transport(err: &TransportError, step: Step) -> Self {
        match err {
            TransportError::Connect(_) => Self::Connection,
            TransportError::Auth(_) => Self::Authentication,
            TransportError::KeyExchange(_) => Self::KeyExchange,
            TransportError::ConfigRejected { .. } => Self::ConfigPush,
            TransportError::Persist(_) => Self::Persist,
            TransportError::Command(_) | TransportError::Timeout(_) => match step {
                Step::Probe => Self::Connection,
                Step::Render => Self::Template,
                Step::Push => Self::ConfigPush,
                Step::Save => Self::Persist,
            },
        }
    }

    /// True when the failure happened before any configuration reached the
    /// device.
    #[must_use]
    pub fn is_pre_push(&self) -> bool {
        matches!(
            self,
            Self::Unreachable
                | Self::Connection
                | Self::Authentication
                | Self::KeyExchange
                | Self::Template
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn classification_follows_the_error_variant() {
        let cases = [
            (TransportError::connect("refused"), FailureKind::Connection),
            (TransportError::auth("denied"), FailureKind::Authentication),
            (
                TransportError::key_exchange("no matching method"),
                FailureKind::KeyExchange,
            ),
            (
                TransportError::config_rejected("x", "% Invalid"),
                FailureKind::ConfigPush,
            ),
            (TransportError::persist("no space"), FailureKind::Persist),
        ];
        for (err, expected) in cases {
            assert_eq!(FailureKind::from_transport(&err, Step::Probe), expected);
        }
    }

    #[test]
    fn timeouts_classify_by_step() {
        let err = TransportError::Timeout(Duration::from_secs(5));
        assert_eq!(
            FailureKind::from_transport(&err, Step::Probe),
            FailureKind::Connection
        );
        assert_eq!(
            FailureKind::from_transport(&err, Step::Push),
            FailureKind::ConfigPush
        );
        assert_eq!(
            FailureKind::from_transport(&err, Step::Save),
            FailureKind::Persist
        );
    }

    #[test]
    fn serde_uses_snake_case_tags() {
        let json = serde_json::to_string(&FailureKind::KeyExchange).unwrap();
        assert_eq!(json, r#""key_exchange""#);
    }

    #[test]
    fn pre_push_failures() {
        assert!(FailureKind::Unreachable.is_pre_push());
        assert!(FailureKind::Template.is_pre_push());
        assert!(!FailureKind::ConfigPush.is_pre_push());
        assert!(!FailureKind::Persist.is_pre_push());
    }
}
