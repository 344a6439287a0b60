//! Error types for the fleetconf engine.
//!
//! Two layers: [`FleetError`] covers run-level failures that abort the whole
//! invocation at the boundary (unreadable inventory, missing template
//! directory, artifact I/O), while [`TransportError`] carries the typed
//! per-device failures surfaced by the connection adapter. Device-level
//! failures never become `FleetError`s: they are folded into that device's
//! outcome and classified there.

use std::time::Duration;
use thiserror::Error;

/// Run-level fatal errors.
///
/// Anything of this type is reported immediately and stops the run before any
/// worker starts (or after all workers finish, for artifact writes). It is
/// never produced by a single device's pipeline.
#[derive(Debug, Error)]
pub enum FleetError {
    /// The inventory file could not be read or parsed.
    #[error("inventory error: {0}")]
    Inventory(String),

    /// The run configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The template directory does not exist.
    #[error("template directory not found: {0}")]
    TemplateDir(String),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    /// IO error while writing run artifacts.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FleetError {
    /// Creates an inventory error with file context.
    #[must_use]
    pub fn inventory(message: impl Into<String>) -> Self {
        Self::Inventory(message.into())
    }

    /// Creates a configuration error with file context.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Typed failures surfaced by the connection adapter.
///
/// Each variant corresponds to one distinguishable failure signal on the
/// wire; the pipeline maps these onto an outcome classification via
/// [`crate::core::FailureKind::from_transport`].
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Session establishment failed at the network level.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The device rejected the supplied credentials.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// Transport/cipher negotiation failed.
    #[error("key exchange failed: {0}")]
    KeyExchange(String),

    /// A remote command failed to execute.
    #[error("command failed: {0}")]
    Command(String),

    /// The device rejected one or more configuration lines.
    #[error("configuration rejected at '{line}': {message}")]
    ConfigRejected {
        /// The first rejected line, as reported by the device.
        line: String,
        /// The device's rejection message.
        message: String,
    },

    /// Saving the running configuration to non-volatile storage failed.
    #[error("save to startup configuration failed: {0}")]
    Persist(String),

    /// The operation did not complete within its deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    /// Creates a connect error.
    #[must_use]
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect(message.into())
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Creates a key exchange error.
    #[must_use]
    pub fn key_exchange(message: impl Into<String>) -> Self {
        Self::KeyExchange(message.into())
    }

    /// Creates a command error.
    #[must_use]
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command(message.into())
    }

    /// Creates a config rejection error.
    #[must_use]
    pub fn config_rejected(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigRejected {
            line: line.into(),
            message: message.into(),
        }
    }

    /// Creates a persist error.
    #[must_use]
    pub fn persist(message: impl Into<String>) -> Self {
        Self::Persist(message.into())
    }
}
