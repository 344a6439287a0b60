//! SSH transport backed by the system `ssh` binary.
//!
//! Every operation is a fresh, non-interactive `ssh` invocation with
//! `BatchMode=yes`, so a stalled device can never hold a prompt open against
//! a worker. Key-based auth is assumed; the username comes from the injected
//! credentials.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{Session, Transport};
use crate::errors::TransportError;
use crate::inventory::Device;

/// Connection adapter shelling out to OpenSSH.
#[derive(Debug, Clone)]
pub struct OpenSshTransport {
    connect_timeout: Duration,
    save_command: String,
}

impl OpenSshTransport {
    /// Creates the adapter with the connect timeout passed down to
    /// `ConnectTimeout`.
    #[must_use]
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            save_command: "write memory".to_string(),
        }
    }

    /// Overrides the save-to-startup command for platforms that spell it
    /// differently.
    #[must_use]
    pub fn with_save_command(mut self, command: impl Into<String>) -> Self {
        self.save_command = command.into();
        self
    }
}

#[async_trait]
impl Transport for OpenSshTransport {
    async fn connect(&self, device: &Device) -> Result<Box<dyn Session>, TransportError> {
        let Some(credentials) = &device.credentials else {
            return Err(TransportError::auth("no credentials injected for device"));
        };

        let session = OpenSshSession {
            target: format!("{}@{}", credentials.username, device.hostname),
            connect_timeout: self.connect_timeout,
            save_command: self.save_command.clone(),
        };

        // A no-op exchange proves the session material works before the
        // pipeline commits to running steps.
        session.run(Some("exit"), None).await?;
        debug!(device = %device.name, target = %session.target, "ssh session established");
        Ok(Box::new(session))
    }
}

struct OpenSshSession {
    target: String,
    connect_timeout: Duration,
    save_command: String,
}

impl OpenSshSession {
    fn base_args(&self) -> Vec<String> {
        vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            self.target.clone(),
        ]
    }

    async fn run(&self, command: Option<&str>, stdin: Option<&str>) -> Result<String, TransportError> {
        let mut cmd = Command::new("ssh");
        cmd.args(self.base_args());
        if let Some(command) = command {
            cmd.arg(command);
        }
        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| TransportError::connect(format!("failed to spawn ssh: {e}")))?;

        if let Some(input) = stdin {
            if let Some(mut handle) = child.stdin.take() {
                handle
                    .write_all(input.as_bytes())
                    .await
                    .map_err(|e| TransportError::command(format!("stdin write failed: {e}")))?;
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| TransportError::command(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(classify(&stderr))
        }
    }
}

#[async_trait]
impl Session for OpenSshSession {
    async fn probe(&mut self, command: &str) -> Result<String, TransportError> {
        self.run(Some(command), None).await
    }

    async fn push_config(&mut self, lines: &[String]) -> Result<String, TransportError> {
        // The exec channel drops straight into the device CLI, so the batch
        // goes down as a config session on stdin.
        let batch = format!("configure terminal\n{}\nend\n", lines.join("\n"));
        let output = self.run(None, Some(&batch)).await?;

        if let Some(rejection) = first_rejection(&output) {
            return Err(TransportError::config_rejected(
                rejection.to_string(),
                "device rejected configuration line",
            ));
        }
        Ok(output)
    }

    async fn persist(&mut self) -> Result<String, TransportError> {
        let command = self.save_command.clone();
        self.run(Some(&command), None)
            .await
            .map_err(|e| TransportError::persist(e.to_string()))
    }

    async fn close(&mut self) {
        // Nothing to tear down: each operation was its own process.
        debug!(target = %self.target, "ssh session closed");
    }
}

/// Maps OpenSSH diagnostics onto the typed adapter failures. The signal
/// strings are the ones device log tooling has always keyed on.
fn classify(stderr: &str) -> TransportError {
    let lower = stderr.to_lowercase();
    let detail = first_line(stderr);

    if lower.contains("permission denied") || lower.contains("authentication fail") {
        TransportError::auth(detail)
    } else if lower.contains("no matching key exchange method")
        || lower.contains("no matching cipher")
        || lower.contains("no matching host key type")
    {
        TransportError::key_exchange(detail)
    } else if lower.contains("connection refused")
        || lower.contains("connection timed out")
        || lower.contains("could not resolve hostname")
        || lower.contains("no route to host")
    {
        TransportError::connect(detail)
    } else {
        TransportError::command(detail)
    }
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("ssh exited with an error")
        .to_string()
}

/// IOS-family CLIs flag a rejected line with a `%` marker in the echo.
fn first_rejection(output: &str) -> Option<&str> {
    output.lines().map(str::trim).find(|line| {
        let lower = line.to_lowercase();
        lower.starts_with("% invalid") || lower.starts_with("% error") || lower.starts_with("% incomplete")
    })
}
