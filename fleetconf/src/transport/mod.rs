//! Device connection adapter.
//!
//! The traits here are the engine's only view of the wire: a [`Transport`]
//! opens sessions, a [`Session`] runs the probe/push/persist primitives.
//! Nothing behind these traits shares mutable state across devices, and the
//! pipeline guarantees [`Session::close`] runs on every exit path after a
//! successful connect.

mod openssh;

pub use openssh::OpenSshTransport;

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::errors::TransportError;
use crate::inventory::Device;

/// One live session against one device.
#[async_trait]
pub trait Session: Send {
    /// Runs a read-only diagnostic command and returns its output.
    async fn probe(&mut self, command: &str) -> Result<String, TransportError>;

    /// Pushes a batch of configuration lines. A rejected line aborts the
    /// whole batch; there is no line-granularity retry.
    async fn push_config(&mut self, lines: &[String]) -> Result<String, TransportError>;

    /// Persists the running configuration to non-volatile storage.
    async fn persist(&mut self) -> Result<String, TransportError>;

    /// Tears the session down.
    async fn close(&mut self);
}

/// Factory for device sessions plus the pure reachability probe.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establishes a session. Failures are typed so the pipeline can
    /// classify them.
    async fn connect(&self, device: &Device) -> Result<Box<dyn Session>, TransportError>;

    /// Pure connectivity probe: no session side effects, and any
    /// network-level failure reads as unreachable rather than an error.
    async fn check_reachable(&self, device: &Device, port: u16, timeout: Duration) -> bool {
        tcp_reachable(&device.hostname, port, timeout).await
    }
}

/// TCP connect probe behind the default reachability check.
pub async fn tcp_reachable(host: &str, port: u16, timeout: Duration) -> bool {
    let addr = format!("{host}:{port}");
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect(&addr)).await,
        Ok(Ok(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_port_reads_as_false_not_error() {
        // Port 1 on loopback is essentially never listening; either a refusal
        // or the timeout must come back as plain `false`.
        let reachable = tcp_reachable("127.0.0.1", 1, Duration::from_millis(200)).await;
        assert!(!reachable);
    }

    #[tokio::test]
    async fn unresolvable_host_reads_as_false() {
        let reachable = tcp_reachable(
            "host.invalid",
            22,
            Duration::from_millis(200),
        )
        .await;
        assert!(!reachable);
    }
}
