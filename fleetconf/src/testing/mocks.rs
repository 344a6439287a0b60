//! In-memory transport with scripted per-device behaviour.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::TransportError;
use crate::inventory::Device;
use crate::transport::{Session, Transport};

/// Scripted behaviour for one device. Unscripted devices behave as healthy.
#[derive(Debug, Clone)]
pub struct DeviceScript {
    unreachable: bool,
    connect_error: Option<TransportError>,
    probe_error: Option<TransportError>,
    push_error: Option<TransportError>,
    persist_error: Option<TransportError>,
    probe_output: String,
    panic_on_probe: bool,
    probe_delay: Option<Duration>,
}

impl DeviceScript {
    /// A healthy device.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            unreachable: false,
            connect_error: None,
            probe_error: None,
            push_error: None,
            persist_error: None,
            probe_output: "hostname DEVICE".to_string(),
            panic_on_probe: false,
            probe_delay: None,
        }
    }

    /// Fails the reachability probe.
    #[must_use]
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Fails session establishment.
    #[must_use]
    pub fn connect_error(mut self, err: TransportError) -> Self {
        self.connect_error = Some(err);
        self
    }

    /// Fails the probe command.
    #[must_use]
    pub fn probe_error(mut self, err: TransportError) -> Self {
        self.probe_error = Some(err);
        self
    }

    /// Fails the configuration push.
    #[must_use]
    pub fn push_error(mut self, err: TransportError) -> Self {
        self.push_error = Some(err);
        self
    }

    /// Fails the save step.
    #[must_use]
    pub fn persist_error(mut self, err: TransportError) -> Self {
        self.persist_error = Some(err);
        self
    }

    /// Sets the probe command output.
    #[must_use]
    pub fn probe_output(mut self, output: impl Into<String>) -> Self {
        self.probe_output = output.into();
        self
    }

    /// Panics inside the probe, for pool-boundary tests.
    #[must_use]
    pub fn panic_on_probe(mut self) -> Self {
        self.panic_on_probe = true;
        self
    }

    /// Delays the probe, for timeout and slow-device tests.
    #[must_use]
    pub fn probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = Some(delay);
        self
    }
}

impl Default for DeviceScript {
    fn default() -> Self {
        Self::ok()
    }
}

#[derive(Debug, Default)]
struct FakeState {
    opened: usize,
    closed: usize,
    pushed: HashMap<String, Vec<String>>,
}

/// In-memory transport whose behaviour is scripted per device name.
///
/// Tracks session open/close pairing and the configuration lines each
/// device received, so tests can assert the adapter contract held.
#[derive(Debug, Default)]
pub struct FakeTransport {
    scripts: Mutex<HashMap<String, DeviceScript>>,
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    /// Creates a transport where every device is healthy until scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts one device's behaviour.
    pub fn script(&self, device: &str, script: DeviceScript) {
        self.scripts.lock().insert(device.to_string(), script);
    }

    /// Number of sessions opened.
    #[must_use]
    pub fn opened(&self) -> usize {
        self.state.lock().opened
    }

    /// Number of sessions closed.
    #[must_use]
    pub fn closed(&self) -> usize {
        self.state.lock().closed
    }

    /// The configuration lines pushed to one device, if any reached it.
    #[must_use]
    pub fn pushed_lines(&self, device: &str) -> Option<Vec<String>> {
        self.state.lock().pushed.get(device).cloned()
    }

    fn script_for(&self, device: &str) -> DeviceScript {
        self.scripts
            .lock()
            .get(device)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(&self, device: &Device) -> Result<Box<dyn Session>, TransportError> {
        let script = self.script_for(&device.name);
        if let Some(err) = script.connect_error.clone() {
            return Err(err);
        }
        self.state.lock().opened += 1;
        Ok(Box::new(FakeSession {
            device: device.name.clone(),
            script,
            state: Arc::clone(&self.state),
            closed: false,
        }))
    }

    async fn check_reachable(&self, device: &Device, _port: u16, _timeout: Duration) -> bool {
        !self.script_for(&device.name).unreachable
    }
}

struct FakeSession {
    device: String,
    script: DeviceScript,
    state: Arc<Mutex<FakeState>>,
    closed: bool,
}

#[async_trait]
impl Session for FakeSession {
    async fn probe(&mut self, _command: &str) -> Result<String, TransportError> {
        if let Some(delay) = self.script.probe_delay {
            tokio::time::sleep(delay).await;
        }
        assert!(
            !self.script.panic_on_probe,
            "scripted panic for {}",
            self.device
        );
        if let Some(err) = self.script.probe_error.clone() {
            return Err(err);
        }
        Ok(self.script.probe_output.clone())
    }

    async fn push_config(&mut self, lines: &[String]) -> Result<String, TransportError> {
        if let Some(err) = self.script.push_error.clone() {
            return Err(err);
        }
        self.state
            .lock()
            .pushed
            .insert(self.device.clone(), lines.to_vec());
        Ok("applied".to_string())
    }

    async fn persist(&mut self) -> Result<String, TransportError> {
        if let Some(err) = self.script.persist_error.clone() {
            return Err(err);
        }
        Ok("saved".to_string())
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.lock().closed += 1;
        }
    }
}
