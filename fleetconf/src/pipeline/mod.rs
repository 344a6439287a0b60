//! The fixed per-device task pipeline.
//!
//! One pipeline run walks a single device through
//! reachability → probe → render → push → save, strictly in order, capturing
//! one [`StepOutcome`] per attempted step. The first failure short-circuits
//! the rest; everything attempted so far stays recorded. The run is total:
//! every failure is folded into the returned [`DeviceOutcome`], never raised.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::RunConfig;
use crate::core::{DeviceOutcome, FailureKind, Step, StepOutcome};
use crate::errors::TransportError;
use crate::inventory::Device;
use crate::template::{TemplateEngine, TemplateVars};
use crate::transport::{Session, Transport};

/// Tunables for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Port the reachability probe targets.
    pub port: u16,
    /// Deadline for reachability and session establishment.
    pub connect_timeout: Duration,
    /// Deadline for each remote command.
    pub command_timeout: Duration,
    /// The diagnostic probe command.
    pub probe_command: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            port: 22,
            connect_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(30),
            probe_command: "show running-config | include hostname".to_string(),
        }
    }
}

impl From<&RunConfig> for PipelineSettings {
    fn from(config: &RunConfig) -> Self {
        Self {
            port: config.port,
            connect_timeout: config.connect_timeout(),
            command_timeout: config.command_timeout(),
            probe_command: config.probe_command.clone(),
        }
    }
}

/// Runs the fixed step sequence against a single device.
pub struct DevicePipeline {
    transport: Arc<dyn Transport>,
    templates: Arc<dyn TemplateEngine>,
    settings: PipelineSettings,
}

impl DevicePipeline {
    /// Wires the pipeline to its collaborators.
    pub fn new(
        transport: Arc<dyn Transport>,
        templates: Arc<dyn TemplateEngine>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            transport,
            templates,
            settings,
        }
    }

    /// Executes the pipeline for one device.
    pub async fn run(&self, device: &Device) -> DeviceOutcome {
        let reachable = self
            .transport
            .check_reachable(device, self.settings.port, self.settings.connect_timeout)
            .await;
        if !reachable {
            // Unreachable devices never see a config push.
            warn!(device = %device.name, hostname = %device.hostname, "device unreachable");
            return DeviceOutcome::fail(
                &device.name,
                &device.hostname,
                Vec::new(),
                FailureKind::Unreachable,
                format!(
                    "no route to {}:{}",
                    device.hostname, self.settings.port
                ),
            );
        }

        let mut session = match self.connect(device).await {
            Ok(session) => session,
            Err(err) => {
                let kind = FailureKind::from_transport(&err, Step::Probe);
                let message = err.to_string();
                return DeviceOutcome::fail(
                    &device.name,
                    &device.hostname,
                    vec![StepOutcome::failed(Step::Probe, kind, message.clone())],
                    kind,
                    message,
                );
            }
        };

        let outcome = self.run_steps(device, session.as_mut()).await;
        // Single close point: holds for success and for every failed step.
        session.close().await;
        outcome
    }

    async fn connect(&self, device: &Device) -> Result<Box<dyn Session>, TransportError> {
        match timeout(self.settings.connect_timeout, self.transport.connect(device)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.settings.connect_timeout)),
        }
    }

    async fn run_steps(&self, device: &Device, session: &mut dyn Session) -> DeviceOutcome {
        let mut steps = Vec::with_capacity(4);

        match self.call(session.probe(&self.settings.probe_command)).await {
            Ok(output) => steps.push(StepOutcome::ok(Step::Probe, output)),
            Err(err) => return abort(device, steps, Step::Probe, &err),
        }

        // Rendering is local CPU work; the session sits idle across it.
        let vars = TemplateVars::from_device(device);
        let key = device.template_key();
        let rendered = match self.templates.render(key, &vars) {
            Ok(text) => text,
            Err(err) => {
                let message = err.to_string();
                steps.push(StepOutcome::failed(
                    Step::Render,
                    FailureKind::Template,
                    message.clone(),
                ));
                return DeviceOutcome::fail(
                    &device.name,
                    &device.hostname,
                    steps,
                    FailureKind::Template,
                    message,
                );
            }
        };
        steps.push(StepOutcome::ok(Step::Render, rendered.clone()));

        let lines: Vec<String> = rendered
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(ToString::to_string)
            .collect();
        match self.call(session.push_config(&lines)).await {
            Ok(ack) => steps.push(StepOutcome::ok(Step::Push, ack)),
            Err(err) => return abort(device, steps, Step::Push, &err),
        }

        match self.call(session.persist()).await {
            Ok(ack) => steps.push(StepOutcome::ok(Step::Save, ack)),
            Err(err) => {
                // The configuration is already live on the device here; the
                // outcome carries that state explicitly.
                return abort(device, steps, Step::Save, &err).with_config_applied();
            }
        }

        debug!(device = %device.name, "pipeline completed");
        DeviceOutcome::success(&device.name, &device.hostname, steps).with_config_applied()
    }

    async fn call<T, F>(&self, operation: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        match timeout(self.settings.command_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.settings.command_timeout)),
        }
    }
}

fn abort(
    device: &Device,
    mut steps: Vec<StepOutcome>,
    step: Step,
    err: &TransportError,
) -> DeviceOutcome {
    let kind = FailureKind::from_transport(err, step);
    let message = err.to_string();
    steps.push(StepOutcome::failed(step, kind, message.clone()));
    DeviceOutcome::fail(&device.name, &device.hostname, steps, kind, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StepResult;
    use crate::errors::TransportError;
    use crate::testing::fixtures;
    use crate::testing::{DeviceScript, FakeTransport};

    fn pipeline(transport: Arc<FakeTransport>) -> DevicePipeline {
        DevicePipeline::new(
            transport,
            Arc::new(fixtures::static_templates()),
            PipelineSettings::default(),
        )
    }

    #[tokio::test]
    async fn successful_run_records_the_full_sequence() {
        let transport = Arc::new(FakeTransport::new());
        let device = fixtures::device("SW1", "10.0.0.1");

        let outcome = pipeline(Arc::clone(&transport)).run(&device).await;

        assert!(!outcome.is_failed());
        assert_eq!(
            outcome.step_sequence(),
            vec![Step::Probe, Step::Render, Step::Push, Step::Save]
        );
        assert!(outcome.config_applied);
        assert_eq!(transport.opened(), 1);
        assert_eq!(transport.closed(), 1);
    }

    #[tokio::test]
    async fn rendered_lines_reach_the_device() {
        let transport = Arc::new(FakeTransport::new());
        let device = fixtures::device("SW1", "10.0.0.1");

        pipeline(Arc::clone(&transport)).run(&device).await;

        let pushed = transport.pushed_lines("SW1").unwrap();
        assert_eq!(pushed, vec!["hostname SW1".to_string()]);
    }

    #[tokio::test]
    async fn unreachable_device_attempts_nothing() {
        let transport = Arc::new(FakeTransport::new());
        transport.script("SW1", DeviceScript::ok().unreachable());
        let device = fixtures::device("SW1", "10.0.0.1");

        let outcome = pipeline(Arc::clone(&transport)).run(&device).await;

        assert!(outcome.is_failed());
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Unreachable));
        assert!(outcome.steps.is_empty());
        assert_eq!(transport.opened(), 0);
    }

    #[tokio::test]
    async fn auth_rejection_classifies_the_probe_step() {
        let transport = Arc::new(FakeTransport::new());
        transport.script(
            "SW1",
            DeviceScript::ok().connect_error(TransportError::auth("permission denied")),
        );
        let device = fixtures::device("SW1", "10.0.0.1");

        let outcome = pipeline(Arc::clone(&transport)).run(&device).await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::Authentication));
        assert_eq!(outcome.steps.len(), 1);
        assert!(matches!(
            outcome.steps[0].result,
            StepResult::Failed {
                kind: FailureKind::Authentication,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn template_failure_aborts_before_any_push() {
        let transport = Arc::new(FakeTransport::new());
        let device = fixtures::device_in_group("SW9", "10.0.0.9", "unknown-group");

        let outcome = pipeline(Arc::clone(&transport)).run(&device).await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::Template));
        assert_eq!(outcome.step_sequence(), vec![Step::Probe, Step::Render]);
        assert!(transport.pushed_lines("SW9").is_none());
        // The session still gets torn down after the failed render.
        assert_eq!(transport.closed(), 1);
    }

    #[tokio::test]
    async fn push_rejection_short_circuits_save() {
        let transport = Arc::new(FakeTransport::new());
        transport.script(
            "SW1",
            DeviceScript::ok()
                .push_error(TransportError::config_rejected("ip rotuing", "% Invalid input")),
        );
        let device = fixtures::device("SW1", "10.0.0.1");

        let outcome = pipeline(Arc::clone(&transport)).run(&device).await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::ConfigPush));
        assert_eq!(
            outcome.step_sequence(),
            vec![Step::Probe, Step::Render, Step::Push]
        );
        assert!(!outcome.config_applied);
    }

    #[tokio::test]
    async fn save_failure_records_config_as_applied() {
        let transport = Arc::new(FakeTransport::new());
        transport.script(
            "SW1",
            DeviceScript::ok().persist_error(TransportError::persist("startup write failed")),
        );
        let device = fixtures::device("SW1", "10.0.0.1");

        let outcome = pipeline(Arc::clone(&transport)).run(&device).await;

        assert!(outcome.is_failed());
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Persist));
        assert!(outcome.config_applied);
        assert_eq!(outcome.steps.len(), 4);
    }

    #[tokio::test]
    async fn slow_command_times_out_as_that_steps_failure() {
        let transport = Arc::new(FakeTransport::new());
        transport.script(
            "SW1",
            DeviceScript::ok().probe_delay(Duration::from_secs(60)),
        );
        let device = fixtures::device("SW1", "10.0.0.1");

        let mut settings = PipelineSettings::default();
        settings.command_timeout = Duration::from_millis(50);
        let pipeline = DevicePipeline::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::new(fixtures::static_templates()),
            settings,
        );

        let outcome = pipeline.run(&device).await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::Connection));
        assert_eq!(outcome.step_sequence(), vec![Step::Probe]);
    }
}
