//! Command-line front end for the fleetconf engine.
//!
//! Loads the inventory and run configuration, applies the device selection
//! and the credential transform, dispatches the pipeline across the fleet
//! and writes the run artifacts. Exits non-zero when any device failed, so
//! wrapper automation can chain on convergence.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fleetconf::prelude::*;

#[derive(Parser, Debug)]
#[command(
    name = "fleetconf",
    version,
    about = "Push templated configuration to a fleet of network switches"
)]
struct Cli {
    /// Inventory file (YAML, name -> {hostname, platform, groups, data}).
    #[arg(long, default_value = "hosts.yaml")]
    inventory: PathBuf,

    /// Optional run configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only run against devices in this group.
    #[arg(long, conflicts_with = "host")]
    group: Option<String>,

    /// Only run against the named devices (repeatable).
    #[arg(long)]
    host: Vec<String>,

    /// Login username.
    #[arg(long, env = "FLEETCONF_USERNAME")]
    username: String,

    /// Login password.
    #[arg(long, env = "FLEETCONF_PASSWORD", hide_env_values = true)]
    password: String,

    /// Enable password, where the platform needs one.
    #[arg(long, env = "FLEETCONF_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Worker pool width override.
    #[arg(long)]
    workers: Option<usize>,

    /// Disable the interactive progress bar.
    #[arg(long)]
    no_progress: bool,
}

impl Cli {
    fn selection(&self) -> Selection {
        if let Some(group) = &self.group {
            Selection::group(group)
        } else if self.host.is_empty() {
            Selection::All
        } else {
            Selection::names(self.host.clone())
        }
    }

    fn credentials(&self) -> Credentials {
        let credentials = Credentials::new(&self.username, &self.password);
        match &self.secret {
            Some(secret) => credentials.with_secret(secret),
            None => credentials,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config.num_workers = workers;
    }

    // Everything that can fail at the boundary fails here, before dispatch.
    let inventory = Inventory::load(&cli.inventory)?;
    let credentials = cli.credentials();
    let devices: Vec<Device> = inventory
        .select(&cli.selection())
        .iter()
        .map(|d| d.with_credentials(&credentials))
        .collect();
    if devices.is_empty() {
        bail!("no devices matched the selection");
    }

    let templates = Arc::new(FileTemplates::open(&config.template_dir)?);
    let transport = Arc::new(OpenSshTransport::new(config.connect_timeout()));
    let pipeline = Arc::new(DevicePipeline::new(
        transport,
        templates,
        PipelineSettings::from(&config),
    ));
    let reporter = Reporter::new(&config.log_dir).context("creating log directories")?;

    let bar = Arc::new(if cli.no_progress {
        ProgressBarSink::hidden()
    } else {
        ProgressBarSink::new(devices.len())
    });

    info!(
        devices = devices.len(),
        workers = config.num_workers,
        "starting fleet configuration run"
    );

    let result = Runner::new(config.num_workers)
        .run(
            devices,
            pipeline,
            Arc::clone(&bar) as Arc<dyn ProgressSink>,
        )
        .await;
    bar.finish(result.failed_count());

    reporter
        .write_all(&result, &inventory)
        .context("writing run artifacts")?;

    println!(
        "{} device(s) processed, {} failed.",
        result.len(),
        result.failed_count()
    );
    if result.all_succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "Retry inventory written to {}; feed it back with --inventory to re-run the failures.",
            config.log_dir.join(fleetconf::report::RETRY_INVENTORY_FILE).display()
        );
        Ok(ExitCode::FAILURE)
    }
}
