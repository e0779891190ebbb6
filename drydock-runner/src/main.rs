//! Drydock
//!
//! Deployment/validation pipeline runner. Takes a TOML pipeline
//! definition, executes its stages strictly in order, and always finishes
//! with teardown, archiving, and a notification.
//!
//! The process exit code reflects the run outcome: 0 for a succeeded run,
//! 1 for a failed one, 2 when the global timeout aborted it.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drydock_core::domain::run::RunStatus;
use drydock_runner::config::Config;
use drydock_runner::loader;
use drydock_runner::orchestrator::Orchestrator;

#[derive(Parser)]
#[command(name = "drydock")]
#[command(about = "Deployment/validation pipeline runner", long_about = None)]
struct Cli {
    /// Pipeline definition file
    definition: PathBuf,

    /// Build number stamped on the run
    #[arg(long)]
    build_number: Option<u64>,

    /// Archive directory for artifacts and the run record
    #[arg(long)]
    archive_dir: Option<PathBuf>,

    /// Global wall-clock timeout in seconds
    #[arg(long)]
    global_timeout: Option<u64>,

    /// Validate the definition and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drydock=info,drydock_runner=info,drydock_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(Cli::parse()).await {
        Ok(RunStatus::Succeeded) => ExitCode::SUCCESS,
        Ok(RunStatus::Aborted) => ExitCode::from(2),
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<RunStatus> {
    let definition = loader::load_definition(&cli.definition).with_context(|| {
        format!(
            "Failed to load pipeline definition {}",
            cli.definition.display()
        )
    })?;

    info!(
        "Loaded pipeline '{}' with {} stage(s)",
        definition.name,
        definition.stages.len()
    );

    if cli.check {
        info!("Pipeline definition is valid");
        return Ok(RunStatus::Succeeded);
    }

    let mut config = Config::from_env();
    if let Some(build_number) = cli.build_number {
        config.build_number = build_number;
    }
    if let Some(archive_dir) = cli.archive_dir {
        config.archive_dir = archive_dir;
    }
    if let Some(seconds) = cli.global_timeout {
        config.global_timeout = Duration::from_secs(seconds);
    }
    config.validate().context("Invalid runner configuration")?;

    let run = Orchestrator::new(definition, config).run().await;

    Ok(run.status)
}
