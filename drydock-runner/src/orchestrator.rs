//! Stage orchestration
//!
//! The top-level driver for one pipeline run: executes stages strictly in
//! order under a global wall-clock budget, applies each stage's failure
//! policy, and always finishes with the final phase (deployment teardown,
//! report aggregation, artifact archiving, the notification) exactly
//! once, whatever happened before it.
//!
//! Stage N's effects (files produced, a deployed instance) are fully
//! established before stage N+1 begins; there is no parallel stage
//! execution.

use std::path::PathBuf;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use drydock_client::{AnalysisClient, HealthProbe};
use drydock_core::domain::artifact::ArtifactSet;
use drydock_core::domain::report::SeverityTally;
use drydock_core::domain::run::{PipelineRun, RunStatus, StageResult, StageStatus};
use drydock_core::domain::stage::{FailurePolicy, PipelineDefinition, Stage};

use crate::artifact;
use crate::config::Config;
use crate::context::RunContext;
use crate::executor;
use crate::gate::{self, GateOutcome};
use crate::health;
use crate::notify::{self, NotificationTransport, WebhookTransport};
use crate::poll::PollConfig;
use crate::report;

/// One-run orchestrator
///
/// Owns the immutable definition, the collaborator clients, and the run
/// context. Consumed by [`Orchestrator::run`].
pub struct Orchestrator {
    definition: PipelineDefinition,
    config: Config,
    context: RunContext,
    analysis: Option<AnalysisClient>,
    probe: HealthProbe,
    transport: Option<Box<dyn NotificationTransport>>,
}

impl Orchestrator {
    /// Creates an orchestrator for one run of `definition`
    ///
    /// The definition is expected to be validated (see
    /// [`crate::loader::load_definition`]).
    pub fn new(definition: PipelineDefinition, config: Config) -> Self {
        let run_id = Uuid::new_v4();
        let context = RunContext::new(run_id, config.workspace.clone(), config.archive_dir.clone());

        let analysis = config.analysis_url.as_deref().map(AnalysisClient::new);
        let probe = HealthProbe::new(config.health_probe_timeout);
        let transport: Option<Box<dyn NotificationTransport>> = config
            .notify_webhook
            .as_deref()
            .map(|url| Box::new(WebhookTransport::new(url)) as Box<dyn NotificationTransport>);

        Self {
            definition,
            config,
            context,
            analysis,
            probe,
            transport,
        }
    }

    /// Replaces the notification transport (tests, alternate transports).
    pub fn with_transport(mut self, transport: Box<dyn NotificationTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Runs the pipeline to completion and returns the finalized run
    ///
    /// Never returns early: the final phase executes on every path, and
    /// its own failures are logged without touching the computed status.
    pub async fn run(self) -> PipelineRun {
        let mut run = PipelineRun::new(
            self.context.run_id,
            self.definition.name.clone(),
            self.config.build_number,
        );

        info!(
            "Starting run {} (build #{}) with {} stage(s)",
            run.id,
            run.build_number,
            self.definition.stages.len()
        );
        self.context
            .log_info(format!("Starting pipeline: {}", self.definition.name));

        // The watchdog: the whole stage sequence races the global budget.
        // On expiry the in-flight step future is dropped, which kills its
        // child process best-effort.
        match timeout(self.config.global_timeout, self.execute_stages(&mut run)).await {
            Ok(()) => {}
            Err(_) => {
                warn!(
                    "Global timeout of {}s exceeded; aborting run {}",
                    self.config.global_timeout.as_secs(),
                    run.id
                );
                run.status = RunStatus::Aborted;
                self.context.leave_stage();
                self.context.log_error(format!(
                    "Run aborted: global timeout of {}s exceeded",
                    self.config.global_timeout.as_secs()
                ));
            }
        }

        run.seal_status();
        self.final_phase(&mut run).await;

        info!("Run {} finished: {}", run.id, run.status);
        run
    }

    /// Executes the stage list in order, honoring failure policies.
    async fn execute_stages(&self, run: &mut PipelineRun) {
        let total = self.definition.stages.len();

        for (idx, stage) in self.definition.stages.iter().enumerate() {
            info!("Executing stage {}/{}: {}", idx + 1, total, stage.name);
            self.context.enter_stage(&stage.name);
            self.context
                .log_info(format!("Starting stage: {}", stage.name));

            let result = self.run_stage(stage).await;
            let failed = result.status == StageStatus::Failed;

            if failed {
                self.context.log_error(format!("Stage '{}' failed", stage.name));
            } else {
                self.context
                    .log_info(format!("Stage '{}' completed", stage.name));
            }
            self.context.leave_stage();
            run.record_stage(result);

            if failed && stage.failure_policy == FailurePolicy::AbortOnFailure {
                error!("Stage '{}' failed; skipping remaining stages", stage.name);
                for skipped in &self.definition.stages[idx + 1..] {
                    info!("Stage '{}' skipped", skipped.name);
                    self.context
                        .log_info(format!("Stage '{}' skipped", skipped.name));
                    run.record_stage(StageResult::skipped(&skipped.name));
                }
                return;
            }
        }
    }

    /// Runs one stage: its steps, then any post-step waits it declares.
    async fn run_stage(&self, stage: &Stage) -> StageResult {
        let started_at = chrono::Utc::now();
        let begun = std::time::Instant::now();
        let step_limit = stage.step_timeout();

        let mut steps = Vec::new();
        let mut failed = false;

        for step in &stage.steps {
            let outcome = executor::execute_step(step, step_limit, &self.config.workspace).await;

            if let Some(message) = &outcome.error {
                self.context
                    .log_error(format!("Step `{}` failed: {}", outcome.command, message));
                failed = true;
            } else if outcome.tolerated {
                self.context.log_warning(format!(
                    "Step `{}` exited with code {} (tolerated)",
                    outcome.command,
                    outcome.exit_code.unwrap_or(-1)
                ));
            }

            let fatal = outcome.is_failure();
            steps.push(outcome);

            // AbortOnFailure stops the stage at the failing step;
            // ContinueOnFailure records it and keeps stepping.
            if fatal && stage.failure_policy == FailurePolicy::AbortOnFailure {
                break;
            }
        }

        let stage_aborted = failed && stage.failure_policy == FailurePolicy::AbortOnFailure;
        if !stage_aborted {
            if self.await_quality_gate(stage).await == GateOutcome::Failed
                && self.config.gate_abort_on_failure
            {
                self.context
                    .log_error("Quality gate failed the stage".to_string());
                failed = true;
            }

            self.await_health_check(stage).await;
        }

        StageResult {
            stage: stage.name.clone(),
            status: if failed {
                StageStatus::Failed
            } else {
                StageStatus::Passed
            },
            steps,
            started_at,
            duration_ms: begun.elapsed().as_millis() as u64,
        }
    }

    /// Waits on the analysis verdict when the stage requests it.
    ///
    /// An exhausted polling window is a non-fatal timeout; only a Failed
    /// verdict can fail the stage, and only by configuration.
    async fn await_quality_gate(&self, stage: &Stage) -> GateOutcome {
        if !stage.quality_gate {
            return GateOutcome::Passed;
        }

        let Some(client) = &self.analysis else {
            warn!(
                "Stage '{}' requests a quality gate but no analysis service is configured",
                stage.name
            );
            self.context.log_warning(
                "Quality gate requested but no analysis service configured; skipping".to_string(),
            );
            return GateOutcome::Passed;
        };

        self.context
            .log_info("Waiting for quality gate verdict".to_string());
        let poll_config = PollConfig::new(self.config.gate_max_attempts, self.config.gate_interval)
            .with_attempt_timeout(self.config.gate_attempt_timeout);

        let outcome = gate::await_verdict(client, self.context.run_id, &poll_config).await;
        match outcome {
            GateOutcome::Passed => self.context.log_info("Quality gate passed".to_string()),
            GateOutcome::Failed if !self.config.gate_abort_on_failure => self
                .context
                .log_warning("Quality gate failed (non-fatal by configuration)".to_string()),
            GateOutcome::Failed => {}
            GateOutcome::TimedOut => self.context.log_warning(
                "Quality gate verdict not available in time; continuing".to_string(),
            ),
        }
        outcome
    }

    /// Probes the deployed service when the stage declares an address.
    ///
    /// Readiness is advisory: exhausting the window leaves the stage
    /// result untouched.
    async fn await_health_check(&self, stage: &Stage) {
        let Some(address) = &stage.health_check else {
            return;
        };

        self.context
            .log_info(format!("Waiting for {} to become reachable", address));
        let poll_config =
            PollConfig::new(self.config.health_max_attempts, self.config.health_interval)
                .with_attempt_timeout(self.config.health_probe_timeout);

        if health::await_ready(&self.probe, address, &poll_config).await {
            self.context
                .log_info(format!("Service at {} is reachable", address));
        } else {
            self.context.log_warning(format!(
                "Service at {} not reachable; deployment reported as complete anyway",
                address
            ));
        }
    }

    /// The unconditional final phase: teardown, aggregation, archiving,
    /// notification. Each part catches and logs its own failures so one
    /// failing cleanup cannot mask the others or the run status.
    async fn final_phase(&self, run: &mut PipelineRun) {
        info!("Entering final phase for run {}", run.id);

        self.teardown_deployment().await;

        let tally = self.aggregate_scan_report();
        let artifacts = self.collect_artifacts();

        run.complete();

        let mut attachments: Vec<String> = artifacts
            .files()
            .map(|path| path.display().to_string())
            .collect();

        if let Some(path) = self.archive_run_record(run) {
            attachments.push(path.display().to_string());
        }

        match self.context.flush_to_archive() {
            Ok(path) => attachments.push(path.display().to_string()),
            Err(e) => warn!("Failed to write run log: {}", e),
        }

        let notification = notify::render(run, tally.as_ref(), attachments, &self.config.notify_to);
        match &self.transport {
            Some(transport) => notify::send(transport.as_ref(), &notification).await,
            None => info!(
                "No notification transport configured; summary:\n{}",
                notification.body
            ),
        }
    }

    /// Stops and removes the deployed instance
    ///
    /// Idempotent: removing an instance that does not exist is a no-op,
    /// because teardown also runs after partial or failed deployments.
    async fn teardown_deployment(&self) {
        let Some(instance) = &self.config.deploy_instance else {
            debug!("No deployed instance configured; teardown is a no-op");
            return;
        };
        let runtime = &self.config.container_runtime;

        info!("Tearing down deployed instance {}", instance);

        // Stop first (ignoring errors if it is not running), then remove.
        let _ = Command::new(runtime)
            .arg("stop")
            .arg(instance)
            .output()
            .await;

        match Command::new(runtime)
            .arg("rm")
            .arg("-f")
            .arg(instance)
            .output()
            .await
        {
            Ok(output) if output.status.success() => {
                debug!("Instance {} removed", instance);
                self.context
                    .log_info(format!("Removed deployed instance {}", instance));
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                debug!(
                    "No deployed instance {} to remove: {}",
                    instance,
                    stderr.trim()
                );
            }
            Err(e) => warn!("Failed to run {} rm: {}", runtime, e),
        }
    }

    /// Parses the scan report when the definition declares one.
    ///
    /// A ParseError is tolerated: the tally is simply absent from the
    /// summary.
    fn aggregate_scan_report(&self) -> Option<SeverityTally> {
        let relative = self.definition.scan_report.as_ref()?;
        let path = self.config.workspace.join(relative);

        match report::parse_file(&path) {
            Ok(scan) => {
                let tally = report::tally(&scan);
                info!(
                    "Aggregated {} finding(s) from {}: {}",
                    tally.total(),
                    path.display(),
                    tally
                );
                self.context.log_info(format!("Scan findings: {}", tally));
                Some(tally)
            }
            Err(e) => {
                warn!("Failed to aggregate scan report {}: {}", path.display(), e);
                self.context
                    .log_warning(format!("Scan report not aggregated: {}", e));
                None
            }
        }
    }

    /// Archives the declared artifact patterns.
    fn collect_artifacts(&self) -> ArtifactSet {
        let artifacts = artifact::collect(
            &self.config.workspace,
            &self.definition.artifacts,
            &self.context.archive_dir,
        );
        info!(
            "Archived {} artifact file(s) across {} pattern(s)",
            artifacts.total_files(),
            artifacts.entries.len()
        );
        artifacts
    }

    /// Writes the finalized run record into the archive.
    fn archive_run_record(&self, run: &PipelineRun) -> Option<PathBuf> {
        let json = match serde_json::to_string_pretty(run) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize run record: {}", e);
                return None;
            }
        };

        let path = self.context.archive_dir.join("run.json");
        match std::fs::create_dir_all(&self.context.archive_dir)
            .and_then(|_| std::fs::write(&path, json))
        {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("Failed to write run record {}: {}", path.display(), e);
                None
            }
        }
    }
}
