//! Pipeline run domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Standard timeout exit code
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// One execution of a pipeline
///
/// Created by the orchestrator at run start, mutated only by it, and
/// finalized once the terminal phase completes. The finalized record is
/// archived alongside the run's artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub pipeline: String,
    pub build_number: u64,
    pub status: RunStatus,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub stages: Vec<StageResult>,
}

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
    Aborted,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "Running",
            RunStatus::Succeeded => "Succeeded",
            RunStatus::Failed => "Failed",
            RunStatus::Aborted => "Aborted",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PipelineRun {
    /// Creates a run in the Running state, stamped with the current time.
    ///
    /// The id is supplied by the caller: it is shared with the analysis
    /// service, which reports quality-gate verdicts per run id.
    pub fn new(id: Uuid, pipeline: impl Into<String>, build_number: u64) -> Self {
        Self {
            id,
            pipeline: pipeline.into(),
            build_number,
            status: RunStatus::Running,
            started_at: chrono::Utc::now(),
            completed_at: None,
            stages: Vec::new(),
        }
    }

    /// Appends a completed stage result. Results are never mutated after
    /// this point.
    pub fn record_stage(&mut self, result: StageResult) {
        self.stages.push(result);
    }

    /// Computes the terminal status from the recorded stages.
    ///
    /// A run the watchdog already marked Aborted keeps that status; any
    /// failed stage (tolerated or not) makes the run Failed; otherwise it
    /// Succeeded.
    pub fn seal_status(&mut self) {
        if self.status != RunStatus::Running {
            return;
        }
        let any_failed = self
            .stages
            .iter()
            .any(|stage| stage.status == StageStatus::Failed);
        self.status = if any_failed {
            RunStatus::Failed
        } else {
            RunStatus::Succeeded
        };
    }

    /// Stamps the completion time.
    pub fn complete(&mut self) {
        self.completed_at = Some(chrono::Utc::now());
    }

    pub fn is_terminal(&self) -> bool {
        self.status != RunStatus::Running
    }
}

/// Result of one stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: String,
    pub status: StageStatus,
    pub steps: Vec<StepOutcome>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub duration_ms: u64,
}

impl StageResult {
    /// A stage that never ran because an earlier stage aborted the run.
    pub fn skipped(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            status: StageStatus::Skipped,
            steps: Vec::new(),
            started_at: chrono::Utc::now(),
            duration_ms: 0,
        }
    }
}

/// Stage execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    Passed,
    Failed,
    Skipped,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Passed => "Passed",
            StageStatus::Failed => "Failed",
            StageStatus::Skipped => "Skipped",
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one step execution
///
/// Captured output is retained inline; empty captures are skipped when the
/// run record is serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub command: String,
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    /// True when a non-zero exit was tolerated by the step configuration.
    pub tolerated: bool,
    pub error: Option<String>,
}

impl StepOutcome {
    /// Step finished on its own.
    pub fn completed(
        command: impl Into<String>,
        code: i32,
        stdout: String,
        stderr: String,
        tolerate_failure: bool,
    ) -> Self {
        let error = if code == 0 || tolerate_failure {
            None
        } else {
            Some(format!("exited with code {}", code))
        };
        Self {
            command: command.into(),
            exit_code: Some(code),
            stdout,
            stderr,
            tolerated: tolerate_failure && code != 0,
            error,
        }
    }

    /// The per-step deadline elapsed and the process was killed.
    ///
    /// The kill is best-effort; the process may have finished just as
    /// termination was requested. Ambiguity still counts as a timeout.
    pub fn timed_out(command: impl Into<String>, limit: Duration, stdout: String, stderr: String) -> Self {
        Self {
            command: command.into(),
            exit_code: Some(TIMEOUT_EXIT_CODE),
            stdout,
            stderr,
            tolerated: false,
            error: Some(format!("timed out after {}s", limit.as_secs())),
        }
    }

    /// The process could not be launched at all.
    pub fn launch_failed(command: impl Into<String>, message: String) -> Self {
        Self {
            command: command.into(),
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            tolerated: false,
            error: Some(message),
        }
    }

    /// Whether this outcome fails its stage under the stage's policy.
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
