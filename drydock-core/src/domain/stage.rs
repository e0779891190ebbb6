//! Stage configuration types
//!
//! The pipeline definition is read once at run start and treated as
//! immutable for the run's duration. Stages execute strictly in order;
//! each carries its own failure policy and an optional per-step time
//! budget inherited by every step in the stage.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Pipeline definition
///
/// The ordered stage list plus what the run archives at the end: artifact
/// patterns and the scan report the aggregator parses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub stages: Vec<Stage>,
    /// Glob patterns, relative to the workspace, collected into the
    /// archive during the final phase.
    #[serde(default)]
    pub artifacts: Vec<String>,
    /// Severity-tagged findings document, relative to the workspace.
    #[serde(default)]
    pub scan_report: Option<PathBuf>,
}

/// A named, ordered group of steps with one failure policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Per-step time budget, inherited by every step in this stage.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    /// Wait for the analysis service's verdict after this stage's steps.
    #[serde(default)]
    pub quality_gate: bool,
    /// Probe this address for readiness after this stage's steps.
    #[serde(default)]
    pub health_check: Option<String>,
}

impl Stage {
    /// The per-step deadline, when configured.
    pub fn step_timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

/// What a failing step does to the rest of the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// A failed step fails the stage and stops all further stages.
    #[default]
    #[serde(rename = "abort")]
    AbortOnFailure,
    /// A failed step is recorded; remaining steps and stages still run.
    #[serde(rename = "continue")]
    ContinueOnFailure,
}

/// One external process invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory; defaults to the run workspace.
    #[serde(default)]
    pub workdir: Option<PathBuf>,
    /// When true, a non-zero exit is recorded but does not fail the stage.
    #[serde(default)]
    pub tolerate_failure: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_definition_defaults() {
        let definition: PipelineDefinition = toml::from_str(
            r#"
            name = "validate"

            [[stages]]
            name = "build"

            [[stages.steps]]
            command = "make"
            "#,
        )
        .unwrap();

        assert_eq!(definition.name, "validate");
        assert!(definition.artifacts.is_empty());
        assert!(definition.scan_report.is_none());

        let stage = &definition.stages[0];
        assert_eq!(stage.failure_policy, FailurePolicy::AbortOnFailure);
        assert!(stage.timeout_seconds.is_none());
        assert!(!stage.quality_gate);
        assert!(stage.health_check.is_none());

        let step = &stage.steps[0];
        assert!(step.args.is_empty());
        assert!(step.workdir.is_none());
        assert!(!step.tolerate_failure);
    }

    #[test]
    fn test_continue_policy_parses() {
        let stage: Stage = toml::from_str(
            r#"
            name = "scan"
            failure_policy = "continue"
            "#,
        )
        .unwrap();
        assert_eq!(stage.failure_policy, FailurePolicy::ContinueOnFailure);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let result: Result<Stage, _> = toml::from_str(
            r#"
            name = "scan"
            failure_policy = "retry"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_step_timeout_conversion() {
        let stage = Stage {
            name: "deploy".to_string(),
            steps: vec![],
            failure_policy: FailurePolicy::AbortOnFailure,
            timeout_seconds: Some(30),
            quality_gate: false,
            health_check: None,
        };
        assert_eq!(stage.step_timeout(), Some(Duration::from_secs(30)));
    }
}
