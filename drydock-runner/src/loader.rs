//! Pipeline definition loading
//!
//! Reads the TOML pipeline definition once at run start and validates it
//! structurally before anything executes. An invalid definition never
//! reaches the orchestrator.

use std::path::Path;
use thiserror::Error;
use tracing::debug;

use drydock_core::domain::stage::PipelineDefinition;

/// Definition load or validation failure
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid pipeline definition: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid pipeline definition: {0}")]
    Invalid(String),
}

/// Loads and validates a definition file
pub fn load_definition(path: &Path) -> Result<PipelineDefinition, DefinitionError> {
    debug!("Loading pipeline definition from {}", path.display());

    let raw = std::fs::read_to_string(path).map_err(|source| DefinitionError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let definition: PipelineDefinition = toml::from_str(&raw)?;
    validate(&definition)?;

    Ok(definition)
}

/// Structural checks on a parsed definition
pub fn validate(definition: &PipelineDefinition) -> Result<(), DefinitionError> {
    if definition.name.is_empty() {
        return Err(DefinitionError::Invalid("pipeline name is empty".to_string()));
    }

    if definition.stages.is_empty() {
        return Err(DefinitionError::Invalid("no stages defined".to_string()));
    }

    for stage in &definition.stages {
        if stage.name.is_empty() {
            return Err(DefinitionError::Invalid("stage with empty name".to_string()));
        }

        if let Some(0) = stage.timeout_seconds {
            return Err(DefinitionError::Invalid(format!(
                "stage '{}' has a zero timeout",
                stage.name
            )));
        }

        for step in &stage.steps {
            if step.command.is_empty() {
                return Err(DefinitionError::Invalid(format!(
                    "stage '{}' has a step with an empty command",
                    stage.name
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use drydock_core::domain::stage::FailurePolicy;
    use std::io::Write;

    const FULL_DEFINITION: &str = r#"
        name = "validate-and-deploy"
        description = "Build, scan, and deploy the service"
        artifacts = ["reports/*.json", "target/*.log"]
        scan_report = "reports/scan.json"

        [[stages]]
        name = "build"

        [[stages.steps]]
        command = "make"
        args = ["build"]

        [[stages]]
        name = "static-analysis"
        failure_policy = "continue"
        quality_gate = true

        [[stages.steps]]
        command = "analyzer"
        tolerate_failure = true

        [[stages]]
        name = "deploy"
        timeout_seconds = 300
        health_check = "http://localhost:8080/health"

        [[stages.steps]]
        command = "deployctl"
        args = ["up"]
    "#;

    fn write_definition(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_definition() {
        let file = write_definition(FULL_DEFINITION);
        let definition = load_definition(file.path()).unwrap();

        assert_eq!(definition.name, "validate-and-deploy");
        assert_eq!(definition.stages.len(), 3);
        assert_eq!(definition.artifacts.len(), 2);
        assert_eq!(
            definition.stages[1].failure_policy,
            FailurePolicy::ContinueOnFailure
        );
        assert!(definition.stages[1].quality_gate);
        assert_eq!(
            definition.stages[2].health_check.as_deref(),
            Some("http://localhost:8080/health")
        );
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let result = load_definition(Path::new("/nonexistent/pipeline.toml"));
        assert!(matches!(result, Err(DefinitionError::Read { .. })));
    }

    #[test]
    fn test_empty_stage_list_rejected() {
        let file = write_definition(r#"name = "empty""#);
        let result = load_definition(file.path());
        assert!(matches!(result, Err(DefinitionError::Parse(_))));
    }

    #[test]
    fn test_empty_command_rejected() {
        let file = write_definition(
            r#"
            name = "broken"

            [[stages]]
            name = "build"

            [[stages.steps]]
            command = ""
            "#,
        );
        let result = load_definition(file.path());
        assert!(matches!(result, Err(DefinitionError::Invalid(_))));
    }

    #[test]
    fn test_zero_stage_timeout_rejected() {
        let file = write_definition(
            r#"
            name = "broken"

            [[stages]]
            name = "build"
            timeout_seconds = 0
            "#,
        );
        let result = load_definition(file.path());
        assert!(matches!(result, Err(DefinitionError::Invalid(_))));
    }
}
