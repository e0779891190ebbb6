//! Step execution
//!
//! Runs one external process per step, captures its output, and applies
//! the step's failure tolerance. No retries: a step that cannot be
//! launched, exits non-zero without tolerance, or outlives its deadline
//! is a failed step. Exit-code semantics are POSIX (0 = success); nothing
//! else is assumed about the invoked tool.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use drydock_core::domain::run::StepOutcome;
use drydock_core::domain::stage::Step;

/// Executes a single step, bounded by `limit` when given
///
/// The working directory is the step's own, falling back to the run
/// workspace. All failure modes are folded into the returned outcome so
/// the stage record is complete even for steps that never ran.
pub async fn execute_step(step: &Step, limit: Option<Duration>, workspace: &Path) -> StepOutcome {
    debug!("Executing step: {} {:?}", step.command, step.args);

    let workdir = step.workdir.as_deref().unwrap_or(workspace);

    let mut command = Command::new(&step.command);
    command
        .args(&step.args)
        .current_dir(workdir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // The global watchdog can drop this future mid-wait; the child
        // must not outlive it.
        .kill_on_drop(true);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!("Failed to launch `{}`: {}", step.command, e);
            return StepOutcome::launch_failed(
                &step.command,
                format!("failed to launch: {}", e),
            );
        }
    };

    // Drain both pipes alongside wait(): a child filling a full pipe
    // would otherwise never exit.
    let stdout_task = tokio::spawn(read_pipe(child.stdout.take()));
    let stderr_task = tokio::spawn(read_pipe(child.stderr.take()));

    let waited = match limit {
        Some(limit) => match timeout(limit, child.wait()).await {
            Ok(waited) => waited,
            Err(_) => {
                // Best-effort kill; the process may have finished just as
                // the deadline hit. Ambiguity still counts as a timeout.
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed-out `{}`: {}", step.command, e);
                }
                warn!("`{}` timed out after {:?}", step.command, limit);
                let stdout = stdout_task.await.unwrap_or_default();
                let stderr = stderr_task.await.unwrap_or_default();
                return StepOutcome::timed_out(&step.command, limit, stdout, stderr);
            }
        },
        None => child.wait().await,
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    let status = match waited {
        Ok(status) => status,
        Err(e) => {
            warn!("Failed to wait on `{}`: {}", step.command, e);
            return StepOutcome::launch_failed(&step.command, format!("failed to wait: {}", e));
        }
    };

    let code = status.code().unwrap_or(-1);
    if !status.success() {
        debug!(
            "Step failed: cmd={} exit_code={} stderr='{}'",
            step.command,
            code,
            stderr.trim()
        );
    }

    StepOutcome::completed(&step.command, code, stdout, stderr, step.tolerate_failure)
}

async fn read_pipe<R>(pipe: Option<R>) -> String
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut buffer = String::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_string(&mut buffer).await;
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use drydock_core::domain::run::TIMEOUT_EXIT_CODE;
    use std::path::PathBuf;

    fn sh(script: &str) -> Step {
        Step {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            workdir: None,
            tolerate_failure: false,
        }
    }

    fn workspace() -> PathBuf {
        std::env::temp_dir()
    }

    #[tokio::test]
    async fn test_successful_step_captures_stdout() {
        let outcome = execute_step(&sh("echo hello"), None, &workspace()).await;
        assert!(!outcome.is_failure());
        assert_eq!(outcome.exit_code, Some(0));
        assert!(outcome.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_a_failure() {
        let outcome = execute_step(&sh("exit 3"), None, &workspace()).await;
        assert!(outcome.is_failure());
        assert_eq!(outcome.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_tolerated_nonzero_exit_is_recorded_not_failed() {
        let mut step = sh("echo warn >&2; exit 3");
        step.tolerate_failure = true;

        let outcome = execute_step(&step, None, &workspace()).await;
        assert!(!outcome.is_failure());
        assert!(outcome.tolerated);
        assert_eq!(outcome.exit_code, Some(3));
        assert!(outcome.stderr.contains("warn"));
    }

    #[tokio::test]
    async fn test_unlaunchable_command_has_no_exit_code() {
        let step = Step {
            command: "drydock-no-such-binary".to_string(),
            args: vec![],
            workdir: None,
            tolerate_failure: false,
        };

        let outcome = execute_step(&step, None, &workspace()).await;
        assert!(outcome.is_failure());
        assert!(outcome.exit_code.is_none());
    }

    #[tokio::test]
    async fn test_deadline_kills_step() {
        let outcome =
            execute_step(&sh("sleep 30"), Some(Duration::from_millis(200)), &workspace()).await;
        assert!(outcome.is_failure());
        assert_eq!(outcome.exit_code, Some(TIMEOUT_EXIT_CODE));
    }

    #[tokio::test]
    async fn test_step_runs_in_its_workdir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();

        let mut step = sh("ls");
        step.workdir = Some(dir.path().to_path_buf());

        let outcome = execute_step(&step, None, &workspace()).await;
        assert!(outcome.stdout.contains("marker.txt"));
    }
}
