//! Quality-gate wait
//!
//! Polls the analysis service for the run's verdict. The gate is an
//! asynchronous external dependency that may lag the run by minutes, so
//! exhausting the polling window is tolerated by default: the timeout is
//! logged and the pipeline continues. A Failed verdict stops the polling
//! (the answer arrived) but only fails the stage when the gate is
//! configured to abort on failure.

use tracing::{debug, info, warn};
use uuid::Uuid;

use drydock_client::{AnalysisClient, GateVerdict};

use crate::poll::{self, CheckOutcome, PollConfig, PollOutcome};

/// Result of the quality-gate wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Verdict arrived positive.
    Passed,
    /// Verdict arrived negative. Fatal only under `abort_on_failure`.
    Failed,
    /// The polling window closed without a verdict. Non-fatal.
    TimedOut,
}

/// Waits for the analysis verdict of `run_id`
///
/// A transiently unreachable service is indistinguishable from a slow
/// analysis, so transport failures count as Pending rather than stopping
/// the wait.
pub async fn await_verdict(
    client: &AnalysisClient,
    run_id: Uuid,
    config: &PollConfig,
) -> GateOutcome {
    let outcome = poll::poll(config, "quality gate", move || async move {
        match client.verdict(run_id).await {
            Ok(GateVerdict::Passed) => CheckOutcome::Ready(GateVerdict::Passed),
            Ok(GateVerdict::Failed) => CheckOutcome::Ready(GateVerdict::Failed),
            Ok(GateVerdict::Pending) => CheckOutcome::NotReady,
            Err(e) if e.is_unreachable() => {
                debug!("Analysis service unreachable: {}", e);
                CheckOutcome::NotReady
            }
            Err(e) => {
                warn!("Analysis service error: {}", e);
                CheckOutcome::NotReady
            }
        }
    })
    .await;

    match outcome {
        PollOutcome::Ready(GateVerdict::Passed) => {
            info!("Quality gate passed for run {}", run_id);
            GateOutcome::Passed
        }
        PollOutcome::Ready(_) => {
            warn!("Quality gate failed for run {}", run_id);
            GateOutcome::Failed
        }
        PollOutcome::Exhausted => {
            warn!(
                "Quality gate verdict for run {} not available after {} attempt(s); continuing",
                run_id, config.max_attempts
            );
            GateOutcome::TimedOut
        }
        // The check maps every failure to Pending, so this path stays
        // theoretical; treat it like the timeout if it ever fires.
        PollOutcome::Error(message) => {
            warn!("Quality gate wait stopped: {}", message);
            GateOutcome::TimedOut
        }
    }
}
