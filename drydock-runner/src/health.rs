//! Deployment readiness wait
//!
//! After the deploy stage starts the service, polls its address until a
//! probe succeeds or the attempts run out. During startup an absent
//! service is always transient from the pipeline's viewpoint, so the
//! probe never produces a hard poll error.
//!
//! Readiness is advisory: a service still unreachable when the window
//! closes is logged as a warning and the deployment still counts as
//! complete.

use tracing::{info, warn};

use drydock_client::HealthProbe;

use crate::poll::{self, CheckOutcome, PollConfig, PollOutcome};

/// Polls `address` until it answers. Returns whether it became reachable.
pub async fn await_ready(probe: &HealthProbe, address: &str, config: &PollConfig) -> bool {
    let outcome = poll::poll(config, "health check", move || async move {
        if probe.probe(address).await {
            CheckOutcome::Ready(())
        } else {
            CheckOutcome::NotReady
        }
    })
    .await;

    match outcome {
        PollOutcome::Ready(()) => {
            info!("Service at {} is reachable", address);
            true
        }
        PollOutcome::Exhausted => {
            warn!(
                "Service at {} not reachable after {} attempt(s)",
                address, config.max_attempts
            );
            false
        }
        PollOutcome::Error(message) => {
            warn!("Health check wait stopped: {}", message);
            false
        }
    }
}
