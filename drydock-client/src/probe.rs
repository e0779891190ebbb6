//! Deployed-service reachability probe
//!
//! Lightweight liveness check against a just-deployed service. The probe
//! reports reachable yes/no only; connection refusal and non-success
//! responses both read as "not up yet" to a caller polling during startup.

use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Reachability probe with a bounded per-request timeout
#[derive(Debug, Clone)]
pub struct HealthProbe {
    client: Client,
    request_timeout: Duration,
}

impl HealthProbe {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            request_timeout,
        }
    }

    /// Probes `address` once
    ///
    /// True only for a success response inside the request timeout.
    pub async fn probe(&self, address: &str) -> bool {
        match self
            .client
            .get(address)
            .timeout(self.request_timeout)
            .send()
            .await
        {
            Ok(response) => {
                let reachable = response.status().is_success();
                debug!("Probe {} -> {}", address, response.status());
                reachable
            }
            Err(e) => {
                debug!("Probe {} failed: {}", address, e);
                false
            }
        }
    }
}
