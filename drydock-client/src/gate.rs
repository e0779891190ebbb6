//! Analysis service client
//!
//! Queries the external analysis service for the quality-gate verdict of a
//! pipeline run. Verdicts are computed asynchronously and may lag the run
//! by minutes; callers poll until the verdict leaves Pending.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ClientError, Result};

/// Verdict reported by the analysis service for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateVerdict {
    Passed,
    Failed,
    Pending,
}

#[derive(Debug, Deserialize)]
struct VerdictResponse {
    verdict: GateVerdict,
}

/// HTTP client for the analysis service
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    /// Base URL of the analysis service (e.g. "http://localhost:9000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl AnalysisClient {
    /// Create a new analysis client
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Get the base URL of the analysis service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the verdict for a run
    ///
    /// Returns the verdict as reported; callers map transport failures to
    /// Pending when polling.
    pub async fn verdict(&self, run_id: Uuid) -> Result<GateVerdict> {
        let url = format!("{}/api/runs/{}/verdict", self.base_url, run_id);
        debug!("Fetching quality-gate verdict from {}", url);

        let response = self.client.get(&url).send().await?;
        let response = crate::expect_success(response).await?;

        let body: VerdictResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("Failed to parse verdict response: {}", e)))?;

        Ok(body.verdict)
    }
}
