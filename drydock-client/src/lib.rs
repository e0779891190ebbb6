//! Drydock collaborator clients
//!
//! HTTP clients for the external collaborators of a pipeline run: the
//! analysis service that issues quality-gate verdicts, the deployed
//! service's reachability endpoint, and the notification transport.
//!
//! Each collaborator gets its own narrow client; the pipeline engine never
//! assumes anything about the remote side beyond the small contracts here.

pub mod error;
mod gate;
mod notify;
mod probe;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use gate::{AnalysisClient, GateVerdict};
pub use notify::{Notification, NotificationClient};
pub use probe::HealthProbe;

/// Checks an API response status, turning non-success into a ClientError.
pub(crate) async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), message));
    }

    Ok(response)
}
