//! End-of-run notification
//!
//! Renders the run summary and dispatches it exactly once through the
//! notification transport, whatever happened earlier in the run. Dispatch
//! failures are logged and never alter the finalized run.

use async_trait::async_trait;
use tracing::{info, warn};

use drydock_client::{Notification, NotificationClient};
use drydock_core::domain::report::SeverityTally;
use drydock_core::domain::run::PipelineRun;

/// Transport the rendered notification goes out on
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn dispatch(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Webhook-backed transport
pub struct WebhookTransport {
    client: NotificationClient,
}

impl WebhookTransport {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: NotificationClient::new(webhook_url),
        }
    }
}

#[async_trait]
impl NotificationTransport for WebhookTransport {
    async fn dispatch(&self, notification: &Notification) -> anyhow::Result<()> {
        self.client.send(notification).await?;
        Ok(())
    }
}

/// Renders the summary notification for a finalized run
pub fn render(
    run: &PipelineRun,
    tally: Option<&SeverityTally>,
    attachments: Vec<String>,
    to: &str,
) -> Notification {
    let subject = format!(
        "[drydock] {} build #{} - {}",
        run.pipeline, run.build_number, run.status
    );

    let mut body = String::new();
    body.push_str(&format!("Pipeline: {}\n", run.pipeline));
    body.push_str(&format!("Run: {}\n", run.id));
    body.push_str(&format!("Build: #{}\n", run.build_number));
    body.push_str(&format!("Status: {}\n", run.status));
    body.push_str(&format!("Started: {}\n", run.started_at.to_rfc3339()));
    if let Some(completed_at) = run.completed_at {
        body.push_str(&format!("Completed: {}\n", completed_at.to_rfc3339()));
    }

    body.push_str("\nStages:\n");
    for stage in &run.stages {
        body.push_str(&format!("  {}: {}\n", stage.stage, stage.status));
    }

    if let Some(tally) = tally {
        body.push_str(&format!("\nScan findings: {}\n", tally));
    }

    if !attachments.is_empty() {
        body.push_str("\nArchived:\n");
        for attachment in &attachments {
            body.push_str(&format!("  {}\n", attachment));
        }
    }

    Notification {
        subject,
        body,
        attachments,
        to: to.to_string(),
    }
}

/// Sends the summary. Failures are logged only; the run is already final.
pub async fn send(transport: &dyn NotificationTransport, notification: &Notification) {
    match transport.dispatch(notification).await {
        Ok(()) => info!("Notification dispatched to {}", notification.to),
        Err(e) => warn!("Failed to dispatch notification: {:#}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drydock_core::domain::report::Severity;
    use drydock_core::domain::run::{RunStatus, StageResult, StageStatus};
    use uuid::Uuid;

    fn finished_run() -> PipelineRun {
        let mut run = PipelineRun::new(Uuid::new_v4(), "validate-and-deploy", 12);
        run.record_stage(StageResult {
            stage: "build".to_string(),
            status: StageStatus::Passed,
            steps: vec![],
            started_at: chrono::Utc::now(),
            duration_ms: 1500,
        });
        run.record_stage(StageResult {
            stage: "test".to_string(),
            status: StageStatus::Failed,
            steps: vec![],
            started_at: chrono::Utc::now(),
            duration_ms: 900,
        });
        run.seal_status();
        run.complete();
        run
    }

    #[test]
    fn test_render_summarizes_status_and_stages() {
        let run = finished_run();
        let notification = render(&run, None, vec![], "ops@example.com");

        assert!(notification.subject.contains("build #12"));
        assert!(notification.subject.contains("Failed"));
        assert!(notification.body.contains("  build: Passed"));
        assert!(notification.body.contains("  test: Failed"));
        assert_eq!(notification.to, "ops@example.com");
    }

    #[test]
    fn test_render_includes_tally_and_attachments() {
        let run = finished_run();
        let mut tally = SeverityTally::new();
        tally.record(Severity::High);
        tally.record(Severity::Low);

        let notification = render(
            &run,
            Some(&tally),
            vec!["scan.json".to_string(), "run.json".to_string()],
            "ops@example.com",
        );

        assert!(notification.body.contains("High=1"));
        assert!(notification.body.contains("Low=1"));
        assert!(notification.body.contains("  scan.json"));
        assert_eq!(notification.attachments.len(), 2);
    }

    #[test]
    fn test_run_status_is_missing_tally_tolerant() {
        let run = finished_run();
        let notification = render(&run, None, vec![], "ops@example.com");
        assert!(!notification.body.contains("Scan findings"));
    }
}
