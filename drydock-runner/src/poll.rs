//! Bounded-retry polling primitive
//!
//! Shared by the quality-gate and health-check waits. The important split
//! is soft versus hard failure: a check that is not ready yet (or timed
//! out) is retried after the interval, while a check that reports an error
//! stops the wait immediately. Transient unavailability must never be
//! confused with a configuration or protocol fault.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Polling parameters
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Total check attempts before giving up.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub interval: Duration,
    /// Upper bound on a single check call. A timed-out check counts as
    /// not-ready, not as an error.
    pub attempt_timeout: Option<Duration>,
}

impl PollConfig {
    /// Creates a config. At least one attempt is always made.
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
            attempt_timeout: None,
        }
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = Some(attempt_timeout);
        self
    }
}

/// Result of one check attempt
#[derive(Debug)]
pub enum CheckOutcome<T> {
    /// The awaited condition holds; polling stops.
    Ready(T),
    /// Not there yet; retry after the interval.
    NotReady,
    /// Unrecoverable fault; polling stops immediately.
    Error(String),
}

/// Result of a full poll
#[derive(Debug, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The condition held on some attempt.
    Ready(T),
    /// All attempts used without the condition holding. Advisory: the
    /// caller decides whether this is fatal.
    Exhausted,
    /// A check reported an unrecoverable fault.
    Error(String),
}

impl<T> PollOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready(_))
    }
}

/// Polls `check` until ready, exhausted, or hard error
///
/// The first Ready short-circuits with no further waiting. NotReady sleeps
/// for the interval and retries; after the final attempt there is no
/// sleep. An Error outcome returns immediately without sleeping.
///
/// `what` labels the wait in log output.
pub async fn poll<T, F, Fut>(config: &PollConfig, what: &str, mut check: F) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CheckOutcome<T>>,
{
    let max_attempts = config.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let outcome = match config.attempt_timeout {
            Some(limit) => match timeout(limit, check()).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    debug!(
                        "{} check timed out after {:?} (attempt {}/{})",
                        what, limit, attempt, max_attempts
                    );
                    CheckOutcome::NotReady
                }
            },
            None => check().await,
        };

        match outcome {
            CheckOutcome::Ready(value) => {
                debug!("{} ready after {} attempt(s)", what, attempt);
                return PollOutcome::Ready(value);
            }
            CheckOutcome::Error(message) => {
                warn!("{} check failed: {}", what, message);
                return PollOutcome::Error(message);
            }
            CheckOutcome::NotReady => {
                if attempt < max_attempts {
                    debug!(
                        "{} not ready (attempt {}/{}), retrying in {:?}",
                        what, attempt, max_attempts, config.interval
                    );
                    sleep(config.interval).await;
                }
            }
        }
    }

    PollOutcome::Exhausted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_ready_short_circuits_after_n_attempts() {
        let calls = AtomicU32::new(0);
        let config = PollConfig::new(5, Duration::from_secs(1));

        let outcome = poll(&config, "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n >= 3 {
                    CheckOutcome::Ready(n)
                } else {
                    CheckOutcome::NotReady
                }
            }
        })
        .await;

        assert_eq!(outcome, PollOutcome::Ready(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_after_exactly_max_attempts() {
        let calls = AtomicU32::new(0);
        let config = PollConfig::new(2, Duration::from_secs(1));

        let outcome: PollOutcome<()> = poll(&config, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { CheckOutcome::NotReady }
        })
        .await;

        assert_eq!(outcome, PollOutcome::Exhausted);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_stops_immediately_without_sleeping() {
        let calls = AtomicU32::new(0);
        let config = PollConfig::new(10, Duration::from_secs(60));
        let start = tokio::time::Instant::now();

        let outcome: PollOutcome<()> = poll(&config, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { CheckOutcome::Error("bad credentials".to_string()) }
        })
        .await;

        assert_eq!(outcome, PollOutcome::Error("bad credentials".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_counts_as_not_ready() {
        let calls = AtomicU32::new(0);
        let config =
            PollConfig::new(2, Duration::from_secs(1)).with_attempt_timeout(Duration::from_secs(2));

        let outcome: PollOutcome<()> = poll(&config, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending()
        })
        .await;

        assert_eq!(outcome, PollOutcome::Exhausted);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_checks_once() {
        let calls = AtomicU32::new(0);
        let config = PollConfig::new(0, Duration::from_secs(1));

        let outcome = poll(&config, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { CheckOutcome::Ready(()) }
        })
        .await;

        assert!(outcome.is_ready());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
