//! Runner configuration
//!
//! Defines all configurable parameters for a pipeline run: the global
//! wall-clock budget, collaborator endpoints, waiter tuning, and the
//! archive layout.

use std::path::PathBuf;
use std::time::Duration;

/// Runner configuration
///
/// All timeouts and intervals are configurable to allow tuning for
/// different environments (fast local loops vs slow shared services).
#[derive(Debug, Clone)]
pub struct Config {
    /// Build number stamped on the run.
    pub build_number: u64,

    /// Wall-clock budget for the whole run, measured from start.
    pub global_timeout: Duration,

    /// Directory the stages run in (default working directory for steps).
    pub workspace: PathBuf,

    /// Directory that receives archived artifacts, the scan report tally,
    /// the run record, and the run log.
    pub archive_dir: PathBuf,

    /// Analysis service base URL. None disables the quality gate even for
    /// stages that request it.
    pub analysis_url: Option<String>,

    /// Convert a Failed gate verdict into a stage failure.
    pub gate_abort_on_failure: bool,

    /// Gate polling: attempts, interval (a bounded multi-minute window by
    /// default), and the bound on a single verdict request.
    pub gate_max_attempts: u32,
    pub gate_interval: Duration,
    pub gate_attempt_timeout: Duration,

    /// Health probe polling: attempts, interval, and per-probe timeout.
    pub health_max_attempts: u32,
    pub health_interval: Duration,
    pub health_probe_timeout: Duration,

    /// Notification webhook. None disables dispatch; the summary is still
    /// rendered and logged.
    pub notify_webhook: Option<String>,

    /// Delivery address included in the notification payload.
    pub notify_to: String,

    /// Name of the single deployed instance torn down in the final phase.
    /// None when the pipeline deploys nothing.
    pub deploy_instance: Option<String>,

    /// Container runtime binary used for teardown.
    pub container_runtime: String,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Every variable is optional; unset or unparseable values fall back
    /// to the defaults:
    /// - DRYDOCK_BUILD_NUMBER
    /// - DRYDOCK_GLOBAL_TIMEOUT (seconds)
    /// - DRYDOCK_WORKSPACE
    /// - DRYDOCK_ARCHIVE_DIR
    /// - DRYDOCK_ANALYSIS_URL
    /// - DRYDOCK_GATE_ABORT ("true" to fail stages on a failed verdict)
    /// - DRYDOCK_GATE_MAX_ATTEMPTS / DRYDOCK_GATE_INTERVAL (seconds)
    /// - DRYDOCK_GATE_ATTEMPT_TIMEOUT (seconds)
    /// - DRYDOCK_HEALTH_MAX_ATTEMPTS / DRYDOCK_HEALTH_INTERVAL (seconds)
    /// - DRYDOCK_NOTIFY_WEBHOOK / DRYDOCK_NOTIFY_TO
    /// - DRYDOCK_DEPLOY_INSTANCE / DRYDOCK_CONTAINER_RUNTIME
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            build_number: env_parse("DRYDOCK_BUILD_NUMBER", defaults.build_number),
            global_timeout: env_secs("DRYDOCK_GLOBAL_TIMEOUT", defaults.global_timeout),
            workspace: std::env::var("DRYDOCK_WORKSPACE")
                .map(PathBuf::from)
                .unwrap_or(defaults.workspace),
            archive_dir: std::env::var("DRYDOCK_ARCHIVE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.archive_dir),
            analysis_url: std::env::var("DRYDOCK_ANALYSIS_URL").ok(),
            gate_abort_on_failure: std::env::var("DRYDOCK_GATE_ABORT")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.gate_abort_on_failure),
            gate_max_attempts: env_parse("DRYDOCK_GATE_MAX_ATTEMPTS", defaults.gate_max_attempts),
            gate_interval: env_secs("DRYDOCK_GATE_INTERVAL", defaults.gate_interval),
            gate_attempt_timeout: env_secs(
                "DRYDOCK_GATE_ATTEMPT_TIMEOUT",
                defaults.gate_attempt_timeout,
            ),
            health_max_attempts: env_parse(
                "DRYDOCK_HEALTH_MAX_ATTEMPTS",
                defaults.health_max_attempts,
            ),
            health_interval: env_secs("DRYDOCK_HEALTH_INTERVAL", defaults.health_interval),
            health_probe_timeout: env_secs(
                "DRYDOCK_HEALTH_PROBE_TIMEOUT",
                defaults.health_probe_timeout,
            ),
            notify_webhook: std::env::var("DRYDOCK_NOTIFY_WEBHOOK").ok(),
            notify_to: std::env::var("DRYDOCK_NOTIFY_TO").unwrap_or(defaults.notify_to),
            deploy_instance: std::env::var("DRYDOCK_DEPLOY_INSTANCE")
                .ok()
                .or(defaults.deploy_instance),
            container_runtime: std::env::var("DRYDOCK_CONTAINER_RUNTIME")
                .unwrap_or(defaults.container_runtime),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.global_timeout.is_zero() {
            anyhow::bail!("global_timeout must be greater than 0");
        }

        if self.gate_max_attempts == 0 {
            anyhow::bail!("gate_max_attempts must be at least 1");
        }

        if self.health_max_attempts == 0 {
            anyhow::bail!("health_max_attempts must be at least 1");
        }

        if let Some(url) = &self.analysis_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("analysis_url must start with http:// or https://");
            }
        }

        if let Some(url) = &self.notify_webhook {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("notify_webhook must start with http:// or https://");
            }
            if self.notify_to.is_empty() {
                anyhow::bail!("notify_to cannot be empty when a webhook is configured");
            }
        }

        if let Some(instance) = &self.deploy_instance {
            if instance.is_empty() {
                anyhow::bail!("deploy_instance cannot be empty");
            }
            if self.container_runtime.is_empty() {
                anyhow::bail!("container_runtime cannot be empty");
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            build_number: 0,
            global_timeout: Duration::from_secs(3600),
            workspace: PathBuf::from("."),
            archive_dir: PathBuf::from("drydock-archive"),
            analysis_url: None,
            gate_abort_on_failure: false,
            gate_max_attempts: 30,
            gate_interval: Duration::from_secs(10),
            gate_attempt_timeout: Duration::from_secs(10),
            health_max_attempts: 10,
            health_interval: Duration::from_secs(5),
            health_probe_timeout: Duration::from_secs(2),
            notify_webhook: None,
            notify_to: "ops@localhost".to_string(),
            deploy_instance: Some("drydock-app".to_string()),
            container_runtime: "podman".to_string(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, fallback: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(fallback)
}

fn env_secs(name: &str, fallback: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gate_max_attempts, 30);
        assert_eq!(config.health_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = Config::default();
        config.gate_max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.health_max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_urls_rejected() {
        let mut config = Config::default();
        config.analysis_url = Some("not-a-url".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.notify_webhook = Some("ftp://hooks.example".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_webhook_requires_recipient() {
        let mut config = Config::default();
        config.notify_webhook = Some("https://hooks.example/notify".to_string());
        config.notify_to = String::new();
        assert!(config.validate().is_err());
    }
}
