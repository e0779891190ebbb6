//! Run log domain types

use serde::{Deserialize, Serialize};

/// A log entry captured during a pipeline run
///
/// Entries are attributed to the stage that produced them so the archived
/// run log reads like the stage table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: LogLevel,
    pub stage: Option<String>,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, stage: Option<String>, message: String) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            level,
            stage,
            message,
        }
    }

    /// One line of the archived run log.
    pub fn render(&self) -> String {
        match &self.stage {
            Some(stage) => format!(
                "{} [{}] [{}] {}",
                self.timestamp.to_rfc3339(),
                self.level.as_str(),
                stage,
                self.message
            ),
            None => format!(
                "{} [{}] {}",
                self.timestamp.to_rfc3339(),
                self.level.as_str(),
                self.message
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_stage_attribution() {
        let entry = LogEntry::new(
            LogLevel::Warning,
            Some("deploy".to_string()),
            "instance not reachable".to_string(),
        );
        let line = entry.render();
        assert!(line.contains("[WARN]"));
        assert!(line.contains("[deploy]"));
        assert!(line.ends_with("instance not reachable"));
    }

    #[test]
    fn test_render_without_stage() {
        let entry = LogEntry::new(LogLevel::Info, None, "starting".to_string());
        assert!(!entry.render().contains("[]"));
    }
}
