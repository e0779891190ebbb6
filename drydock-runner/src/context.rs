//! Run context
//!
//! State shared across one pipeline run:
//! - Run identity (the id the analysis service reports verdicts under)
//! - Workspace and archive layout
//! - Buffered run log, flushed into the archive during the final phase

use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

use drydock_core::domain::log::{LogEntry, LogLevel};

/// Execution context for a pipeline run
pub struct RunContext {
    /// Run identifier shared with the analysis service.
    pub run_id: Uuid,

    /// Directory stages execute in by default.
    pub workspace: PathBuf,

    /// Archive directory for this run.
    pub archive_dir: PathBuf,

    /// Buffered log entries.
    log_buffer: Mutex<Vec<LogEntry>>,

    /// Stage currently executing, for log attribution.
    current_stage: Mutex<Option<String>>,
}

impl RunContext {
    pub fn new(run_id: Uuid, workspace: PathBuf, archive_dir: PathBuf) -> Self {
        Self {
            run_id,
            workspace,
            archive_dir,
            log_buffer: Mutex::new(Vec::new()),
            current_stage: Mutex::new(None),
        }
    }

    /// Marks `name` as the stage subsequent entries are attributed to.
    pub fn enter_stage(&self, name: &str) {
        *self.current_stage.lock().unwrap() = Some(name.to_string());
    }

    /// Clears the stage attribution.
    pub fn leave_stage(&self) {
        *self.current_stage.lock().unwrap() = None;
    }

    /// Adds a log entry stamped with the current stage.
    pub fn add_log(&self, level: LogLevel, message: String) {
        let stage = self.current_stage.lock().unwrap().clone();
        let mut buffer = self.log_buffer.lock().unwrap();
        buffer.push(LogEntry::new(level, stage, message));
    }

    pub fn log_info(&self, message: String) {
        self.add_log(LogLevel::Info, message);
    }

    pub fn log_warning(&self, message: String) {
        self.add_log(LogLevel::Warning, message);
    }

    pub fn log_error(&self, message: String) {
        self.add_log(LogLevel::Error, message);
    }

    /// Drains and returns all buffered entries.
    pub fn drain_logs(&self) -> Vec<LogEntry> {
        let mut buffer = self.log_buffer.lock().unwrap();
        buffer.drain(..).collect()
    }

    /// Writes the buffered log to `pipeline.log` in the archive, draining
    /// the buffer.
    pub fn flush_to_archive(&self) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.archive_dir)?;
        let path = self.archive_dir.join("pipeline.log");

        let mut contents = String::new();
        for entry in self.drain_logs() {
            contents.push_str(&entry.render());
            contents.push('\n');
        }

        std::fs::write(&path, contents)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_context() -> RunContext {
        RunContext::new(
            Uuid::new_v4(),
            PathBuf::from("/tmp"),
            PathBuf::from("/tmp/archive"),
        )
    }

    #[test]
    fn test_entries_attributed_to_current_stage() {
        let context = test_context();

        context.log_info("before any stage".to_string());
        context.enter_stage("build");
        context.log_error("compile failed".to_string());
        context.leave_stage();
        context.log_info("after".to_string());

        let entries = context.drain_logs();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].stage.is_none());
        assert_eq!(entries[1].stage.as_deref(), Some("build"));
        assert_eq!(entries[1].level, LogLevel::Error);
        assert!(entries[2].stage.is_none());
    }

    #[test]
    fn test_drain_empties_buffer() {
        let context = test_context();
        context.log_info("one".to_string());
        assert_eq!(context.drain_logs().len(), 1);
        assert!(context.drain_logs().is_empty());
    }

    #[test]
    fn test_flush_writes_rendered_lines() {
        let dir = tempfile::tempdir().unwrap();
        let context = RunContext::new(
            Uuid::new_v4(),
            dir.path().to_path_buf(),
            dir.path().join("archive"),
        );

        context.enter_stage("deploy");
        context.log_warning("service not reachable".to_string());

        let path = context.flush_to_archive().unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("[WARN] [deploy] service not reachable"));
    }
}
