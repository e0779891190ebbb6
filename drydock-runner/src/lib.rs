//! Drydock Runner
//!
//! The pipeline engine: executes an ordered list of named stages over a
//! source checkout and always finishes with teardown, archiving, and a
//! notification.
//!
//! Architecture:
//! - Configuration: environment-driven settings for collaborators and limits
//! - Executor: one external process per step, captured output, bounded time
//! - Waiters: bounded-retry polling for the quality gate and service health
//! - Aggregation: scan-report parsing, severity tallies, artifact archiving
//! - Orchestrator: stage sequencing, failure policy, and the unconditional
//!   final phase
//!
//! The engine runs one pipeline per invocation on a single logical task;
//! stages and steps are strictly sequential.

pub mod artifact;
pub mod config;
pub mod context;
pub mod executor;
pub mod gate;
pub mod health;
pub mod loader;
pub mod notify;
pub mod orchestrator;
pub mod poll;
pub mod report;
