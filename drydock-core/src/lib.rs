//! Drydock Core
//!
//! Core types for the Drydock deployment/validation pipeline.
//!
//! This crate contains:
//! - Run types: one pipeline execution and its per-stage results
//! - Configuration types: the immutable stage list a run executes
//! - Report types: severity-tagged scan findings and their tallies
//! - Artifact types: resolved archive patterns
//!
//! Note: execution logic lives in the runner; this crate is structure only.

pub mod domain;
