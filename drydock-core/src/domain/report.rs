//! Scan report domain types
//!
//! Findings come from external scan tooling as severity-tagged records.
//! The fixed severity buckets are always reported, zero-valued when empty;
//! labels the tooling invents land in the Other bucket instead of failing
//! the aggregation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Risk level of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
    Informational,
    /// Catch-all for severity labels outside the fixed set.
    Other,
}

impl Severity {
    /// Fixed buckets every tally reports, in display order.
    pub const FIXED: [Severity; 4] = [
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Informational,
    ];

    /// Maps a raw severity label from a scan report.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Severity::High,
            "medium" => Severity::Medium,
            "low" => Severity::Low,
            "informational" | "info" => Severity::Informational,
            _ => Severity::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Informational => "Informational",
            Severity::Other => "Other",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding from a scan report
///
/// Extra fields in the source document are ignored; only the severity is
/// required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub severity: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Parsed scan report: ordered findings, read-only once parsed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub findings: Vec<Finding>,
}

/// Counts of findings per severity bucket
///
/// All fixed buckets are present from construction, so an empty report
/// still tallies as explicit zeros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityTally {
    counts: BTreeMap<Severity, u64>,
}

impl SeverityTally {
    pub fn new() -> Self {
        let mut counts = BTreeMap::new();
        for severity in Severity::FIXED {
            counts.insert(severity, 0);
        }
        Self { counts }
    }

    pub fn record(&mut self, severity: Severity) {
        *self.counts.entry(severity).or_insert(0) += 1;
    }

    pub fn count(&self, severity: Severity) -> u64 {
        self.counts.get(&severity).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

impl Default for SeverityTally {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SeverityTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, severity) in Severity::FIXED.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", severity, self.count(*severity))?;
        }
        let other = self.count(Severity::Other);
        if other > 0 {
            write!(f, " Other={}", other)?;
        }
        Ok(())
    }
}
