//! Scan report aggregation
//!
//! Parses the severity-tagged findings document produced by the scan
//! tooling and reduces it to counts per severity bucket. The parsing
//! contract is deliberately narrow: a top-level array of findings, or an
//! object wrapping a `findings` array. Everything else is a ParseError
//! the caller tolerates and logs; aggregation never crashes a run.

use serde_json::Value;
use std::path::Path;
use thiserror::Error;

use drydock_core::domain::report::{Finding, ScanReport, Severity, SeverityTally};

/// Scan report parse failure. Always tolerated by callers.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read report {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("report is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognized report structure: expected a findings array")]
    Structure,
}

/// Reads and parses a findings document from disk
pub fn parse_file(path: &Path) -> Result<ScanReport, ParseError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse(&raw)
}

/// Parses a findings document
pub fn parse(raw: &str) -> Result<ScanReport, ParseError> {
    let value: Value = serde_json::from_str(raw)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("findings") {
            Some(Value::Array(items)) => items,
            _ => return Err(ParseError::Structure),
        },
        _ => return Err(ParseError::Structure),
    };

    let findings = items
        .into_iter()
        .map(serde_json::from_value::<Finding>)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ScanReport { findings })
}

/// Counts findings per severity bucket
///
/// Unrecognized severity labels land in Other rather than failing.
pub fn tally(report: &ScanReport) -> SeverityTally {
    let mut tally = SeverityTally::new();
    for finding in &report.findings {
        tally.record(Severity::from_label(&finding.severity));
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_top_level_array() {
        let report = parse(
            r#"[
                {"severity": "High", "description": "sql injection", "location": "api/users"},
                {"severity": "Low", "description": "verbose header"}
            ]"#,
        )
        .unwrap();
        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.findings[0].location.as_deref(), Some("api/users"));
    }

    #[test]
    fn test_parse_wrapped_findings() {
        let report = parse(r#"{"tool": "scanner", "findings": [{"severity": "Medium"}]}"#).unwrap();
        assert_eq!(report.findings.len(), 1);
    }

    #[test]
    fn test_unrecognized_structure_is_parse_error() {
        assert!(matches!(parse(r#"{"results": []}"#), Err(ParseError::Structure)));
        assert!(matches!(parse(r#""just a string""#), Err(ParseError::Structure)));
        assert!(matches!(parse("not json at all"), Err(ParseError::Json(_))));
    }

    #[test]
    fn test_finding_without_severity_is_rejected() {
        assert!(parse(r#"[{"description": "no severity"}]"#).is_err());
    }

    #[test]
    fn test_tally_counts_per_bucket() {
        let report = parse(
            r#"[
                {"severity": "High"},
                {"severity": "high"},
                {"severity": "Low"}
            ]"#,
        )
        .unwrap();

        let tally = tally(&report);
        assert_eq!(tally.count(Severity::High), 2);
        assert_eq!(tally.count(Severity::Medium), 0);
        assert_eq!(tally.count(Severity::Low), 1);
        assert_eq!(tally.count(Severity::Informational), 0);
    }

    #[test]
    fn test_tally_empty_report_is_all_zeros() {
        let tally = tally(&ScanReport::default());
        assert_eq!(tally.total(), 0);
        for severity in Severity::FIXED {
            assert_eq!(tally.count(severity), 0);
        }
    }

    #[test]
    fn test_tally_unknown_severity_buckets_as_other() {
        let report = parse(r#"[{"severity": "Blocker"}]"#).unwrap();
        let tally = tally(&report);
        assert_eq!(tally.count(Severity::Other), 1);
        assert_eq!(tally.total(), 1);
    }
}
