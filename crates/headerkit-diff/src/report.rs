//! Diff report data structures.
//!
//! The report shape is a compatibility surface: other tooling depends on
//! these exact field names, so renames require a `SCHEMA_VERSION` bump.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Version written into every emitted report.
pub const SCHEMA_VERSION: &str = "1.0";

/// Whether a change would require recompiling/relinking dependent code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Breaking,
    NonBreaking,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Breaking => write!(f, "breaking"),
            Severity::NonBreaking => write!(f, "non_breaking"),
        }
    }
}

/// A single difference between the baseline and target headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Change category, e.g. `"function_signature_changed"`,
    /// `"struct_field_removed"`.
    pub kind: String,

    pub severity: Severity,

    /// Affected declaration name.
    pub name: String,

    /// Human-readable description of the change.
    pub detail: String,
}

impl DiffEntry {
    pub fn new(
        kind: impl Into<String>,
        severity: Severity,
        name: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            severity,
            name: name.into(),
            detail: detail.into(),
        }
    }
}

/// Entry counts by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub total: usize,
    pub breaking: usize,
    pub non_breaking: usize,
}

/// Complete diff report between two headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    pub schema_version: String,

    /// Baseline header path.
    pub baseline: String,

    /// Target header path.
    pub target: String,

    pub summary: DiffSummary,

    pub entries: Vec<DiffEntry>,
}

impl DiffReport {
    /// Build a report, computing the summary from the entries.
    pub fn new(
        baseline: impl Into<String>,
        target: impl Into<String>,
        entries: Vec<DiffEntry>,
    ) -> Self {
        let breaking = entries
            .iter()
            .filter(|e| e.severity == Severity::Breaking)
            .count();
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            baseline: baseline.into(),
            target: target.into(),
            summary: DiffSummary {
                total: entries.len(),
                breaking,
                non_breaking: entries.len() - breaking,
            },
            entries,
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> String {
        // Serialization of our own types cannot fail.
        serde_json::to_string_pretty(self).expect("diff report serialization")
    }

    /// Parse a report back from JSON, rejecting unknown schema versions.
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        let report: DiffReport = serde_json::from_str(json)?;
        if report.schema_version != SCHEMA_VERSION {
            return Err(ReportError::SchemaMismatch(report.schema_version));
        }
        Ok(report)
    }
}

/// Errors raised by consumers of serialized diff reports. The diff
/// engine itself always emits the current schema and cannot fail.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("unrecognized diff report schema version: {0}")]
    SchemaMismatch(String),

    #[error("malformed diff report: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let report = DiffReport::new(
            "old.h",
            "new.h",
            vec![
                DiffEntry::new("function_removed", Severity::Breaking, "f", "removed"),
                DiffEntry::new("function_added", Severity::NonBreaking, "g", "added"),
            ],
        );
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.breaking, 1);
        assert_eq!(report.summary.non_breaking, 1);
    }

    #[test]
    fn test_json_field_names() {
        let report = DiffReport::new(
            "old.h",
            "new.h",
            vec![DiffEntry::new(
                "typedef_changed",
                Severity::Breaking,
                "size_t",
                "underlying type changed",
            )],
        );
        let json: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(json["schema_version"], SCHEMA_VERSION);
        assert_eq!(json["baseline"], "old.h");
        assert_eq!(json["target"], "new.h");
        assert_eq!(json["summary"]["total"], 1);
        assert_eq!(json["entries"][0]["kind"], "typedef_changed");
        assert_eq!(json["entries"][0]["severity"], "breaking");
        assert_eq!(json["entries"][0]["name"], "size_t");
        assert!(json["entries"][0]["detail"].is_string());
    }

    #[test]
    fn test_from_json_round_trip() {
        let report = DiffReport::new("a.h", "b.h", vec![]);
        let parsed = DiffReport::from_json(&report.to_json()).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_schema_mismatch() {
        let mut report = DiffReport::new("a.h", "b.h", vec![]);
        report.schema_version = "9.9".to_string();
        let json = serde_json::to_string(&report).unwrap();
        assert!(matches!(
            DiffReport::from_json(&json),
            Err(ReportError::SchemaMismatch(v)) if v == "9.9"
        ));
    }
}
