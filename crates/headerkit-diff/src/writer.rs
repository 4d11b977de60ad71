//! Writer that compares headers against a baseline and renders reports.

use crate::engine::diff_headers;
use crate::report::{DiffEntry, DiffReport, Severity};
use headerkit_ir::{Header, HeaderWriter};

/// Output format for [`DiffWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffFormat {
    #[default]
    Json,
    Markdown,
}

/// Construction-time configuration for [`DiffWriter`].
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    /// Baseline to compare against. When absent, an empty header is
    /// used and every declaration reports as an addition.
    pub baseline: Option<Header>,

    pub format: DiffFormat,
}

/// Writer producing API-compatibility reports.
///
/// Like every writer this is infallible: it renders a report for any
/// structurally valid header pair.
pub struct DiffWriter {
    options: DiffOptions,
}

impl DiffWriter {
    pub fn new(options: DiffOptions) -> Self {
        Self { options }
    }

    /// Convenience constructor for a JSON diff against `baseline`.
    pub fn against(baseline: Header) -> Self {
        Self::new(DiffOptions {
            baseline: Some(baseline),
            format: DiffFormat::Json,
        })
    }
}

impl HeaderWriter for DiffWriter {
    fn name(&self) -> &str {
        "diff"
    }

    fn format_description(&self) -> &str {
        "API compatibility diff reports (JSON or Markdown)"
    }

    fn write(&self, header: &Header) -> String {
        let empty;
        let baseline = match &self.options.baseline {
            Some(b) => b,
            None => {
                empty = Header::empty("(empty)");
                &empty
            }
        };
        let report = diff_headers(baseline, header);
        match self.options.format {
            DiffFormat::Json => report.to_json(),
            DiffFormat::Markdown => render_markdown(&report),
        }
    }
}

/// Render a report as human-readable Markdown, grouped by severity and
/// change kind.
pub fn render_markdown(report: &DiffReport) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!(
        "# API Diff: {} -> {}",
        report.baseline, report.target
    ));
    lines.push(String::new());

    lines.push("## Summary".to_string());
    lines.push(String::new());
    lines.push("| Category | Count |".to_string());
    lines.push("|----------|-------|".to_string());
    lines.push(format!("| Breaking | {} |", report.summary.breaking));
    lines.push(format!("| Non-breaking | {} |", report.summary.non_breaking));
    lines.push(format!("| Total | {} |", report.summary.total));
    lines.push(String::new());

    let breaking: Vec<&DiffEntry> = report
        .entries
        .iter()
        .filter(|e| e.severity == Severity::Breaking)
        .collect();
    let non_breaking: Vec<&DiffEntry> = report
        .entries
        .iter()
        .filter(|e| e.severity == Severity::NonBreaking)
        .collect();

    if !breaking.is_empty() {
        render_section(&mut lines, "Breaking Changes", &breaking);
    }
    if !non_breaking.is_empty() {
        render_section(&mut lines, "Non-Breaking Changes", &non_breaking);
    }
    if breaking.is_empty() && non_breaking.is_empty() {
        lines.push("No changes detected.".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

fn render_section(lines: &mut Vec<String>, title: &str, entries: &[&DiffEntry]) {
    lines.push(format!("## {title}"));
    lines.push(String::new());

    // Entries arrive sorted; group consecutive runs of the same kind.
    let mut current_kind: Option<&str> = None;
    let mut by_kind: Vec<(&str, Vec<&DiffEntry>)> = Vec::new();
    for entry in entries {
        if current_kind != Some(entry.kind.as_str()) {
            current_kind = Some(entry.kind.as_str());
            by_kind.push((entry.kind.as_str(), Vec::new()));
        }
        by_kind.last_mut().expect("group exists").1.push(entry);
    }

    for (kind, kind_entries) in by_kind {
        lines.push(format!("### {kind}"));
        lines.push(String::new());
        for entry in kind_entries {
            lines.push(format!("- **{}**: {}", entry.name, entry.detail));
        }
        lines.push(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headerkit_ir::{Declaration, FunctionDecl, TypeExpr};

    fn sample_target() -> Header {
        Header::new(
            "new.h",
            vec![Declaration::Function(FunctionDecl::new(
                "connect",
                TypeExpr::base("int"),
                vec![],
            ))],
        )
    }

    #[test]
    fn test_no_baseline_reports_everything_added() {
        let writer = DiffWriter::new(DiffOptions::default());
        let output = writer.write(&sample_target());
        let report = DiffReport::from_json(&output).unwrap();
        assert_eq!(report.baseline, "(empty)");
        assert_eq!(report.summary.total, 1);
        assert_eq!(report.entries[0].kind, "function_added");
    }

    #[test]
    fn test_no_op_diff_yields_empty_entries() {
        let target = sample_target();
        let writer = DiffWriter::against(target.clone());
        let report = DiffReport::from_json(&writer.write(&target)).unwrap();
        assert!(report.entries.is_empty());
        assert_eq!(report.summary.total, 0);
    }

    #[test]
    fn test_markdown_output() {
        let writer = DiffWriter::new(DiffOptions {
            baseline: Some(Header::empty("old.h")),
            format: DiffFormat::Markdown,
        });
        let output = writer.write(&sample_target());
        assert!(output.starts_with("# API Diff: old.h -> new.h"));
        assert!(output.contains("| Non-breaking | 1 |"));
        assert!(output.contains("### function_added"));
        assert!(output.contains("- **connect**"));
    }

    #[test]
    fn test_markdown_no_changes() {
        let target = sample_target();
        let writer = DiffWriter::new(DiffOptions {
            baseline: Some(target.clone()),
            format: DiffFormat::Markdown,
        });
        assert!(writer.write(&target).contains("No changes detected."));
    }
}
