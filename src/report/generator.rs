//! Review report generation.
//!
//! Wraps a finished review in run metadata and renders it as Markdown
//! or JSON.

use crate::cli::OutputFormat;
use crate::models::{ReportMetadata, ReviewReport};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &ReviewReport) -> String {
    let mut output = String::new();

    output.push_str("# Code Review Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_request_section(&report.metadata.request));
    output.push_str(&generate_review_section(&report.review));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Review Date:** {}\n",
        metadata.review_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    section.push_str(&format!("- **Model Rounds:** {}\n", metadata.rounds));
    section.push_str(&format!("- **Tool Calls:** {}\n", metadata.tool_calls));
    if let Some(ref reason) = metadata.finish_reason {
        section.push_str(&format!("- **Finish Reason:** {}\n", reason));
    }
    section.push_str(&format!(
        "- **Review Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_request_section(request: &str) -> String {
    let mut section = String::new();

    section.push_str("## Request\n\n");
    for line in request.lines() {
        section.push_str("> ");
        section.push_str(line);
        section.push('\n');
    }
    section.push('\n');

    section
}

/// The model writes Markdown already, so the review is embedded as-is.
fn generate_review_section(review: &str) -> String {
    let mut section = String::new();

    section.push_str("## Review\n\n");
    if review.trim().is_empty() {
        section.push_str("*The model returned an empty review.*\n\n");
    } else {
        section.push_str(review.trim_end());
        section.push_str("\n\n");
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by ai-cr*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &ReviewReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report")
}

/// Render the report in `format` and write it to `path`.
pub fn write_report(report: &ReviewReport, format: OutputFormat, path: &Path) -> Result<()> {
    let content = match format {
        OutputFormat::Markdown => generate_markdown_report(report),
        OutputFormat::Json => generate_json_report(report)?,
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn create_test_report() -> ReviewReport {
        ReviewReport {
            metadata: ReportMetadata {
                request: "Please review the file: main.go".to_string(),
                model_used: "deepseek-chat".to_string(),
                review_date: Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap(),
                rounds: 3,
                tool_calls: 2,
                finish_reason: Some("stop".to_string()),
                duration_seconds: 12.34,
            },
            review: "## Findings\n\n1. `handler` ignores the error from `Decode`.\n".to_string(),
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_report());

        assert!(markdown.starts_with("# Code Review Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Review Date:** 2026-03-01 12:30:00 UTC"));
        assert!(markdown.contains("`deepseek-chat`"));
        assert!(markdown.contains("- **Tool Calls:** 2"));
        assert!(markdown.contains("- **Review Duration:** 12.3s"));
        assert!(markdown.contains("> Please review the file: main.go"));
        assert!(markdown.contains("## Findings"));
    }

    #[test]
    fn test_empty_review_is_marked() {
        let mut report = create_test_report();
        report.review = "  \n".to_string();
        report.metadata.finish_reason = None;

        let markdown = generate_markdown_report(&report);
        assert!(markdown.contains("empty review"));
        assert!(!markdown.contains("Finish Reason"));
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["metadata"]["rounds"], 3);
        assert_eq!(value["metadata"]["model_used"], "deepseek-chat");
        assert!(value["review"].as_str().unwrap().contains("Findings"));
    }

    #[test]
    fn test_write_report() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("review.json");

        write_report(&create_test_report(), OutputFormat::Json, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"tool_calls\": 2"));

        let missing = temp_dir.path().join("no/such/dir/review.md");
        assert!(write_report(&create_test_report(), OutputFormat::Markdown, &missing).is_err());
    }
}
