//! Markdown and JSON report generation.
//!
//! This module renders a pipeline snapshot into a triage brief.

use crate::models::{
    DisplayedSummary, Field, Group, GroupState, IndicatorSnapshot, Report, ReportMetadata,
    ResultRecord, Snapshot, NO_SUMMARY,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let snapshot = &report.snapshot;
    let mut output = String::new();

    output.push_str("# Threat Brief\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_final_summary_section(snapshot.final_summary.as_deref()));
    output.push_str(&generate_error_section(snapshot));
    output.push_str(&generate_indicators_section(&snapshot.indicators));
    output.push_str(&generate_displayed_summary_section(
        snapshot.displayed_summary.as_ref(),
    ));
    output.push_str(&generate_record_section(
        "Reputation Scan",
        snapshot.scan.as_ref(),
    ));
    output.push_str(&generate_record_section(
        "DNS Reputation",
        snapshot.dns.as_ref(),
    ));
    output.push_str(&generate_record_section("File Upload", snapshot.upload.as_ref()));
    output.push_str(&generate_status_section(snapshot));

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Backend:** {}\n", metadata.backend_url));
    section.push_str(&format!(
        "- **Requests Issued:** {}\n",
        metadata.stats.issued
    ));
    if metadata.stats.discarded > 0 {
        section.push_str(&format!(
            "- **Stale Responses Discarded:** {}\n",
            metadata.stats.discarded
        ));
    }
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_final_summary_section(final_summary: Option<&str>) -> String {
    let mut section = String::new();

    section.push_str("## Final Summary\n\n");
    match final_summary {
        Some(summary) => section.push_str(summary),
        None => section.push_str("*Not available yet.*"),
    }
    section.push_str("\n\n");

    section
}

fn generate_error_section(snapshot: &Snapshot) -> String {
    if snapshot.error.is_none() && snapshot.errors_by_group.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Errors\n\n");

    if let Some(ref error) = snapshot.error {
        section.push_str(&format!("> ⚠️ {}\n\n", error));
    }

    for (group, message) in &snapshot.errors_by_group {
        section.push_str(&format!("- **{}:** {}\n", group, message));
    }
    if !snapshot.errors_by_group.is_empty() {
        section.push('\n');
    }

    section
}

fn generate_indicators_section(indicators: &IndicatorSnapshot) -> String {
    let mut section = String::new();

    section.push_str("## Indicators\n\n");
    section.push_str("| Indicator | Value |\n");
    section.push_str("|:---|:---|\n");

    for field in Field::ALL {
        let value = indicators.get(field);
        if !value.is_empty() {
            section.push_str(&format!("| {} | `{}` |\n", field, value.replace('|', "\\|")));
        }
    }

    if let Some(ref name) = indicators.file_name {
        section.push_str(&format!(
            "| file | `{}` ({} bytes) |\n",
            name,
            indicators.file_size.unwrap_or(0)
        ));
    }
    section.push('\n');

    section
}

fn generate_displayed_summary_section(displayed: Option<&DisplayedSummary>) -> String {
    let Some(displayed) = displayed else {
        return String::new();
    };

    format!(
        "## Summary\n\n*Source: {}*\n\n{}\n\n",
        displayed.source, displayed.text
    )
}

fn generate_record_section(title: &str, record: Option<&ResultRecord>) -> String {
    let Some(record) = record else {
        return String::new();
    };

    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));
    section.push_str(&format!("**Summary:** {}\n\n", record.display_summary()));

    if let Some(ref error) = record.error {
        section.push_str(&format!("**Reported error:** {}\n\n", error));
    }

    let raw = record.raw_pretty();
    if !raw.is_empty() {
        section.push_str("<details>\n<summary>Raw result</summary>\n\n```json\n");
        section.push_str(&raw);
        section.push_str("\n```\n</details>\n\n");
    }

    section
}

fn generate_status_section(snapshot: &Snapshot) -> String {
    let mut section = String::new();

    section.push_str("## Request Status\n\n");
    section.push_str("| Group | State |\n");
    section.push_str("|:---|:---:|\n");

    for group in Group::ALL {
        let state = snapshot.groups.get(&group).copied().unwrap_or_default();
        section.push_str(&format!("| {} | {} |\n", group, state_badge(state)));
    }
    section.push('\n');

    section
}

fn state_badge(state: GroupState) -> &'static str {
    match state {
        GroupState::Idle => "⚪ idle",
        GroupState::Pending => "⏳ pending",
        GroupState::Succeeded => "🟢 succeeded",
        GroupState::Failed => "🔴 failed",
    }
}

/// One-line status for interactive mode.
pub fn status_line(snapshot: &Snapshot) -> String {
    let final_summary = snapshot.final_summary.as_deref().unwrap_or(NO_SUMMARY);
    match snapshot.error {
        Some(ref error) => format!("final: {} | error: {}", final_summary, error),
        None => format!("final: {}", final_summary),
    }
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PipelineStats, SummarySource};
    use chrono::Utc;
    use serde_json::json;

    fn create_test_report() -> Report {
        let metadata = ReportMetadata {
            generated_at: Utc::now(),
            backend_url: "http://localhost:8000".to_string(),
            duration_seconds: 2.5,
            stats: PipelineStats {
                issued: 4,
                applied: 3,
                discarded: 1,
            },
        };

        let mut snapshot = Snapshot {
            indicators: IndicatorSnapshot {
                hash: "abc123".to_string(),
                domain: "example.com".to_string(),
                file_name: Some("invoice.pdf".to_string()),
                file_size: Some(1024),
                ..Default::default()
            },
            displayed_summary: Some(DisplayedSummary {
                source: SummarySource::UploadMetadata,
                text: "PDF document".to_string(),
            }),
            scan: Some(ResultRecord::new(
                json!({"malicious": 0}),
                Some("clean".to_string()),
                None,
            )),
            final_summary: Some("Low risk overall".to_string()),
            error: Some("Error fetching DNS reputation: transport error: timeout".to_string()),
            ..Default::default()
        };
        snapshot.errors_by_group.insert(
            Group::Dns,
            "Error fetching DNS reputation: transport error: timeout".to_string(),
        );
        snapshot.groups.insert(Group::Scan, GroupState::Succeeded);
        snapshot.groups.insert(Group::Dns, GroupState::Failed);

        Report { metadata, snapshot }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Threat Brief"));
        assert!(markdown.contains("## Final Summary\n\nLow risk overall"));
        assert!(markdown.contains("| hash | `abc123` |"));
        assert!(markdown.contains("`invoice.pdf` (1024 bytes)"));
        assert!(markdown.contains("*Source: upload metadata*"));
        assert!(markdown.contains("## Reputation Scan"));
        assert!(markdown.contains("**Summary:** clean"));
        assert!(markdown.contains("Stale Responses Discarded:** 1"));
        assert!(markdown.contains("| DNS reputation | 🔴 failed |"));
        assert!(markdown.contains("| file upload | ⚪ idle |"));
        assert!(!markdown.contains("## DNS Reputation"));
    }

    #[test]
    fn test_final_summary_placeholder() {
        let section = generate_final_summary_section(None);
        assert!(section.contains("Not available yet"));
    }

    #[test]
    fn test_error_section_omitted_without_errors() {
        assert_eq!(generate_error_section(&Snapshot::default()), "");
    }

    #[test]
    fn test_record_section_without_summary() {
        let record = ResultRecord::new(serde_json::Value::Null, None, Some("partial".into()));
        let section = generate_record_section("DNS Reputation", Some(&record));

        assert!(section.contains(NO_SUMMARY));
        assert!(section.contains("**Reported error:** partial"));
        assert!(!section.contains("Raw result"));
    }

    #[test]
    fn test_status_line() {
        let report = create_test_report();
        let line = status_line(&report.snapshot);
        assert!(line.starts_with("final: Low risk overall"));
        assert!(line.contains("error: Error fetching DNS reputation"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"backend_url\""));
        assert!(json.contains("\"final_summary\": \"Low risk overall\""));
        assert!(json.contains("\"upload_metadata\""));
        assert!(json.contains("\"dns\": \"failed\""));
    }
}
