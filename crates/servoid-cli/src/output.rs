//! Output formatting for CLI

use console::style;
use servoid_core::{Finding, Report};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Format a report based on selected format
pub fn format_report(report: &Report, format: &str) -> anyhow::Result<String> {
    match OutputFormat::from(format) {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Text => Ok(report
            .findings
            .iter()
            .map(render_line)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

fn render_line(finding: &Finding) -> String {
    let line = finding.to_string();
    match finding {
        Finding::ChannelNotFound { .. }
        | Finding::ChannelMissingId { .. }
        | Finding::UserMissingId { .. }
        | Finding::LookupFailed { .. }
        | Finding::VideoSettingsNotFound { .. }
        | Finding::DistributionStatus { .. } => style(line).red().to_string(),
        Finding::Offline => style(line).yellow().to_string(),
        _ => line,
    }
}
