pub mod comment;
pub mod json;
pub mod manifest;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::AnalysisReport;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown analysis comment.
    Comment,
    /// `action-security.yml` permission manifest.
    Manifest,
    Json,
}

impl OutputFormat {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "comment" | "markdown" | "md" => Some(Self::Comment),
            "manifest" | "yaml" | "yml" => Some(Self::Manifest),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Render a report into the specified format.
pub fn render(report: &AnalysisReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Comment => Ok(comment::render(&report.result)),
        OutputFormat::Manifest => Ok(manifest::render(&report.result)),
        OutputFormat::Json => json::render(report),
    }
}
