use crate::error::Result;
use crate::AnalysisReport;

use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    tool_version: &'static str,
    #[serde(flatten)]
    report: &'a AnalysisReport,
}

/// Render the report, including the full analysis result, as JSON.
pub fn render(report: &AnalysisReport) -> Result<String> {
    let json = serde_json::to_string_pretty(&JsonReport {
        tool_version: env!("CARGO_PKG_VERSION"),
        report,
    })?;
    Ok(json)
}
