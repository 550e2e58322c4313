// file: src/exporter.rs
// description: json report export for completed analysis runs

use crate::error::Result;
use crate::models::{Finding, RiskSummary};
use crate::pipeline::AnalysisOutcome;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub document: String,
    pub category: String,
    pub summary: RiskSummary,
    pub findings: Vec<Finding>,
    pub exported_at: String,
    pub tool_version: String,
}

impl AnalysisReport {
    pub fn from_outcome(document: impl Into<String>, outcome: &AnalysisOutcome) -> Self {
        Self {
            document: document.into(),
            category: outcome.category.clone(),
            summary: outcome.summary,
            findings: outcome.findings.clone(),
            exported_at: Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonExporter {
    pretty: bool,
}

impl JsonExporter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn write_report(&self, report: &AnalysisReport, output: &Path) -> Result<PathBuf> {
        if let Some(parent) = output.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let body = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };

        fs::write(output, body)?;
        info!(
            "Exported report with {} findings to {}",
            report.findings.len(),
            output.display()
        );
        Ok(output.to_path_buf())
    }
}
