mod cli;
mod json;

pub use cli::{print_definitions_table, print_fingerprint_table, print_report_table};
pub use json::print_json;

use crate::convergence::ConvergenceReport;
use crate::model::SoftwareVersion;
use anyhow::Result;
use serde::Serialize;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON format for programmatic use
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use 'table' or 'json'", s)),
        }
    }
}

/// Candidate versions found for one URL.
#[derive(Debug, Serialize)]
pub struct FingerprintResult {
    pub url: String,
    pub candidates: Vec<SoftwareVersion>,
}

impl FingerprintResult {
    pub fn new(url: impl Into<String>, candidates: impl IntoIterator<Item = SoftwareVersion>) -> Self {
        let mut candidates: Vec<_> = candidates.into_iter().collect();
        candidates.sort();
        Self {
            url: url.into(),
            candidates,
        }
    }
}

/// One row of the definition listing.
#[derive(Debug, Serialize)]
pub struct DefinitionSummary {
    pub name: String,
    pub provider: String,
    pub collector: String,
}

pub fn print_fingerprint(result: &FingerprintResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_fingerprint_table(result),
        OutputFormat::Json => print_json(result),
    }
}

pub fn print_report(report: &ConvergenceReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_report_table(report),
        OutputFormat::Json => print_json(report),
    }
}

pub fn print_definitions(definitions: &[DefinitionSummary], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_definitions_table(definitions),
        OutputFormat::Json => print_json(definitions),
    }
}
