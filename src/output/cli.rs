use super::{DefinitionSummary, FingerprintResult};
use crate::convergence::ConvergenceReport;
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct CandidateRow {
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Version")]
    version: String,
}

#[derive(Tabled)]
struct PassRow {
    #[tabled(rename = "Pass")]
    pass: usize,
    #[tabled(rename = "Processed")]
    processed: usize,
    #[tabled(rename = "Stored")]
    stored: usize,
    #[tabled(rename = "Marked")]
    marked: usize,
    #[tabled(rename = "Changed")]
    changed: String,
}

#[derive(Tabled)]
struct DefinitionRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Collector")]
    collector: String,
}

pub fn print_fingerprint_table(result: &FingerprintResult) -> Result<()> {
    println!();
    if result.candidates.is_empty() {
        println!("No generator fingerprint found for {}.", result.url);
        return Ok(());
    }

    println!(
        "{} candidate versions for {}:",
        result.candidates.len(),
        result.url
    );
    println!();

    let rows: Vec<CandidateRow> = result
        .candidates
        .iter()
        .map(|v| CandidateRow {
            package: truncate(&v.package.name, 40),
            version: truncate(&v.name, 30),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    Ok(())
}

pub fn print_report_table(report: &ConvergenceReport) -> Result<()> {
    println!();
    let rows: Vec<PassRow> = report
        .history
        .iter()
        .map(|p| PassRow {
            pass: p.pass,
            processed: p.versions_processed,
            stored: p.objects_stored,
            marked: p.versions_marked,
            changed: if p.changed { "yes" } else { "no" }.to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    println!();
    println!(
        "Converged after {} passes: {} objects stored, {} versions marked indexed.",
        report.passes, report.objects_stored, report.versions_marked
    );
    Ok(())
}

pub fn print_definitions_table(definitions: &[DefinitionSummary]) -> Result<()> {
    if definitions.is_empty() {
        println!("No definitions configured.");
        return Ok(());
    }

    let rows: Vec<DefinitionRow> = definitions
        .iter()
        .map(|d| DefinitionRow {
            name: d.name.clone(),
            provider: d.provider.clone(),
            collector: d.collector.clone(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
