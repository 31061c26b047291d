//! Validate commands - schedule continuity and JSON cells.

use colored::Colorize;
use tabula::{Finding, Severity, ValidationReport, Workspace};

pub fn schedule(
    workspace: &Workspace,
    dry_run: bool,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = workspace.validate_schedule(dry_run)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report("Validated", &report);
    if !dry_run {
        println!();
        println!(
            "{} {}",
            "Results written to".green().bold(),
            workspace.config().schedule.results_sheet.white()
        );
    }
    Ok(())
}

pub fn json_columns(
    workspace: &Workspace,
    sheet: &str,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = workspace.validate_json(sheet)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report("Checked JSON columns of", &report);
    }

    if report.counts.errors > 0 {
        return Err(format!("{} invalid JSON cells in {}", report.counts.errors, sheet).into());
    }
    Ok(())
}

fn print_report(verb: &str, report: &ValidationReport) {
    println!("{} {}", verb.cyan().bold(), report.sheet.white());

    if report.is_clean() {
        println!("{}", "No issues found.".green());
        return;
    }

    println!(
        "Found {} findings ({} errors, {} warnings)",
        report.findings.len().to_string().white().bold(),
        report.counts.errors.to_string().red(),
        report.counts.warnings.to_string().yellow()
    );
    println!();
    for finding in &report.findings {
        println!("  {}", finding_line(finding));
    }
}

fn finding_line(finding: &Finding) -> String {
    let severity = match finding.severity {
        Severity::Error => finding.severity.code().red().bold(),
        Severity::Warning => finding.severity.code().yellow().bold(),
    };
    format!(
        "row {:>5}  {:7}  {:20}  {}",
        finding.row,
        severity,
        finding.finding_type.code(),
        finding.message
    )
}
