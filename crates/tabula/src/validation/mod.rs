//! Validation passes that turn a sheet into a list of findings.

mod finding;
mod json_columns;
mod schedule;

pub use finding::{Finding, FindingCounts, FindingType, Severity};
pub use json_columns::JsonColumnValidator;
pub use schedule::{is_next_day, ScheduleValidator, DEFAULT_START_ROW};

use crate::error::Result;
use crate::table::Table;

/// Message written to an empty results sheet.
pub const NO_ISSUES: &str = "No issues found.";

/// Trait for validators.
///
/// Missing columns are errors; everything wrong with the data itself is a finding.
pub trait Validator {
    /// Run validation and return findings in row order.
    fn validate(&self, table: &Table) -> Result<Vec<Finding>>;
}

/// Render findings as a results sheet.
pub fn results_table(name: &str, findings: &[Finding]) -> Table {
    if findings.is_empty() {
        return Table::from_rows(name, vec![vec![NO_ISSUES]]);
    }

    let mut rows = vec![vec![
        "Row".to_string(),
        "Type".to_string(),
        "Severity".to_string(),
        "Message".to_string(),
    ]];
    rows.extend(findings.iter().map(|f| {
        vec![
            f.row.to_string(),
            f.finding_type.code().to_string(),
            f.severity.code().to_string(),
            f.message.clone(),
        ]
    }));
    Table::new(name, rows)
}
