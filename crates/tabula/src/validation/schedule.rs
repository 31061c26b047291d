//! Schedule continuity and time-format checks.

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::table::{cell, Table};

use super::finding::{Finding, FindingType};
use super::Validator;

static HOUR_MINUTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]{2}):([0-9]{2})$").unwrap());

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Default first data row (0-based): header, description and type rows come first.
pub const DEFAULT_START_ROW: usize = 3;

/// Validates a character schedule sheet.
///
/// Each row with a `ScheduleID` must have an hour-aligned `StartTime`,
/// and must start where the previous row ended when both rows belong
/// to the same character. Midnight rollover (`24:00` on day D, then
/// `00:00` on D+1) counts as continuous.
#[derive(Debug, Clone)]
pub struct ScheduleValidator {
    start_row: usize,
}

impl ScheduleValidator {
    pub fn new(start_row: usize) -> Self {
        Self { start_row }
    }

    fn check_start_time(&self, row_number: usize, start_time: &str) -> Option<Finding> {
        if start_time.is_empty() {
            return None;
        }

        match HOUR_MINUTE.captures(start_time) {
            Some(caps) if &caps[2] != "00" => Some(
                Finding::error(
                    row_number,
                    FindingType::InvalidTimeUnit,
                    format!(
                        "Row {row_number}: StartTime \"{start_time}\" is not on the hour (minutes must be 00)"
                    ),
                )
                .in_column("StartTime"),
            ),
            Some(_) => None,
            None => Some(
                Finding::error(
                    row_number,
                    FindingType::InvalidTimeFormat,
                    format!(
                        "Row {row_number}: StartTime \"{start_time}\" is malformed (expected HH:MM)"
                    ),
                )
                .in_column("StartTime"),
            ),
        }
    }
}

impl Default for ScheduleValidator {
    fn default() -> Self {
        Self::new(DEFAULT_START_ROW)
    }
}

impl Validator for ScheduleValidator {
    fn validate(&self, table: &Table) -> Result<Vec<Finding>> {
        let header = table.header_index();
        let schedule_col = header.require("ScheduleID")?;
        let character_col = header.require("CharacterID")?;
        let start_date_col = header.require("StartDate")?;
        let start_time_col = header.require("StartTime")?;
        let end_date_col = header.require("EndDate")?;
        let end_time_col = header.require("EndTime")?;

        let mut findings = Vec::new();

        for i in self.start_row..table.rows.len() {
            let row = &table.rows[i];
            let row_number = i + 1;

            if cell(row, schedule_col).trim().is_empty() {
                continue;
            }

            let character = cell(row, character_col);
            let start_date = cell(row, start_date_col).trim();
            let start_time = cell(row, start_time_col).trim();

            if let Some(finding) = self.check_start_time(row_number, start_time) {
                findings.push(finding);
            }

            // Compared against the raw previous row, even a skipped one.
            if i > self.start_row {
                let prev = &table.rows[i - 1];
                if cell(prev, character_col) == character {
                    let prev_end_date = cell(prev, end_date_col).trim();
                    let prev_end_time = cell(prev, end_time_col).trim();

                    let continuous = (prev_end_date == start_date && prev_end_time == start_time)
                        || (is_next_day(prev_end_date, start_date)
                            && prev_end_time == "24:00"
                            && start_time == "00:00");

                    if !continuous {
                        findings.push(Finding::warning(
                            row_number,
                            FindingType::TimeDiscontinuity,
                            format!(
                                "Row {row_number}: previous schedule ends at ({prev_end_date} {prev_end_time}) but this one starts at ({start_date} {start_time})"
                            ),
                        ));
                    }
                }
            }
        }

        debug!(
            table = %table.name,
            findings = findings.len(),
            "schedule validated"
        );
        Ok(findings)
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value.trim(), fmt).ok())
}

/// Whether `next` is the calendar day after `day`.
pub fn is_next_day(day: &str, next: &str) -> bool {
    match (parse_date(day), parse_date(next)) {
        (Some(d), Some(n)) => d.checked_add_signed(Duration::days(1)) == Some(n),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Severity;

    const HEADER: [&str; 6] = [
        "ScheduleID",
        "CharacterID",
        "StartDate",
        "StartTime",
        "EndDate",
        "EndTime",
    ];

    fn schedule(rows: &[[&str; 6]]) -> Table {
        let mut all = vec![HEADER.to_vec(), vec![""; 6], vec![""; 6]];
        all.extend(rows.iter().map(|r| r.to_vec()));
        Table::from_rows("CharacterSchedule", all)
    }

    #[test]
    fn test_minute_granularity() {
        let table = schedule(&[
            ["1", "c1", "2024-01-01", "09:30", "2024-01-01", "10:00"],
            ["2", "c2", "2024-01-01", "09:00", "2024-01-01", "10:00"],
            ["3", "c3", "2024-01-01", "9:00", "2024-01-01", "10:00"],
        ]);

        let findings = ScheduleValidator::default().validate(&table).unwrap();
        assert_eq!(findings.len(), 2);

        assert_eq!(findings[0].row, 4);
        assert_eq!(findings[0].finding_type, FindingType::InvalidTimeUnit);
        assert_eq!(findings[0].severity, Severity::Error);

        assert_eq!(findings[1].row, 6);
        assert_eq!(findings[1].finding_type, FindingType::InvalidTimeFormat);
        assert_eq!(findings[1].severity, Severity::Error);
    }

    #[test]
    fn test_full_width_digits_are_malformed() {
        let table = schedule(&[["1", "c1", "2024-01-01", "０９:００", "2024-01-01", "10:00"]]);

        let findings = ScheduleValidator::default().validate(&table).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].finding_type, FindingType::InvalidTimeFormat);
    }

    #[test]
    fn test_midnight_rollover_is_continuous() {
        let table = schedule(&[
            ["1", "c1", "2024-01-01", "18:00", "2024-01-01", "24:00"],
            ["2", "c1", "2024-01-02", "00:00", "2024-01-02", "08:00"],
        ]);
        assert!(ScheduleValidator::default().validate(&table).unwrap().is_empty());
    }

    #[test]
    fn test_gap_is_a_warning() {
        let table = schedule(&[
            ["1", "c1", "2024-01-01", "12:00", "2024-01-01", "18:00"],
            ["2", "c1", "2024-01-01", "19:00", "2024-01-01", "20:00"],
        ]);

        let findings = ScheduleValidator::default().validate(&table).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].row, 5);
        assert_eq!(findings[0].finding_type, FindingType::TimeDiscontinuity);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_different_characters_are_not_compared() {
        let table = schedule(&[
            ["1", "c1", "2024-01-01", "12:00", "2024-01-01", "18:00"],
            ["2", "c2", "2024-01-01", "07:00", "2024-01-01", "20:00"],
        ]);
        assert!(ScheduleValidator::default().validate(&table).unwrap().is_empty());
    }

    #[test]
    fn test_blank_schedule_id_is_skipped() {
        let table = schedule(&[["", "c1", "2024-01-01", "09:45", "", ""]]);
        assert!(ScheduleValidator::default().validate(&table).unwrap().is_empty());
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let table = Table::from_rows("CharacterSchedule", vec![vec!["ScheduleID"]]);
        assert!(ScheduleValidator::default().validate(&table).is_err());
    }

    #[test]
    fn test_is_next_day() {
        assert!(is_next_day("2024-01-31", "2024-02-01"));
        assert!(is_next_day("2023-12-31", "2024-01-01"));
        assert!(is_next_day("2024/02/28", "2024/02/29"));
        assert!(is_next_day("2024.02.29", "2024.03.01"));
        assert!(!is_next_day("2024-01-01", "2024-01-03"));
        assert!(!is_next_day("yesterday", "2024-01-01"));
    }
}
