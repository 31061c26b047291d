//! Finding types produced by validation passes.

use serde::{Deserialize, Serialize};

/// Kind of issue a finding reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingType {
    /// `HH:MM` time whose minutes are not `00`.
    InvalidTimeUnit,
    /// Non-empty time that is not `HH:MM`.
    InvalidTimeFormat,
    /// Row does not start where the previous row of the same entity ended.
    TimeDiscontinuity,
    /// Cell in a `json` column that does not parse.
    InvalidJson,
}

impl FindingType {
    /// Wire/sheet form, e.g. `INVALID_TIME_UNIT`.
    pub fn code(&self) -> &'static str {
        match self {
            FindingType::InvalidTimeUnit => "INVALID_TIME_UNIT",
            FindingType::InvalidTimeFormat => "INVALID_TIME_FORMAT",
            FindingType::TimeDiscontinuity => "TIME_DISCONTINUITY",
            FindingType::InvalidJson => "INVALID_JSON",
        }
    }

    /// Get a human-readable label for the finding type.
    pub fn label(&self) -> &'static str {
        match self {
            FindingType::InvalidTimeUnit => "Invalid Time Unit",
            FindingType::InvalidTimeFormat => "Invalid Time Format",
            FindingType::TimeDiscontinuity => "Time Discontinuity",
            FindingType::InvalidJson => "Invalid JSON",
        }
    }
}

/// Severity level of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Suspicious, may be intentional.
    Warning,
    /// Definite issue that should be fixed.
    Error,
}

impl Severity {
    pub fn code(&self) -> &'static str {
        match self {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// One validation result. Findings are data, never errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// 1-based sheet row.
    pub row: usize,
    #[serde(rename = "type")]
    pub finding_type: FindingType,
    pub message: String,
    pub severity: Severity,
    /// Column the finding refers to, when it is about a single cell.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub column: Option<String>,
}

impl Finding {
    pub fn error(row: usize, finding_type: FindingType, message: impl Into<String>) -> Self {
        Self {
            row,
            finding_type,
            message: message.into(),
            severity: Severity::Error,
            column: None,
        }
    }

    pub fn warning(row: usize, finding_type: FindingType, message: impl Into<String>) -> Self {
        Self {
            row,
            finding_type,
            message: message.into(),
            severity: Severity::Warning,
            column: None,
        }
    }

    /// Attach the column name.
    pub fn in_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

/// Error and warning counts over a set of findings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FindingCounts {
    pub errors: usize,
    pub warnings: usize,
}

impl FindingCounts {
    pub fn of(findings: &[Finding]) -> Self {
        findings.iter().fold(Self::default(), |mut counts, f| {
            match f.severity {
                Severity::Error => counts.errors += 1,
                Severity::Warning => counts.warnings += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.errors + self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_like_the_results_sheet() {
        let finding = Finding::error(5, FindingType::InvalidTimeUnit, "minutes must be 00");
        let json = serde_json::to_value(&finding).unwrap();

        assert_eq!(json["type"], "INVALID_TIME_UNIT");
        assert_eq!(json["severity"], "ERROR");
        assert_eq!(json["row"], 5);
        assert!(json.get("column").is_none());
    }

    #[test]
    fn test_counts() {
        let findings = vec![
            Finding::error(4, FindingType::InvalidTimeFormat, "a"),
            Finding::warning(5, FindingType::TimeDiscontinuity, "b"),
            Finding::warning(6, FindingType::TimeDiscontinuity, "c"),
        ];
        let counts = FindingCounts::of(&findings);
        assert_eq!(counts.errors, 1);
        assert_eq!(counts.warnings, 2);
        assert_eq!(counts.total(), 3);
    }
}
