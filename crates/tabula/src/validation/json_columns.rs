//! Parse checks for cells in columns typed `json`.

use tracing::debug;

use crate::error::Result;
use crate::table::{cell, Table};

use super::finding::{Finding, FindingType};
use super::Validator;

/// Row holding column type annotations (0-based).
pub const TYPE_ROW: usize = 2;

/// First data row (0-based).
pub const DATA_START_ROW: usize = 3;

const SNIPPET_CHARS: usize = 50;

/// Checks that every non-empty cell of a `json`-typed column parses.
#[derive(Debug, Clone, Default)]
pub struct JsonColumnValidator;

impl JsonColumnValidator {
    /// Positions of columns whose type annotation is `json`.
    pub fn json_columns(table: &Table) -> Vec<usize> {
        table
            .rows
            .get(TYPE_ROW)
            .map(|types| {
                types
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.trim().eq_ignore_ascii_case("json"))
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Validator for JsonColumnValidator {
    fn validate(&self, table: &Table) -> Result<Vec<Finding>> {
        let columns = Self::json_columns(table);
        let mut findings = Vec::new();
        if columns.is_empty() {
            return Ok(findings);
        }

        let header = table.header();
        for (i, row) in table.rows.iter().enumerate().skip(DATA_START_ROW) {
            let row_number = i + 1;
            for &col in &columns {
                let value = cell(row, col);
                if value.trim().is_empty() {
                    continue;
                }

                let Err(err) = serde_json::from_str::<serde_json::Value>(value) else {
                    continue;
                };

                let column = header.get(col).map(|h| h.trim()).unwrap_or_default();
                let snippet = snippet_before(value, err.line(), err.column());
                let message = if snippet.is_empty() {
                    format!("Row {row_number}, column '{column}': JSON parse error: {err}")
                } else {
                    format!(
                        "Row {row_number}, column '{column}': JSON parse error: {err} after '{snippet}'"
                    )
                };

                findings.push(
                    Finding::error(row_number, FindingType::InvalidJson, message).in_column(column),
                );
            }
        }

        debug!(
            table = %table.name,
            columns = columns.len(),
            findings = findings.len(),
            "json columns validated"
        );
        Ok(findings)
    }
}

/// Up to 50 characters preceding a 1-based line/column error position,
/// with newlines flattened to spaces.
fn snippet_before(text: &str, line: usize, column: usize) -> String {
    if line == 0 {
        return String::new();
    }

    let line_start: usize = text
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    let mut pos = (line_start + column).min(text.len());
    while !text.is_char_boundary(pos) {
        pos -= 1;
    }

    let before = &text[..pos];
    let skip = before.chars().count().saturating_sub(SNIPPET_CHARS);
    before
        .chars()
        .skip(skip)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(cells: &[&str]) -> Table {
        let mut rows = vec![
            vec!["id", "payload", "note"],
            vec!["", "", ""],
            vec!["string", "JSON", "string"],
        ];
        for c in cells {
            rows.push(vec!["x", c, "{not json"]);
        }
        Table::from_rows("rewards", rows)
    }

    #[test]
    fn test_only_json_columns_are_checked() {
        let table = sheet(&[r#"{"gold": 10}"#, "", "[1, 2]"]);
        let findings = JsonColumnValidator.validate(&table).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_invalid_cell_is_reported() {
        let table = sheet(&[r#"{"gold": 10}"#, r#"{"gold": 10,}"#]);
        let findings = JsonColumnValidator.validate(&table).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].row, 5);
        assert_eq!(findings[0].finding_type, FindingType::InvalidJson);
        assert_eq!(findings[0].column.as_deref(), Some("payload"));
        assert!(findings[0].message.contains("after '{\"gold\": 10,"));
    }

    #[test]
    fn test_no_type_row() {
        let table = Table::from_rows("t", vec![vec!["id"]]);
        assert!(JsonColumnValidator.validate(&table).unwrap().is_empty());
    }

    #[test]
    fn test_snippet_is_bounded() {
        let text = format!("{}\n{}", "a".repeat(10), "b".repeat(60));
        let snippet = snippet_before(&text, 2, 60);
        assert_eq!(snippet.chars().count(), 50);
        assert!(snippet.chars().all(|c| c == 'b'));

        assert_eq!(snippet_before("ab\ncd", 2, 1), "ab c");
    }
}
