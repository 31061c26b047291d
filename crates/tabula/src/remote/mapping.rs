//! Which admin table each sheet syncs with, and how sheets travel as CSV.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, TabulaError};
use crate::table::{cell, Table};

/// First data row of the mapping sheet (header plus two description rows).
pub const MAPPING_DATA_START_ROW: usize = 3;

static LOWER_UPPER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());
static CAPS_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// `labAssets` -> `lab-assets`, `XMLParser` -> `xml-parser`, `My Sheet` -> `my-sheet`.
pub fn to_kebab_case(name: &str) -> String {
    let s = LOWER_UPPER.replace_all(name, "$1-$2");
    let s = CAPS_RUN.replace_all(&s, "$1-$2");
    let s = WHITESPACE.replace_all(&s, "-");
    s.to_lowercase()
}

/// Sync settings for one sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncTarget {
    pub table_name: String,
    /// Exact mode for pushes.
    pub push_exact: Option<bool>,
    /// Exact mode for pulls when the caller does not choose.
    pub pull_exact: Option<bool>,
    pub filters: Option<Value>,
}

impl SyncTarget {
    /// Target with no options, named by kebab-casing the sheet name.
    pub fn fallback(sheet: &str) -> Self {
        Self {
            table_name: to_kebab_case(sheet),
            ..Default::default()
        }
    }

    /// Exact mode for a pull: the caller's choice wins, otherwise `pullExact`.
    pub fn pull_exact_or(&self, requested: Option<bool>) -> Option<bool> {
        requested.or(self.pull_exact)
    }
}

/// Sheet name to sync target, read from the mapping sheet.
#[derive(Debug, Clone, Default)]
pub struct SheetMapping {
    targets: IndexMap<String, SyncTarget>,
}

impl SheetMapping {
    /// Parse a mapping sheet (`sheetName`, `tableName`, `pushExact`, `pullExact`, `filters`).
    ///
    /// A sheet without `sheetName` and `tableName` columns gives an empty
    /// mapping. Rows missing either value are skipped.
    pub fn from_table(table: &Table) -> Self {
        let header = table.header_index();
        let (Some(sheet_col), Some(table_col)) =
            (header.position("sheetName"), header.position("tableName"))
        else {
            warn!(sheet = %table.name, "mapping sheet missing sheetName/tableName columns, using kebab-case names");
            return Self::default();
        };
        let push_col = header.position("pushExact");
        let pull_col = header.position("pullExact");
        let filters_col = header.position("filters");

        let mut targets = IndexMap::new();
        for row in table.body(MAPPING_DATA_START_ROW) {
            let sheet = cell(row, sheet_col).trim();
            let table_name = cell(row, table_col).trim();
            if sheet.is_empty() || table_name.is_empty() {
                continue;
            }

            let flag = |col: Option<usize>| {
                col.map(|c| cell(row, c).trim())
                    .filter(|v| !v.is_empty())
                    .map(|v| v == "TRUE" || v == "true")
            };

            let filters = filters_col
                .map(|c| cell(row, c).trim())
                .filter(|v| !v.is_empty())
                .and_then(|raw| match serde_json::from_str::<Value>(raw) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!(sheet = %sheet, error = %e, "failed to parse filters, ignoring");
                        None
                    }
                });

            targets.insert(
                sheet.to_string(),
                SyncTarget {
                    table_name: table_name.to_string(),
                    push_exact: flag(push_col),
                    pull_exact: flag(pull_col),
                    filters,
                },
            );
        }

        Self { targets }
    }

    /// Mapped target, or the kebab-case fallback.
    pub fn target(&self, sheet: &str) -> SyncTarget {
        self.targets
            .get(sheet)
            .cloned()
            .unwrap_or_else(|| SyncTarget::fallback(sheet))
    }

    pub fn get(&self, sheet: &str) -> Option<&SyncTarget> {
        self.targets.get(sheet)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Render a sheet as CSV: comma separated, `\n` between rows, no trailing newline.
pub fn sheet_to_csv(table: &Table) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in &table.rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TabulaError::Config(format!("Failed to flush CSV for '{}': {}", table.name, e)))?;
    let mut csv = String::from_utf8(bytes)
        .map_err(|e| TabulaError::Config(format!("CSV for '{}' is not UTF-8: {}", table.name, e)))?;
    if csv.ends_with('\n') {
        csv.pop();
    }
    Ok(csv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case() {
        assert_eq!(to_kebab_case("labAssets"), "lab-assets");
        assert_eq!(to_kebab_case("MySheetName"), "my-sheet-name");
        assert_eq!(to_kebab_case("XMLParser"), "xml-parser");
        assert_eq!(to_kebab_case("global  config"), "global-config");
        assert_eq!(to_kebab_case("already-kebab"), "already-kebab");
    }

    fn mapping_sheet() -> Table {
        Table::from_rows(
            "#SheetMapping",
            vec![
                vec!["sheetName", "tableName", "pushExact", "pullExact", "filters"],
                vec!["desc", "desc", "desc", "desc", "desc"],
                vec!["string", "string", "bool", "bool", "json"],
                vec!["Characters", "characters", "TRUE", "false", r#"{"season": 2}"#],
                vec!["Spaces", "space-list", "", "", "{broken"],
                vec!["Orphan", "", "TRUE", "", ""],
            ],
        )
    }

    #[test]
    fn test_mapping_rows() {
        let mapping = SheetMapping::from_table(&mapping_sheet());
        assert_eq!(mapping.len(), 2);

        let characters = mapping.target("Characters");
        assert_eq!(characters.table_name, "characters");
        assert_eq!(characters.push_exact, Some(true));
        assert_eq!(characters.pull_exact, Some(false));
        assert_eq!(characters.filters.unwrap()["season"], 2);

        let spaces = mapping.target("Spaces");
        assert_eq!(spaces.push_exact, None);
        assert!(spaces.filters.is_none());

        assert_eq!(mapping.target("Orphan").table_name, "orphan");
        assert_eq!(mapping.target("labAssets").table_name, "lab-assets");
    }

    #[test]
    fn test_pull_exact_override() {
        let target = SyncTarget {
            table_name: "t".into(),
            push_exact: Some(true),
            pull_exact: Some(false),
            filters: None,
        };
        assert_eq!(target.pull_exact_or(None), Some(false));
        assert_eq!(target.pull_exact_or(Some(true)), Some(true));
    }

    #[test]
    fn test_mapping_without_required_columns() {
        let table = Table::from_rows("#SheetMapping", vec![vec!["sheet", "table"]]);
        assert!(SheetMapping::from_table(&table).is_empty());
    }

    #[test]
    fn test_sheet_to_csv_quotes_special_cells() {
        let table = Table::from_rows(
            "notes",
            vec![vec!["id", "text"], vec!["1", "a, b"], vec!["2", "say \"hi\"\nbye"]],
        );
        let csv = sheet_to_csv(&table).unwrap();
        assert_eq!(csv, "id,text\n1,\"a, b\"\n2,\"say \"\"hi\"\"\nbye\"");
    }
}
