//! In-memory sheet representation and header lookup.

use std::cmp::Ordering;

use indexmap::IndexMap;
use tracing::warn;

use crate::error::{Result, TabulaError};

/// A sheet as stored: every row, metadata rows included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Sheet name.
    pub name: String,
    /// Row data as strings (row-major order).
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table, padding rows so every row has the same width.
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        let mut table = Self {
            name: name.into(),
            rows,
        };
        table.normalize();
        table
    }

    /// Create an empty table.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Build a table from string slices. Handy for fixtures.
    pub fn from_rows<R, C>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        Self::new(name, rows)
    }

    /// Pad every row to the widest row.
    pub fn normalize(&mut self) {
        let width = self.width();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Number of rows, metadata included.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The first row, or an empty slice for an empty sheet.
    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows after the first `metadata_rows` rows.
    pub fn body(&self, metadata_rows: usize) -> &[Vec<String>] {
        self.rows.get(metadata_rows..).unwrap_or(&[])
    }

    /// Build a header index over the first row.
    pub fn header_index(&self) -> HeaderIndex {
        HeaderIndex::new(&self.name, self.header())
    }

    /// Split into header and body, skipping `metadata_rows` leading rows.
    pub fn to_reference(&self, metadata_rows: usize) -> ReferenceTable {
        ReferenceTable {
            name: self.name.clone(),
            header: self.header().to_vec(),
            rows: self.body(metadata_rows).to_vec(),
            metadata_rows,
        }
    }
}

/// A header row plus the data rows below the metadata block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTable {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// How many sheet rows were stripped before `rows[0]`.
    pub metadata_rows: usize,
}

impl ReferenceTable {
    /// Build a header index for this table.
    pub fn header_index(&self) -> HeaderIndex {
        HeaderIndex::new(&self.name, &self.header)
    }

    /// 1-based sheet row number of a body row.
    pub fn source_row(&self, body_index: usize) -> usize {
        body_index + self.metadata_rows + 1
    }
}

/// Maps trimmed header names to column positions.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    table: String,
    positions: IndexMap<String, usize>,
}

impl HeaderIndex {
    /// Index a header row. Duplicate names keep the last position.
    pub fn new(table: impl Into<String>, header: &[String]) -> Self {
        let table = table.into();
        let mut positions = IndexMap::new();

        for (i, name) in header.iter().enumerate() {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if let Some(previous) = positions.insert(name.to_string(), i) {
                warn!(
                    table = %table,
                    column = name,
                    first = previous,
                    second = i,
                    "duplicate header name, using the later column"
                );
            }
        }

        Self { table, positions }
    }

    /// Name of the table this header belongs to.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Position of a column, if present.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    /// Position of a column, failing with a schema error when absent.
    pub fn require(&self, column: &str) -> Result<usize> {
        self.position(column)
            .ok_or_else(|| TabulaError::schema(&self.table, column))
    }

    /// Whether the header contains a column.
    pub fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    /// Column names in header order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(String::as_str)
    }

    /// Number of indexed columns.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Cell value at `col`, or `""` when the row is shorter.
pub fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or("")
}

/// Spreadsheet-style boolean: `TRUE`, `true`, any case.
pub fn is_truthy(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Order two cells the way a sheet range sort does: numbers numerically,
/// text lexically, blanks after everything else. `NaN` and `inf` are text.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.trim(), b.trim());
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }

    let number = |s: &str| s.parse::<f64>().ok().filter(|n| n.is_finite());
    match (number(a), number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pads_rows() {
        let table = Table::from_rows("t", vec![vec!["a", "b", "c"], vec!["1"]]);
        assert_eq!(table.width(), 3);
        assert_eq!(table.rows[1], vec!["1", "", ""]);
    }

    #[test]
    fn test_header_index_trims_and_skips_empty() {
        let header: Vec<String> = vec![" key ".into(), "".into(), "ko-KR".into()];
        let index = HeaderIndex::new("Localization", &header);

        assert_eq!(index.position("key"), Some(0));
        assert_eq!(index.position("ko-KR"), Some(2));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_header_index_duplicate_keeps_last() {
        let header: Vec<String> = vec!["id".into(), "name".into(), "id".into()];
        let index = HeaderIndex::new("t", &header);
        assert_eq!(index.position("id"), Some(2));
    }

    #[test]
    fn test_require_names_table_and_column() {
        let index = HeaderIndex::new("spaces", &["id".to_string()]);
        let err = index.require("title").unwrap_err();
        assert_eq!(err.to_string(), "Column 'title' not found in table 'spaces'");
    }

    #[test]
    fn test_reference_source_row() {
        let table = Table::from_rows(
            "enum",
            vec![
                vec!["Name"],
                vec!["desc"],
                vec!["string"],
                vec!["A"],
                vec!["B"],
            ],
        );
        let reference = table.to_reference(3);
        assert_eq!(reference.rows.len(), 2);
        assert_eq!(reference.source_row(1), 5);
    }

    #[test]
    fn test_compare_cells() {
        assert_eq!(compare_cells("2", "10"), Ordering::Less);
        assert_eq!(compare_cells("b", "a"), Ordering::Greater);
        assert_eq!(compare_cells("", "a"), Ordering::Greater);
        assert_eq!(compare_cells("1", "a"), Ordering::Less);
        assert_eq!(compare_cells("S01", "S01"), Ordering::Equal);
    }

    #[test]
    fn test_non_finite_cells_sort_as_text() {
        assert_eq!(compare_cells("NaN", "3"), Ordering::Greater);
        assert_eq!(compare_cells("3", "NaN"), Ordering::Less);
        assert_eq!(compare_cells("inf", "1e9"), Ordering::Greater);
        assert_eq!(compare_cells("NaN", "inf"), Ordering::Less);
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("TRUE"));
        assert!(is_truthy(" true "));
        assert!(!is_truthy("1"));
        assert!(!is_truthy(""));
    }
}
