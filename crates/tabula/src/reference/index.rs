//! Composite-key lookup indexes over reference tables.

use std::collections::HashMap;

use crate::error::{Result, TabulaError};
use crate::table::{cell, ReferenceTable};

/// Separator between the parts of a composite key.
pub const KEY_SEPARATOR: &str = "|";

/// Join key parts the way indexes store them: trimmed, `|`-separated.
pub fn composite_key<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .map(|p| p.as_ref().trim().to_string())
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

/// A dictionary from composite key to one value column of a reference table.
///
/// Keys whose parts are all empty are never indexed, and a key seen twice
/// is a construction error: a reference table must be a true dictionary
/// over its key columns.
#[derive(Debug, Clone)]
pub struct CompositeIndex {
    table: String,
    key_columns: Vec<String>,
    value_column: String,
    entries: HashMap<String, String>,
}

impl CompositeIndex {
    /// Index `value_column` of `table` by the ordered `key_columns`.
    pub fn build(table: &ReferenceTable, key_columns: &[&str], value_column: &str) -> Result<Self> {
        if key_columns.is_empty() {
            return Err(TabulaError::Config(format!(
                "Index over '{}' needs at least one key column",
                table.name
            )));
        }

        let header = table.header_index();
        let value_pos = header.require(value_column)?;
        let key_pos = key_columns
            .iter()
            .map(|col| header.require(col))
            .collect::<Result<Vec<_>>>()?;

        let mut entries = HashMap::with_capacity(table.rows.len());
        for (row_idx, row) in table.rows.iter().enumerate() {
            let key = composite_key(key_pos.iter().map(|&p| cell(row, p)));

            if key.replace(KEY_SEPARATOR, "").trim().is_empty() {
                continue;
            }

            if entries.contains_key(&key) {
                return Err(TabulaError::DuplicateKey {
                    table: table.name.clone(),
                    key,
                    row: table.source_row(row_idx),
                });
            }
            entries.insert(key, cell(row, value_pos).to_string());
        }

        Ok(Self {
            table: table.name.clone(),
            key_columns: key_columns.iter().map(|c| c.to_string()).collect(),
            value_column: value_column.to_string(),
            entries,
        })
    }

    /// Look up by named conditions. Every key column must be supplied;
    /// a key with no entry resolves to `None`.
    pub fn resolve(&self, conditions: &[(&str, &str)]) -> Result<Option<&str>> {
        let parts = self
            .key_columns
            .iter()
            .map(|col| {
                conditions
                    .iter()
                    .find(|(name, _)| *name == col.as_str())
                    .map(|(_, value)| *value)
                    .ok_or_else(|| TabulaError::MissingCondition {
                        column: col.clone(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(self.get(parts.as_slice()))
    }

    /// Look up by key parts given in key-column order.
    pub fn get<S: AsRef<str>>(&self, parts: &[S]) -> Option<&str> {
        self.entries
            .get(&composite_key(parts.iter().map(AsRef::as_ref)))
            .map(String::as_str)
    }

    /// Resolve a human-entered name through a single-column index.
    ///
    /// Empty input and unknown names both yield `""`.
    pub fn name_to_value(&self, raw: &str) -> Result<String> {
        if raw.trim().is_empty() {
            return Ok(String::new());
        }
        let column = self.key_columns[0].as_str();
        Ok(self
            .resolve(&[(column, raw)])?
            .unwrap_or_default()
            .to_string())
    }

    /// Source table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Key columns, in key order.
    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    /// The column whose values are returned.
    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    /// Number of indexed keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
