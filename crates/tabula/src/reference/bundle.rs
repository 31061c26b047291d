//! Reference bundles and the master table directory.

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::{Result, TabulaError};
use crate::table::{cell, ReferenceTable, TableStore};

use super::index::CompositeIndex;

/// Master data tables carry header, description and type rows.
pub const REFERENCE_METADATA_ROWS: usize = 3;

/// Sheet listing which reference tables an operation loads.
pub const REFERENCE_LIST_SHEET: &str = "ref_sheets";

/// Sheet in the master workbook mapping table names to their owning workbooks.
pub const TABLE_DIRECTORY_SHEET: &str = "#DataTable_Index";

/// Named reference tables loaded for one operation.
#[derive(Debug, Clone, Default)]
pub struct ReferenceBundle {
    tables: IndexMap<String, ReferenceTable>,
}

impl ReferenceBundle {
    /// Load each named sheet from `source`, skipping `metadata_rows` leading rows.
    ///
    /// Any missing sheet aborts the load.
    pub fn load<S: AsRef<str>>(
        source: &dyn TableStore,
        names: &[S],
        metadata_rows: usize,
    ) -> Result<Self> {
        let mut tables = IndexMap::new();
        for name in names {
            let name = name.as_ref();
            let table = source.read_table(name)?;
            debug!(table = name, rows = table.row_count(), "loaded reference table");
            tables.insert(name.to_string(), table.to_reference(metadata_rows));
        }

        info!(
            workbook = source.id(),
            tables = tables.len(),
            "reference bundle loaded"
        );
        Ok(Self { tables })
    }

    /// Load the tables named in the `ref_sheets` sheet of `list_store` from `source`.
    ///
    /// Every non-empty cell of the list sheet names one table.
    pub fn load_listed(list_store: &dyn TableStore, source: &dyn TableStore) -> Result<Self> {
        let list = list_store.read_table(REFERENCE_LIST_SHEET)?;
        let names: Vec<String> = list
            .rows
            .iter()
            .flatten()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        Self::load(source, &names, REFERENCE_METADATA_ROWS)
    }

    /// Add a table directly.
    pub fn insert(&mut self, table: ReferenceTable) {
        self.tables.insert(table.name.clone(), table);
    }

    /// A loaded table.
    pub fn get(&self, name: &str) -> Result<&ReferenceTable> {
        self.tables.get(name).ok_or_else(|| TabulaError::MissingTable {
            name: name.to_string(),
        })
    }

    /// Build a composite index over one of the loaded tables.
    pub fn index(&self, table: &str, key_columns: &[&str], value_column: &str) -> Result<CompositeIndex> {
        CompositeIndex::build(self.get(table)?, key_columns, value_column)
    }

    /// Names of the loaded tables.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// `Table Name` → `FileId` entries of the master `#DataTable_Index` sheet.
#[derive(Debug, Clone, Default)]
pub struct TableDirectory {
    entries: IndexMap<String, String>,
}

impl TableDirectory {
    /// Read the directory sheet from the master workbook.
    pub fn load(master: &dyn TableStore) -> Result<Self> {
        let table = master.read_table(TABLE_DIRECTORY_SHEET)?;
        let header = table.header_index();
        let name_col = header.require("Table Name")?;
        let file_col = header.require("FileId")?;

        let mut entries = IndexMap::new();
        for row in table.body(1) {
            let name = cell(row, name_col).trim();
            let file_id = cell(row, file_col).trim();
            if name.is_empty() || file_id.is_empty() {
                continue;
            }
            entries
                .entry(name.to_string())
                .or_insert_with(|| file_id.to_string());
        }

        Ok(Self { entries })
    }

    /// The workbook that owns `table`.
    pub fn file_id(&self, table: &str) -> Result<&str> {
        self.entries
            .get(table)
            .map(String::as_str)
            .ok_or_else(|| {
                TabulaError::Config(format!(
                    "No FileId registered for table '{table}' in {TABLE_DIRECTORY_SHEET}"
                ))
            })
    }
}
