//! Workbook store abstraction.

use std::cell::RefCell;

use indexmap::IndexMap;

use crate::error::{Result, TabulaError};

use super::sheet::Table;

/// A named collection of sheets that can be read and rewritten.
///
/// Stores are the only place durable state lives; every operation reads
/// what it needs fresh and writes back whole regions.
pub trait TableStore {
    /// Identifier of the workbook (used as `sheetId`/`spreadsheetId` in payloads).
    fn id(&self) -> &str;

    /// Names of every sheet, in workbook order.
    fn table_names(&self) -> Result<Vec<String>>;

    /// Read a full sheet. Fails with `MissingTable` when absent.
    fn read_table(&self, name: &str) -> Result<Table>;

    /// Replace a sheet's contents, creating it if necessary.
    ///
    /// Implementations must make the write all-or-nothing.
    fn write_table(&self, table: &Table) -> Result<()>;

    /// Whether a sheet exists.
    fn has_table(&self, name: &str) -> Result<bool> {
        Ok(self.table_names()?.iter().any(|n| n == name))
    }

    /// Keep rows before `start_row`, clear the rest, then write `rows` from `start_row`.
    fn write_rows(&self, name: &str, start_row: usize, rows: Vec<Vec<String>>) -> Result<()> {
        let mut table = if self.has_table(name)? {
            self.read_table(name)?
        } else {
            Table::empty(name)
        };

        table.rows.truncate(start_row);
        while table.rows.len() < start_row {
            table.rows.push(Vec::new());
        }
        table.rows.extend(rows);
        table.normalize();

        self.write_table(&table)
    }
}

/// Workbook held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryWorkbook {
    id: String,
    tables: RefCell<IndexMap<String, Table>>,
}

impl MemoryWorkbook {
    /// Create an empty workbook.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tables: RefCell::new(IndexMap::new()),
        }
    }

    /// Add a sheet, builder style.
    pub fn with_table(self, table: Table) -> Self {
        self.insert(table);
        self
    }

    /// Add or replace a sheet.
    pub fn insert(&self, table: Table) {
        self.tables.borrow_mut().insert(table.name.clone(), table);
    }

    /// Current contents of a sheet.
    pub fn get(&self, name: &str) -> Option<Table> {
        self.tables.borrow().get(name).cloned()
    }
}

impl TableStore for MemoryWorkbook {
    fn id(&self) -> &str {
        &self.id
    }

    fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.borrow().keys().cloned().collect())
    }

    fn read_table(&self, name: &str) -> Result<Table> {
        self.get(name).ok_or_else(|| TabulaError::MissingTable {
            name: name.to_string(),
        })
    }

    fn write_table(&self, table: &Table) -> Result<()> {
        self.insert(table.clone());
        Ok(())
    }
}
