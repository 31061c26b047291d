//! Tabular data: sheets, header lookup, and the workbook store abstraction.

mod csv_store;
mod sheet;
mod store;

pub use csv_store::CsvWorkbook;
pub use sheet::{cell, compare_cells, is_truthy, HeaderIndex, ReferenceTable, Table};
pub use store::{MemoryWorkbook, TableStore};
