//! Tabula: localization and content pipeline over spreadsheet-shaped tables.
//!
//! Game content lives in workbooks: master data tables, a writer's script
//! sheet, localization sheets. Tabula resolves names across those tables,
//! projects rows from one sheet layout into another, merges the results
//! back, validates schedules and JSON cells, and talks to the generation
//! backend and the admin sync service.
//!
//! # Core Principles
//!
//! - **Fail fast on schema**: a missing column or duplicate key aborts before anything is written
//! - **Findings are data**: validation problems are returned, never raised
//! - **Fresh reads**: every operation reloads the tables it needs
//!
//! # Example
//!
//! ```no_run
//! use tabula::Workspace;
//!
//! let workspace = Workspace::open("content").unwrap();
//! let report = workspace.validate_schedule(true).unwrap();
//!
//! println!("Errors: {}", report.counts.errors);
//! println!("Warnings: {}", report.counts.warnings);
//! ```

pub mod config;
pub mod error;
pub mod localization;
pub mod merge;
pub mod projection;
pub mod reference;
pub mod remote;
pub mod table;
pub mod validation;

mod workspace;

pub use crate::workspace::{
    ConnectionStatus, PullOutcome, PushOutcome, ScriptReport, SheetSync, ValidationReport,
    Workspace,
};
pub use config::TabulaConfig;
pub use error::{Result, TabulaError};
pub use remote::Environment;
pub use table::{CsvWorkbook, MemoryWorkbook, Table, TableStore};
pub use validation::{Finding, FindingType, Severity};
