//! Error types for the tabula library.

use std::path::PathBuf;
use thiserror::Error;

use crate::remote::SyncErrorBody;

/// Main error type for tabula operations.
#[derive(Debug, Error)]
pub enum TabulaError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Nothing to operate on.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// A sheet the operation depends on does not exist.
    #[error("Missing sheet: {name}")]
    MissingTable { name: String },

    /// A referenced column is not present in a table header.
    #[error("Column '{column}' not found in table '{table}'")]
    Schema { table: String, column: String },

    /// Two rows of a reference table produce the same composite key.
    #[error("Duplicate key '{key}' in table '{table}' (row {row})")]
    DuplicateKey {
        table: String,
        key: String,
        row: usize,
    },

    /// A lookup was attempted without a value for one of the key columns.
    #[error("Missing lookup condition for key column '{column}'")]
    MissingCondition { column: String },

    /// A mandatory cross-table reference could not be resolved.
    #[error("Unresolved {entity}: '{value}'")]
    UnresolvedReference { entity: String, value: String },

    /// A remote service call failed or returned a non-success status.
    #[error("Remote call to {endpoint} failed{}: {message}", http_suffix(.status))]
    RemoteCall {
        endpoint: String,
        status: Option<u16>,
        message: String,
        body: Option<Box<SyncErrorBody>>,
    },

    /// No API key is configured for the requested environment.
    #[error("{environment} API key not set. Export {variable} before running this command")]
    MissingCredential {
        environment: String,
        variable: String,
    },
}

impl TabulaError {
    /// Build an IO error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TabulaError::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a schema error for a missing column.
    pub fn schema(table: impl Into<String>, column: impl Into<String>) -> Self {
        TabulaError::Schema {
            table: table.into(),
            column: column.into(),
        }
    }
}

fn http_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Result type alias for tabula operations.
pub type Result<T> = std::result::Result<T, TabulaError>;
