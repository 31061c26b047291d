//! Row projection: re-shaping rows of one sheet schema into another.
//!
//! Projectors address every field by header name. Positions are resolved
//! once per schema through a [`HeaderIndex`]; a projector never reaches
//! into a row by raw column number.

mod script;
mod story;
mod text_keys;
mod transfer;

pub use script::{
    leading_int, row_index, with_end_marker, ScriptBatch, ScriptFold, ScriptIndexes,
    ScriptLine, ScriptProjector, TextEntry, END_MARKER, SCRIPT_INPUT_COLUMNS,
    STORY_SCRIPT_COLUMNS,
};
pub use story::{
    DialogueStoryProjector, FullStoryProjector, DIALOGUE_STORY_COLUMNS, FULL_STORY_COLUMNS,
};
pub use text_keys::{upsert_text_keys, TextKeyStats};
pub use transfer::{transfer_script, ChoiceGrade, GENERATED_SCRIPT_COLUMNS};

use crate::error::Result;
use crate::table::{cell, HeaderIndex};

/// A row being filled in against a target schema. Unset fields stay empty.
#[derive(Debug, Clone)]
pub struct ProjectedRow<'a> {
    schema: &'a HeaderIndex,
    cells: Vec<String>,
}

impl<'a> ProjectedRow<'a> {
    /// An empty row `width` cells wide.
    pub fn new(schema: &'a HeaderIndex, width: usize) -> Self {
        Self {
            schema,
            cells: vec![String::new(); width],
        }
    }

    /// Set a named field. The column must exist in the target schema.
    pub fn set(&mut self, column: &str, value: impl Into<String>) -> Result<&mut Self> {
        let pos = self.schema.require(column)?;
        if pos >= self.cells.len() {
            self.cells.resize(pos + 1, String::new());
        }
        self.cells[pos] = value.into();
        Ok(self)
    }

    /// Current value of a named field.
    pub fn get(&self, column: &str) -> &str {
        self.schema
            .position(column)
            .map(|p| cell(&self.cells, p))
            .unwrap_or("")
    }

    pub fn into_cells(self) -> Vec<String> {
        self.cells
    }
}

/// Read-only view of a source row addressed by header name.
#[derive(Debug, Clone, Copy)]
pub struct SourceRow<'a> {
    schema: &'a HeaderIndex,
    cells: &'a [String],
}

impl<'a> SourceRow<'a> {
    pub fn new(schema: &'a HeaderIndex, cells: &'a [String]) -> Self {
        Self { schema, cells }
    }

    /// Raw value of a field; `""` when the column is absent.
    pub fn raw(&self, column: &str) -> &'a str {
        self.schema
            .position(column)
            .map(|p| cell(self.cells, p))
            .unwrap_or("")
    }

    /// Trimmed value of a field.
    pub fn get(&self, column: &str) -> &'a str {
        self.raw(column).trim()
    }

    /// Whether a field holds anything but whitespace.
    pub fn has(&self, column: &str) -> bool {
        !self.get(column).is_empty()
    }
}

/// Fail fast unless every named column exists.
pub(crate) fn require_columns(schema: &HeaderIndex, columns: &[&str]) -> Result<()> {
    for column in columns {
        schema.require(column)?;
    }
    Ok(())
}
