//! Workbook backed by a directory of CSV/TSV files, one file per sheet.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TabulaError};

use super::sheet::Table;
use super::store::TableStore;

/// Extensions recognized as sheets, with their delimiters.
const SHEET_FORMATS: &[(&str, u8)] = &[("csv", b','), ("tsv", b'\t')];

/// A workbook directory. `Localization.csv` is the sheet `Localization`.
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    root: PathBuf,
    id: String,
}

impl CsvWorkbook {
    /// Open an existing workbook directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(TabulaError::Config(format!(
                "Workbook directory not found: {}",
                root.display()
            )));
        }
        Ok(Self::at(root))
    }

    /// Open a workbook directory, creating it if needed.
    pub fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|e| TabulaError::io(root, e))?;
        Ok(Self::at(root))
    }

    /// Use a different workbook id than the directory name.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    fn at(root: &Path) -> Self {
        let id = root
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        Self {
            root: root.to_path_buf(),
            id,
        }
    }

    /// Directory holding the sheets.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Existing file for a sheet, if any.
    fn sheet_path(&self, name: &str) -> Option<(PathBuf, u8)> {
        SHEET_FORMATS.iter().find_map(|(ext, delimiter)| {
            let path = self.root.join(format!("{name}.{ext}"));
            path.is_file().then_some((path, *delimiter))
        })
    }

    /// Parse bytes into rows.
    fn parse_bytes(&self, name: &str, bytes: &[u8], delimiter: u8) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        Ok(Table::new(name, rows))
    }
}

impl TableStore for CsvWorkbook {
    fn id(&self) -> &str {
        &self.id
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| TabulaError::io(&self.root, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| TabulaError::io(&self.root, e))?.path();
            let known = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| SHEET_FORMATS.iter().any(|(e, _)| *e == ext));
            if !known {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                names.push(stem.to_string_lossy().into_owned());
            }
        }

        names.sort();
        names.dedup();
        Ok(names)
    }

    fn has_table(&self, name: &str) -> Result<bool> {
        Ok(self.sheet_path(name).is_some())
    }

    fn read_table(&self, name: &str) -> Result<Table> {
        let (path, delimiter) = self.sheet_path(name).ok_or_else(|| TabulaError::MissingTable {
            name: name.to_string(),
        })?;

        let mut contents = Vec::new();
        File::open(&path)
            .and_then(|mut f| f.read_to_end(&mut contents))
            .map_err(|e| TabulaError::io(&path, e))?;

        let table = self.parse_bytes(name, &contents, delimiter)?;
        debug!(
            workbook = %self.id,
            sheet = name,
            rows = table.row_count(),
            "read sheet"
        );
        Ok(table)
    }

    fn write_table(&self, table: &Table) -> Result<()> {
        let (path, delimiter) = self
            .sheet_path(&table.name)
            .unwrap_or_else(|| (self.root.join(format!("{}.csv", table.name)), b','));
        let tmp_path = path.with_extension("tmp");

        {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(delimiter)
                .flexible(true)
                .from_path(&tmp_path)?;
            for row in &table.rows {
                writer.write_record(row)?;
            }
            writer.flush().map_err(|e| TabulaError::io(&tmp_path, e))?;
        }

        // Rename is the commit point; readers never observe a half-written sheet.
        fs::rename(&tmp_path, &path).map_err(|e| TabulaError::io(&path, e))?;

        debug!(
            workbook = %self.id,
            sheet = %table.name,
            rows = table.row_count(),
            "wrote sheet"
        );
        Ok(())
    }
}
