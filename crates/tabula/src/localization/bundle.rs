//! Per-language JSON bundles exported from and merged back into the localization sheet.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{Result, TabulaError};
use crate::table::{cell, Table};

/// Column holding the localization key.
pub const KEY_COLUMN: &str = "key";

/// Non-language columns that are not `#`-prefixed. `tag` is metadata, so no `tag.json` is written.
const NON_LANGUAGE_COLUMNS: &[&str] = &[KEY_COLUMN, "tag"];

/// `key -> text` for one language.
pub type LanguageBundle = IndexMap<String, String>;

/// Whether a header names a language column.
pub fn is_language_column(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && !name.starts_with('#') && !NON_LANGUAGE_COLUMNS.contains(&name)
}

/// `(language, position)` for every language column, in header order.
pub fn language_columns(header: &[String]) -> Vec<(String, usize)> {
    header
        .iter()
        .enumerate()
        .filter(|(_, name)| is_language_column(name))
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect()
}

/// One written bundle file.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    pub language: String,
    pub path: PathBuf,
    pub keys: usize,
    /// `sha256:<hex>` of the file contents.
    pub digest: String,
}

/// Write `<language>.json` for every language column of the sheet.
///
/// Each file is a pretty-printed object in sheet order. Rows with an
/// empty key are skipped.
pub fn export_bundles(table: &Table, dir: &Path) -> Result<Vec<ExportedFile>> {
    let header = table.header_index();
    let key_col = header.require(KEY_COLUMN)?;
    fs::create_dir_all(dir).map_err(|e| TabulaError::io(dir, e))?;

    let mut exported = Vec::new();
    for (language, col) in language_columns(table.header()) {
        let mut object = Map::new();
        for row in table.body(1) {
            let key = cell(row, key_col).trim();
            if key.is_empty() {
                continue;
            }
            object.insert(key.to_string(), Value::String(cell(row, col).to_string()));
        }

        let keys = object.len();
        let json = serde_json::to_string_pretty(&Value::Object(object))?;
        let path = dir.join(format!("{language}.json"));
        fs::write(&path, &json).map_err(|e| TabulaError::io(&path, e))?;

        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        let digest = format!("sha256:{:x}", hasher.finalize());

        debug!(language = %language, keys, path = %path.display(), "bundle written");
        exported.push(ExportedFile {
            language,
            path,
            keys,
            digest,
        });
    }

    info!(files = exported.len(), dir = %dir.display(), "localization exported");
    Ok(exported)
}

/// Read every `*.json` bundle in `dir`, keyed by file stem, in file-name order.
///
/// Non-string values are stored in their JSON text form; `null` becomes empty.
pub fn read_bundles(dir: &Path) -> Result<IndexMap<String, LanguageBundle>> {
    let entries = fs::read_dir(dir).map_err(|e| TabulaError::io(dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| TabulaError::io(dir, e))?.path();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut bundles = IndexMap::new();
    for path in paths {
        let Some(language) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        let text = fs::read_to_string(&path).map_err(|e| TabulaError::io(&path, e))?;
        let value: Value = serde_json::from_str(&text)?;

        let Value::Object(object) = value else {
            warn!(path = %path.display(), "bundle is not a JSON object, skipping");
            continue;
        };

        let bundle: LanguageBundle = object
            .into_iter()
            .map(|(key, value)| (key, value_text(value)))
            .collect();
        bundles.insert(language, bundle);
    }

    Ok(bundles)
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// What a merge changed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeSummary {
    pub languages: Vec<String>,
    pub added_languages: Vec<String>,
    pub keys: usize,
    pub added_keys: usize,
}

/// Merge language bundles into the localization sheet.
///
/// Missing language columns are appended. The result holds the union of
/// sheet and bundle keys, sorted. Existing rows keep every cell a bundle
/// does not overwrite, `#` metadata columns included. Sheet rows with an
/// empty key are dropped.
pub fn merge_bundles(table: &mut Table, bundles: &IndexMap<String, LanguageBundle>) -> Result<MergeSummary> {
    let key_col = table.header_index().require(KEY_COLUMN)?;

    let mut header = table.header().to_vec();
    let mut summary = MergeSummary::default();
    for language in bundles.keys() {
        if !header.iter().any(|h| h.trim() == language.as_str()) {
            header.push(language.clone());
            summary.added_languages.push(language.clone());
        }
    }
    summary.languages = bundles.keys().cloned().collect();

    let columns: IndexMap<String, usize> = language_columns(&header).into_iter().collect();
    let width = header.len();

    let mut existing: IndexMap<String, Vec<String>> = IndexMap::new();
    for row in table.body(1) {
        let key = cell(row, key_col).trim();
        if key.is_empty() {
            continue;
        }
        let mut row = row.clone();
        row.resize(width, String::new());
        existing.insert(key.to_string(), row);
    }

    let keys: BTreeSet<&str> = existing
        .keys()
        .map(String::as_str)
        .chain(bundles.values().flat_map(|b| b.keys().map(String::as_str)))
        .collect();

    let mut rows = Vec::with_capacity(keys.len() + 1);
    rows.push(header.clone());
    for key in &keys {
        let mut row = match existing.get(*key) {
            Some(row) => row.clone(),
            None => {
                summary.added_keys += 1;
                vec![String::new(); width]
            }
        };
        row[key_col] = key.to_string();

        for (language, bundle) in bundles {
            if let (Some(text), Some(&col)) = (bundle.get(*key), columns.get(language)) {
                row[col] = text.clone();
            }
        }
        rows.push(row);
    }
    summary.keys = keys.len();

    table.rows = rows;
    table.normalize();

    info!(
        keys = summary.keys,
        added_keys = summary.added_keys,
        added_languages = summary.added_languages.len(),
        "localization merged"
    );
    Ok(summary)
}
