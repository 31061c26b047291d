//! Upsert of dialogue text keys into the localization sheet.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::Result;
use crate::table::{cell, Table};

use super::script::TextEntry;

const NEW_KEY_TAG: &str = "storyscript";
const NEW_KEY_TYPE: &str = "characterDialog";

/// What an upsert changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TextKeyStats {
    pub updated: usize,
    pub inserted: usize,
}

/// Write each entry's Korean text into `localization`.
///
/// An existing key only has its `ko-KR` cell replaced. A new key is
/// appended tagged `storyscript`, typed `characterDialog` and marked
/// not-to-translate. Every other cell of the sheet is left as it was.
pub fn upsert_text_keys(localization: &mut Table, entries: &[TextEntry]) -> Result<TextKeyStats> {
    let header = localization.header_index();
    let key_col = header.require("key")?;
    let ko_col = header.require("ko-KR")?;
    let tag_col = header.require("tag")?;
    let type_col = header.require("#type")?;
    let translate_col = header.require("#translate")?;
    let width = localization.width();

    let mut positions: HashMap<String, usize> = HashMap::new();
    for (i, row) in localization.rows.iter().enumerate().skip(1) {
        let key = cell(row, key_col).trim();
        if !key.is_empty() {
            positions.insert(key.to_string(), i);
        }
    }

    let mut stats = TextKeyStats::default();
    for entry in entries {
        let key = entry.key.trim();
        match positions.get(key) {
            Some(&i) => {
                let row = &mut localization.rows[i];
                row[key_col] = key.to_string();
                row[ko_col] = entry.text.clone();
                stats.updated += 1;
            }
            None => {
                let mut row = vec![String::new(); width];
                row[key_col] = key.to_string();
                row[tag_col] = NEW_KEY_TAG.to_string();
                row[type_col] = NEW_KEY_TYPE.to_string();
                row[translate_col] = "false".to_string();
                row[ko_col] = entry.text.clone();

                positions.insert(key.to_string(), localization.rows.len());
                localization.rows.push(row);
                stats.inserted += 1;
            }
        }
    }

    Ok(stats)
}
