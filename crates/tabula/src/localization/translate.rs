//! Selection of localization rows for batch translation.

use crate::error::{Result, TabulaError};
use crate::reference::CompositeIndex;
use crate::table::{cell, is_truthy, Table};

/// Header of the rows sent for translation.
pub const TRANSLATION_HEADER: [&str; 4] = ["key", "character", "type", "text"];

/// Columns never treated as translation targets.
const NOT_TARGETS: &[&str] = &["key", "ko-KR", "tag"];

/// Languages to translate into: every header not `#`-prefixed and not
/// `key`, `ko-KR` or `tag`.
pub fn target_languages(header: &[String]) -> Vec<String> {
    header
        .iter()
        .map(|h| h.trim())
        .filter(|h| !h.is_empty() && !h.starts_with('#') && !NOT_TARGETS.contains(h))
        .map(str::to_string)
        .collect()
}

/// Rows marked `#translate` with Korean source text, as
/// `[key, character, type, text]` with the header first.
///
/// The character name is resolved to its speaker id; unknown names
/// become empty.
pub fn translation_rows(sheet: &Table, speakers: &CompositeIndex) -> Result<Vec<Vec<String>>> {
    let header = sheet.header_index();
    let key_col = header.require("key")?;
    let character_col = header.require("#character")?;
    let type_col = header.require("#type")?;
    let ko_col = header.require("ko-KR")?;
    let translate_col = header.require("#translate")?;

    let mut rows = vec![TRANSLATION_HEADER.iter().map(|s| s.to_string()).collect()];
    for row in sheet.body(1) {
        if !is_truthy(cell(row, translate_col)) || cell(row, ko_col).is_empty() {
            continue;
        }
        rows.push(vec![
            cell(row, key_col).to_string(),
            speakers.name_to_value(cell(row, character_col))?,
            cell(row, type_col).to_string(),
            cell(row, ko_col).to_string(),
        ]);
    }

    if rows.len() == 1 {
        return Err(TabulaError::EmptyData(format!(
            "No rows in '{}' are marked for translation",
            sheet.name
        )));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speakers() -> CompositeIndex {
        let table = Table::from_rows("dialogSpeaker", vec![vec!["Name", "id"], vec!["미나", "c_mina"]]);
        CompositeIndex::build(&table.to_reference(1), &["Name"], "id").unwrap()
    }

    fn sheet() -> Table {
        Table::from_rows(
            "localization",
            vec![
                vec!["key", "tag", "#type", "#character", "#translate", "ko-KR", "en-US", "ja-JP"],
                vec!["k1", "storyscript", "characterDialog", "미나", "TRUE", "안녕", "", ""],
                vec!["k2", "ui", "button", "", "false", "확인", "", ""],
                vec!["k3", "ui", "button", "", "true", "", "", ""],
                vec!["k4", "ui", "label", "누구", "true", "취소", "", ""],
            ],
        )
    }

    #[test]
    fn test_target_languages() {
        let header = sheet().header().to_vec();
        assert_eq!(target_languages(&header), vec!["en-US", "ja-JP"]);
    }

    #[test]
    fn test_translation_rows() {
        let rows = translation_rows(&sheet(), &speakers()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["key", "character", "type", "text"]);
        assert_eq!(rows[1], vec!["k1", "c_mina", "characterDialog", "안녕"]);
        assert_eq!(rows[2], vec!["k4", "", "label", "취소"]);
    }

    #[test]
    fn test_nothing_to_translate() {
        let table = Table::from_rows(
            "localization",
            vec![
                vec!["key", "#type", "#character", "#translate", "ko-KR"],
                vec!["k1", "", "", "false", "안녕"],
            ],
        );
        let err = translation_rows(&table, &speakers()).unwrap_err();
        assert!(matches!(err, TabulaError::EmptyData(_)));
    }
}
