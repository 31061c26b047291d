//! Row-to-record conversion for sheets used as keyed dictionaries.

use indexmap::IndexMap;

use crate::table::{cell, Table};

/// One row keyed by header name.
pub type Record = IndexMap<String, String>;

/// Records keyed by one of their own fields.
pub type RecordDictionary = IndexMap<String, Record>;

/// Turn every row below the header into a record. Columns with an empty
/// header are dropped.
pub fn records(table: &Table) -> Vec<Record> {
    let header = table.header();
    table
        .body(1)
        .iter()
        .map(|row| {
            header
                .iter()
                .enumerate()
                .filter(|(_, name)| !name.trim().is_empty())
                .map(|(i, name)| (name.trim().to_string(), cell(row, i).to_string()))
                .collect()
        })
        .collect()
}

/// Key records by `key_column`, removing that field from each value.
///
/// Records with an empty key are skipped; a later record with the same
/// key replaces an earlier one.
pub fn dictionary_by(records: Vec<Record>, key_column: &str) -> RecordDictionary {
    let mut dictionary = RecordDictionary::new();
    for mut record in records {
        let Some(key) = record.shift_remove(key_column) else {
            continue;
        };
        if key.trim().is_empty() {
            continue;
        }
        dictionary.insert(key, record);
    }
    dictionary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glossary_dictionary() {
        let table = Table::from_rows(
            "Dictionary",
            vec![
                vec!["ko-KR", "en-US", "ja-JP", ""],
                vec!["마나", "Mana", "マナ", "x"],
                vec!["", "orphan", "", ""],
                vec!["용사", "Hero", "勇者", ""],
            ],
        );

        let dictionary = dictionary_by(records(&table), "ko-KR");
        assert_eq!(dictionary.len(), 2);
        assert_eq!(dictionary["마나"]["en-US"], "Mana");
        assert!(!dictionary["마나"].contains_key("ko-KR"));
        assert_eq!(dictionary["용사"].len(), 2);
    }

    #[test]
    fn test_records_of_header_only_sheet() {
        let table = Table::from_rows("scene_info", vec![vec!["sceneId", "location"]]);
        assert!(records(&table).is_empty());
    }
}
