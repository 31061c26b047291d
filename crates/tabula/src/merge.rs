//! Merge-upsert of a freshly produced batch into an existing table body.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;
use crate::table::{cell, compare_cells, HeaderIndex};

/// One column of a sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: usize,
    pub ascending: bool,
}

impl SortKey {
    pub fn ascending(column: usize) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub fn descending(column: usize) -> Self {
        Self {
            column,
            ascending: false,
        }
    }

    /// Ascending key on a named column.
    pub fn named(header: &HeaderIndex, column: &str) -> Result<Self> {
        Ok(Self::ascending(header.require(column)?))
    }
}

/// Replace every existing row whose primary key appears in `new_rows`,
/// keep all other rows, then stable-sort the result by `sort_keys`.
///
/// Keys compare as trimmed strings. Rows with equal sort keys keep the
/// order they had after concatenation (kept rows first, then the batch).
pub fn merge_upsert(
    existing: &[Vec<String>],
    new_rows: &[Vec<String>],
    primary_key: usize,
    sort_keys: &[SortKey],
) -> Vec<Vec<String>> {
    let replaced: HashSet<&str> = new_rows
        .iter()
        .map(|row| cell(row, primary_key).trim())
        .collect();

    let mut merged: Vec<Vec<String>> = existing
        .iter()
        .filter(|row| !replaced.contains(cell(row, primary_key).trim()))
        .cloned()
        .collect();
    let kept = merged.len();
    merged.extend(new_rows.iter().cloned());

    // `sort_by` is stable.
    merged.sort_by(|a, b| compare_rows(a, b, sort_keys));

    debug!(
        existing = existing.len(),
        kept,
        replaced_keys = replaced.len(),
        inserted = new_rows.len(),
        "merge-upsert"
    );
    merged
}

fn compare_rows(a: &[String], b: &[String], sort_keys: &[SortKey]) -> Ordering {
    for key in sort_keys {
        let ordering = compare_cells(cell(a, key.column), cell(b, key.column));
        let ordering = if key.ascending {
            ordering
        } else {
            ordering.reverse()
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_replaces_whole_batch_for_key() {
        let existing = rows(&[
            &["S1", "A0001001000", "old"],
            &["S1", "A0002001000", "old"],
            &["S2", "A0001001000", "keep"],
        ]);
        let batch = rows(&[&["S1", "A0001001000", "new"]]);

        let merged = merge_upsert(&existing, &batch, 0, &[SortKey::ascending(0), SortKey::ascending(1)]);

        assert_eq!(
            merged,
            rows(&[&["S1", "A0001001000", "new"], &["S2", "A0001001000", "keep"]])
        );
    }

    #[test]
    fn test_key_match_is_trimmed() {
        let existing = rows(&[&[" S1 ", "x"]]);
        let batch = rows(&[&["S1", "y"]]);
        let merged = merge_upsert(&existing, &batch, 0, &[]);
        assert_eq!(merged, rows(&[&["S1", "y"]]));
    }

    #[test]
    fn test_stable_on_equal_keys() {
        let existing = rows(&[&["S2", "first"], &["S2", "second"]]);
        let batch = rows(&[&["S1", "new"]]);

        let merged = merge_upsert(&existing, &batch, 0, &[SortKey::ascending(0)]);

        assert_eq!(
            merged,
            rows(&[&["S1", "new"], &["S2", "first"], &["S2", "second"]])
        );
    }

    #[test]
    fn test_descending_and_numeric() {
        let existing = rows(&[&["a", "2"], &["b", "10"]]);
        let batch = rows(&[&["c", "9"]]);

        let merged = merge_upsert(&existing, &batch, 0, &[SortKey::descending(1)]);
        let order: Vec<&str> = merged.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_empty_batch_only_sorts() {
        let existing = rows(&[&["S2"], &["S1"]]);
        let merged = merge_upsert(&existing, &[], 0, &[SortKey::ascending(0)]);
        assert_eq!(merged, rows(&[&["S1"], &["S2"]]));
    }

    #[test]
    fn test_nan_cells_do_not_break_numeric_order() {
        let existing: Vec<Vec<String>> = (0..200)
            .rev()
            .map(|i| {
                let id = if i % 7 == 0 { "NaN".to_string() } else { i.to_string() };
                vec![id]
            })
            .collect();

        let merged = merge_upsert(&existing, &[], 0, &[SortKey::ascending(0)]);

        let numbers: Vec<i64> = merged.iter().filter_map(|r| r[0].parse().ok()).collect();
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        assert!(merged[numbers.len()..].iter().all(|r| r[0] == "NaN"));
    }
}
