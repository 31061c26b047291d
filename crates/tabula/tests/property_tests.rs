//! Property-based tests for Tabula's merge and lookup primitives.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p tabula --test property_tests
//!
//! # More cases
//! PROPTEST_CASES=10000 cargo test -p tabula --test property_tests
//! ```

use std::collections::HashSet;

use proptest::prelude::*;

use tabula::merge::{merge_upsert, SortKey};
use tabula::reference::{CompositeIndex, KEY_SEPARATOR};
use tabula::table::compare_cells;
use tabula::{Table, TabulaError};

// =============================================================================
// Test Strategies
// =============================================================================

/// `[sceneId, index, payload]` rows over a small key space so batches overlap.
fn script_row() -> impl Strategy<Value = Vec<String>> {
    ("S[0-4]", "A00[0-9]00[0-3]", "[a-z]{0,6}")
        .prop_map(|(scene, index, payload)| vec![scene, index, payload])
}

fn script_rows(max: usize) -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(script_row(), 0..max)
}

fn sort_keys() -> [SortKey; 2] {
    [SortKey::ascending(0), SortKey::ascending(1)]
}

fn is_sorted(rows: &[Vec<String>]) -> bool {
    rows.windows(2).all(|w| {
        compare_cells(&w[0][0], &w[1][0])
            .then_with(|| compare_cells(&w[0][1], &w[1][1]))
            .is_le()
    })
}

// =============================================================================
// Merge-Upsert Properties
// =============================================================================

proptest! {
    /// Merging the same batch twice gives the same table as merging it once.
    #[test]
    fn merge_is_idempotent(existing in script_rows(30), batch in script_rows(15)) {
        let once = merge_upsert(&existing, &batch, 0, &sort_keys());
        let twice = merge_upsert(&once, &batch, 0, &sort_keys());
        prop_assert_eq!(once, twice);
    }

    /// Rows whose key is absent from the batch survive untouched.
    #[test]
    fn merge_keeps_unrelated_rows(existing in script_rows(30), batch in script_rows(15)) {
        let replaced: HashSet<&str> = batch.iter().map(|r| r[0].as_str()).collect();
        let merged = merge_upsert(&existing, &batch, 0, &sort_keys());

        for row in existing.iter().filter(|r| !replaced.contains(r[0].as_str())) {
            prop_assert!(merged.contains(row));
        }
        for row in &merged {
            if replaced.contains(row[0].as_str()) {
                prop_assert!(batch.contains(row));
            }
        }
    }

    /// Output size is kept rows plus the whole batch.
    #[test]
    fn merge_size(existing in script_rows(30), batch in script_rows(15)) {
        let replaced: HashSet<&str> = batch.iter().map(|r| r[0].as_str()).collect();
        let kept = existing.iter().filter(|r| !replaced.contains(r[0].as_str())).count();

        let merged = merge_upsert(&existing, &batch, 0, &sort_keys());
        prop_assert_eq!(merged.len(), kept + batch.len());
    }

    /// The result is ordered by the sort keys.
    #[test]
    fn merge_output_is_sorted(existing in script_rows(30), batch in script_rows(15)) {
        let merged = merge_upsert(&existing, &batch, 0, &sort_keys());
        prop_assert!(is_sorted(&merged));
    }

    /// Rows with equal sort keys keep their input order.
    #[test]
    fn merge_is_stable(batch in script_rows(20)) {
        let merged = merge_upsert(&[], &batch, 0, &sort_keys());

        for (i, a) in merged.iter().enumerate() {
            for b in &merged[i + 1..] {
                if a[0] == b[0] && a[1] == b[1] {
                    let pos_a = batch.iter().position(|r| r == a).unwrap();
                    let pos_b = batch.iter().rposition(|r| r == b).unwrap();
                    prop_assert!(pos_a <= pos_b);
                }
            }
        }
    }
}

// =============================================================================
// Composite Index Properties
// =============================================================================

fn reference_table(rows: &[(String, String, String)]) -> Table {
    let mut all = vec![
        vec!["kind".to_string(), "name".to_string(), "id".to_string()],
        vec![String::new(); 3],
        vec![String::new(); 3],
    ];
    all.extend(rows.iter().map(|(k, n, v)| vec![k.clone(), n.clone(), v.clone()]));
    Table::new("things", all)
}

proptest! {
    /// Every non-empty key resolves to the value on its row.
    #[test]
    fn index_resolves_every_unique_key(
        entries in prop::collection::btree_map(("[A-C]", "[a-z]{1,4}"), "[0-9]{1,3}", 0..20)
    ) {
        let rows: Vec<_> = entries
            .iter()
            .map(|((kind, name), id)| (kind.clone(), name.clone(), id.clone()))
            .collect();
        let table = reference_table(&rows).to_reference(3);
        let index = CompositeIndex::build(&table, &["kind", "name"], "id").unwrap();

        prop_assert_eq!(index.len(), rows.len());
        for (kind, name, id) in &rows {
            let found = index.resolve(&[("name", name.as_str()), ("kind", kind.as_str())]).unwrap();
            prop_assert_eq!(found, Some(id.as_str()));
        }
    }

    /// A repeated key is always rejected, never silently overwritten.
    #[test]
    fn index_rejects_duplicates(
        kind in "[A-C]",
        name in "[a-z]{1,4}",
        ids in prop::collection::vec("[0-9]{1,3}", 2..5)
    ) {
        let rows: Vec<_> = ids
            .iter()
            .map(|id| (kind.clone(), name.clone(), id.clone()))
            .collect();
        let table = reference_table(&rows).to_reference(3);

        let result = CompositeIndex::build(&table, &["kind", "name"], "id");
        match result {
            Err(TabulaError::DuplicateKey { key, row, .. }) => {
                prop_assert_eq!(key, format!("{kind}{KEY_SEPARATOR}{name}"));
                prop_assert_eq!(row, 5);
            }
            other => prop_assert!(false, "expected duplicate key error, got {:?}", other),
        }
    }

    /// Names that are not in the table resolve to empty, never an error.
    #[test]
    fn unknown_names_resolve_empty(name in "[x-z]{1,6}") {
        let table = reference_table(&[("A".into(), "known".into(), "1".into())]).to_reference(3);
        let index = CompositeIndex::build(&table, &["name"], "id").unwrap();
        prop_assert_eq!(index.name_to_value(&name).unwrap(), "");
    }
}
