//! Reference data: loading lookup tables and indexing them by composite key.

mod bundle;
mod index;
mod records;

pub use bundle::{
    ReferenceBundle, TableDirectory, REFERENCE_LIST_SHEET, REFERENCE_METADATA_ROWS,
    TABLE_DIRECTORY_SHEET,
};
pub use index::{composite_key, CompositeIndex, KEY_SEPARATOR};
pub use records::{dictionary_by, records, Record, RecordDictionary};
