//! Localization sheet operations: JSON bundles and translation requests.

mod bundle;
mod translate;

pub use bundle::{
    export_bundles, is_language_column, language_columns, merge_bundles, read_bundles,
    ExportedFile, LanguageBundle, MergeSummary, KEY_COLUMN,
};
pub use translate::{target_languages, translation_rows, TRANSLATION_HEADER};
