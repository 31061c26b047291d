//! Story generation inputs: per-line dialogue prompts and whole-scene prompts.

use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;
use crate::reference::{dictionary_by, records, CompositeIndex, ReferenceBundle, Record};
use crate::table::{cell, is_truthy, HeaderIndex, ReferenceTable, Table};

use super::{require_columns, ProjectedRow, SourceRow};

/// Columns of a dialogue generation request.
pub const DIALOGUE_STORY_COLUMNS: &[&str] = &[
    "sceneId",
    "key",
    "speaker",
    "emotion",
    "level",
    "direction",
    "location",
    "innerThought",
    "narrationTone",
    "writingStyle",
    "introContext",
    "model",
];

/// Columns of a full-story generation request.
pub const FULL_STORY_COLUMNS: &[&str] = &[
    "sceneId",
    "character",
    "level",
    "systemKind",
    "direction",
    "place",
    "location",
    "model",
    "temperature",
];

fn header_row(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

/// Scene ids flagged `isGenerate`.
fn scenes_to_generate(table: &Table) -> Result<HashSet<String>> {
    let header = table.header_index();
    let scene_col = header.require("sceneId")?;
    let flag_col = header.require("isGenerate")?;

    Ok(table
        .body(1)
        .iter()
        .filter(|row| is_truthy(cell(row, flag_col)))
        .map(|row| cell(row, scene_col).trim().to_string())
        .filter(|id| !id.is_empty())
        .collect())
}

/// Resolves a space to localized text through title/description keys.
struct SpaceText {
    titles: CompositeIndex,
    descriptions: CompositeIndex,
    localization: CompositeIndex,
}

impl SpaceText {
    fn build(refs: &ReferenceBundle, space_key: &str) -> Result<Self> {
        Ok(Self {
            titles: refs.index("spaces", &[space_key], "title")?,
            descriptions: refs.index("spaces", &[space_key], "description")?,
            localization: refs.index("localization", &["key"], "ko-KR")?,
        })
    }

    /// `(title, description)` in Korean; unknown parts are empty.
    fn parts(&self, space: &str) -> Result<(String, String)> {
        let title_key = self.titles.name_to_value(space)?;
        let description_key = self.descriptions.name_to_value(space)?;
        Ok((
            self.localization.name_to_value(&title_key)?,
            self.localization.name_to_value(&description_key)?,
        ))
    }
}

/// Builds per-line dialogue generation rows from `dialog_generator`.
pub struct DialogueStoryProjector {
    speakers: CompositeIndex,
    models: CompositeIndex,
    enums: CompositeIndex,
    spaces: SpaceText,
}

impl DialogueStoryProjector {
    /// `speakers` is the story workbook's `dialogSpeaker` sheet.
    pub fn new(speakers: &ReferenceTable, refs: &ReferenceBundle) -> Result<Self> {
        Ok(Self {
            speakers: CompositeIndex::build(speakers, &["Name"], "id")?,
            models: CompositeIndex::build(speakers, &["id"], "model")?,
            enums: refs.index("enum", &["#Name"], "Name")?,
            spaces: SpaceText::build(refs, "#Name")?,
        })
    }

    /// Rows (header first) for every dialogue line of a scene flagged for generation.
    ///
    /// A line without its own location uses the scene's. Locations are
    /// rendered as localized title, newline, localized description.
    pub fn project(&self, dialogs: &Table, scene_info: &Table) -> Result<Vec<Vec<String>>> {
        let selected = scenes_to_generate(scene_info)?;
        let scenes = dictionary_by(
            records(scene_info)
                .into_iter()
                .filter(|r| selected.contains(field(r, "sceneId").trim()))
                .collect(),
            "sceneId",
        );

        let input = dialogs.header_index();
        require_columns(&input, &["sceneId", "key", "speaker", "emotion", "level", "direction", "location"])?;
        let target = HeaderIndex::new("story-generate", &header_row(DIALOGUE_STORY_COLUMNS));

        let mut rows = vec![header_row(DIALOGUE_STORY_COLUMNS)];
        for cells in dialogs.body(1) {
            let row = SourceRow::new(&input, cells);
            let scene_id = row.get("sceneId");
            if !selected.contains(scene_id) {
                continue;
            }
            let scene = scenes.get(scene_id);
            let scene_field = |name: &str| scene.map(|s| field(s, name)).unwrap_or_default().to_string();

            let speaker = self.speakers.name_to_value(row.get("speaker"))?;
            let model = self.models.name_to_value(&speaker)?;
            let emotion = self.enums.name_to_value(row.get("emotion"))?;

            let location = if row.has("location") {
                row.get("location").to_string()
            } else {
                scene_field("location")
            };
            let (title, description) = self.spaces.parts(location.trim())?;

            let mut out = ProjectedRow::new(&target, DIALOGUE_STORY_COLUMNS.len());
            out.set("sceneId", scene_id)?
                .set("key", row.raw("key"))?
                .set("speaker", speaker)?
                .set("emotion", emotion)?
                .set("level", row.raw("level"))?
                .set("direction", row.raw("direction"))?
                .set("location", format!("{title}\n{description}"))?
                .set("narrationTone", scene_field("narrationTone"))?
                .set("writingStyle", scene_field("writingStyle"))?
                .set("introContext", scene_field("introContext"))?
                .set("model", model)?;
            rows.push(out.into_cells());
        }

        debug!(
            scenes = selected.len(),
            lines = rows.len() - 1,
            "dialogue story rows built"
        );
        Ok(rows)
    }
}

/// Builds whole-scene generation rows from `script_info`.
pub struct FullStoryProjector {
    speakers: CompositeIndex,
    systems: CompositeIndex,
    space_ids: CompositeIndex,
    space_parents: CompositeIndex,
    spaces: SpaceText,
    emotions: Vec<String>,
}

impl FullStoryProjector {
    /// `speakers` is `dialogSpeaker`, `systems` is `ref_system`; both have a single header row.
    pub fn new(speakers: &ReferenceTable, systems: &ReferenceTable, refs: &ReferenceBundle) -> Result<Self> {
        let enums = refs.get("enum")?;
        let enum_header = enums.header_index();
        let type_col = enum_header.require("Type")?;
        let name_col = enum_header.require("Name")?;
        let emotions = enums
            .rows
            .iter()
            .filter(|row| cell(row, type_col).trim() == "Emotion")
            .map(|row| cell(row, name_col).to_string())
            .collect();

        Ok(Self {
            speakers: CompositeIndex::build(speakers, &["Name"], "id")?,
            systems: CompositeIndex::build(systems, &["Name"], "id")?,
            space_ids: refs.index("spaces", &["#Name"], "id")?,
            space_parents: refs.index("spaces", &["#Name"], "parentId")?,
            spaces: SpaceText::build(refs, "id")?,
            emotions,
        })
    }

    /// Enum names of type `Emotion`, in table order.
    pub fn emotions(&self) -> &[String] {
        &self.emotions
    }

    /// Rows (header first) for every scene flagged for generation.
    ///
    /// `location` describes the scene's space, `place` the space containing it.
    pub fn project(&self, script_info: &Table) -> Result<Vec<Vec<String>>> {
        let selected = scenes_to_generate(script_info)?;
        let input = script_info.header_index();
        require_columns(
            &input,
            &["character", "level", "systemKind", "DirectionWithContext", "location", "model", "temperature"],
        )?;
        let target = HeaderIndex::new("full-story-generate", &header_row(FULL_STORY_COLUMNS));

        let mut rows = vec![header_row(FULL_STORY_COLUMNS)];
        for cells in script_info.body(1) {
            let row = SourceRow::new(&input, cells);
            let scene_id = row.get("sceneId");
            if !selected.contains(scene_id) {
                continue;
            }

            let location_name = row.get("location");
            let location_id = self.space_ids.name_to_value(location_name)?;
            let place_id = self.space_parents.name_to_value(location_name)?;

            let mut out = ProjectedRow::new(&target, FULL_STORY_COLUMNS.len());
            out.set("sceneId", scene_id)?
                .set("character", self.speakers.name_to_value(row.get("character"))?)?
                .set("level", row.raw("level"))?
                .set("systemKind", self.systems.name_to_value(row.get("systemKind"))?)?
                .set("direction", row.raw("DirectionWithContext"))?
                .set("place", self.describe(&place_id)?)?
                .set("location", self.describe(&location_id)?)?
                .set("model", row.raw("model"))?
                .set("temperature", row.raw("temperature"))?;
            rows.push(out.into_cells());
        }

        debug!(scenes = rows.len() - 1, "full story rows built");
        Ok(rows)
    }

    /// Each localized part followed by a newline.
    fn describe(&self, space_id: &str) -> Result<String> {
        let (title, description) = self.spaces.parts(space_id)?;
        Ok(format!("{title}\n{description}\n"))
    }
}

fn field<'a>(record: &'a Record, name: &str) -> &'a str {
    record.get(name).map(String::as_str).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(name: &str, rows: Vec<Vec<&str>>) -> ReferenceTable {
        let mut all = vec![rows[0].clone(), vec![], vec![]];
        all.extend(rows.into_iter().skip(1));
        Table::from_rows(name, all).to_reference(3)
    }

    fn refs() -> ReferenceBundle {
        let mut refs = ReferenceBundle::default();
        refs.insert(reference(
            "enum",
            vec![
                vec!["Type", "Name", "#Name"],
                vec!["Emotion", "HAPPY", "기쁨"],
                vec!["Emotion", "SAD", "슬픔"],
                vec!["TimeOfDay", "NIGHT", "밤"],
            ],
        ));
        refs.insert(reference(
            "spaces",
            vec![
                vec!["id", "#Name", "parentId", "title", "description"],
                vec!["sp_town", "마을", "", "t_town", "d_town"],
                vec!["sp_cafe", "카페", "sp_town", "t_cafe", "d_cafe"],
            ],
        ));
        refs.insert(reference(
            "localization",
            vec![
                vec!["key", "ko-KR"],
                vec!["t_town", "작은 마을"],
                vec!["d_town", "바닷가 마을"],
                vec!["t_cafe", "카페"],
                vec!["d_cafe", "조용한 카페"],
            ],
        ));
        refs
    }

    fn speakers() -> ReferenceTable {
        Table::from_rows(
            "dialogSpeaker",
            vec![vec!["Name", "id", "model"], vec!["미나", "c_mina", "gpt-x"]],
        )
        .to_reference(1)
    }

    #[test]
    fn test_dialogue_rows() {
        let projector = DialogueStoryProjector::new(&speakers(), &refs()).unwrap();

        let scene_info = Table::from_rows(
            "scene_info",
            vec![
                vec!["sceneId", "narrationTone", "writingStyle", "introContext", "location", "isGenerate"],
                vec!["S1", "calm", "poetic", "rainy day", "카페", "TRUE"],
                vec!["S2", "", "", "", "마을", "false"],
            ],
        );
        let dialogs = Table::from_rows(
            "dialog_generator",
            vec![
                vec!["sceneId", "key", "speaker", "emotion", "level", "direction", "location"],
                vec!["S1", "k1", "미나", "기쁨", "2", "smile", ""],
                vec!["S1", "k2", "미나", "", "2", "", "마을"],
                vec!["S2", "k3", "미나", "", "", "", ""],
            ],
        );

        let rows = projector.project(&dialogs, &scene_info).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], "sceneId");

        let first = &rows[1];
        assert_eq!(first[2], "c_mina");
        assert_eq!(first[3], "HAPPY");
        assert_eq!(first[6], "카페\n조용한 카페");
        assert_eq!(first[8], "calm");
        assert_eq!(first[11], "gpt-x");

        assert_eq!(rows[2][6], "작은 마을\n바닷가 마을");
    }

    #[test]
    fn test_full_story_rows() {
        let systems = Table::from_rows("ref_system", vec![vec!["Name", "id"], vec!["데이트", "DATE"]])
            .to_reference(1);
        let projector = FullStoryProjector::new(&speakers(), &systems, &refs()).unwrap();
        assert_eq!(projector.emotions(), ["HAPPY", "SAD"]);

        let script_info = Table::from_rows(
            "script_info",
            vec![
                vec![
                    "sceneId",
                    "character",
                    "level",
                    "systemKind",
                    "DirectionWithContext",
                    "location",
                    "model",
                    "temperature",
                    "isGenerate",
                ],
                vec!["S1", "미나", "3", "데이트", "first date", "카페", "gpt-x", "0.7", "true"],
                vec!["S2", "미나", "3", "", "", "", "", "", ""],
            ],
        );

        let rows = projector.project(&script_info).unwrap();
        assert_eq!(rows.len(), 2);
        let row = &rows[1];
        assert_eq!(row[1], "c_mina");
        assert_eq!(row[3], "DATE");
        assert_eq!(row[4], "first date");
        assert_eq!(row[5], "작은 마을\n바닷가 마을\n");
        assert_eq!(row[6], "카페\n조용한 카페\n");
        assert_eq!(row[8], "0.7");
    }
}
