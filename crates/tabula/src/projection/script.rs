//! Writer rows (`GENERATOR`) to engine dialogue rows (`storyScripts`).

use tracing::debug;

use crate::error::{Result, TabulaError};
use crate::reference::{CompositeIndex, ReferenceBundle};
use crate::table::{HeaderIndex, ReferenceTable, Table};

use super::{require_columns, ProjectedRow, SourceRow};

/// Writer type label closing a scene.
pub const END_MARKER: &str = "종료";

/// Columns every writer sheet must have.
pub const SCRIPT_INPUT_COLUMNS: &[&str] = &[
    "sceneId", "Row", "TextNum", "shot", "FX", "type", "Speaker", "Text",
];

/// Columns the engine script sheet must have.
pub const STORY_SCRIPT_COLUMNS: &[&str] = &[
    "sceneId",
    "speaker",
    "shot",
    "index",
    "type",
    "value",
    "next",
    "tag",
    "wait",
    "posReset",
    "layer",
    "bonusScore",
    "assetId",
    "assetName",
    "textKey",
    "translation-koKr",
    "bonusId",
    "bonusLabel",
    "actionId",
    "#Order",
];

/// Columns copied verbatim from writer row to script row.
const PASSTHROUGH_COLUMNS: &[&str] = &[
    "shot",
    "value",
    "next",
    "tag",
    "wait",
    "posReset",
    "layer",
    "bonusScore",
    "#Order",
];

const BACKGROUND_KIND: &str = "BACKGROUND";
const BRANCH_TYPE: &str = "branch";
const CHOICE_TYPE: &str = "choice";
const NO_TYPE: &str = "NONE";

/// Lookup indexes the script projection resolves names through.
#[derive(Debug, Clone)]
pub struct ScriptIndexes {
    pub speaker: CompositeIndex,
    pub enums: CompositeIndex,
    pub assets: CompositeIndex,
    pub characters: CompositeIndex,
    pub costumes: CompositeIndex,
    pub character_assets: CompositeIndex,
    pub bonuses: CompositeIndex,
    pub actions: CompositeIndex,
    pub spaces: CompositeIndex,
    pub space_assets: CompositeIndex,
}

impl ScriptIndexes {
    /// Build every index from the writer's `speaker` sheet and the master reference tables.
    pub fn build(speaker: &ReferenceTable, refs: &ReferenceBundle) -> Result<Self> {
        Ok(Self {
            speaker: CompositeIndex::build(speaker, &["speaker"], "key")?,
            enums: refs.index("enum", &["#Name"], "Name")?,
            assets: refs.index("assets", &["#Name"], "id")?,
            characters: refs.index("characters", &["#Name"], "id")?,
            costumes: refs.index("characterCostumes", &["#Name"], "id")?,
            character_assets: refs.index(
                "characterAssets",
                &[
                    "#CharacterAssetKind",
                    "#CharacterId",
                    "#CostumeId",
                    "#Emotion",
                    "#Order",
                ],
                "assetId",
            )?,
            bonuses: refs.index("storyBonus", &["#Name"], "id")?,
            actions: refs.index("storyScriptActions", &["#Name"], "id")?,
            spaces: refs.index("spaces", &["#Name"], "id")?,
            space_assets: refs.index("spaceAssets", &["spaceId", "kind", "timeOfDay"], "assetId")?,
        })
    }
}

/// State carried from one writer row to the next.
#[derive(Debug, Clone, Default)]
pub struct ScriptFold {
    /// `index` of the most recent `branch` row; choices label themselves with it.
    pub last_branch_index: String,
}

/// A localization key produced for a line of dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    pub key: String,
    pub text: String,
}

/// One projected script row and the text key it introduced, if any.
#[derive(Debug, Clone)]
pub struct ScriptLine {
    pub cells: Vec<String>,
    pub text: Option<TextEntry>,
}

/// Projects writer rows into engine script rows.
pub struct ScriptProjector<'a> {
    indexes: &'a ScriptIndexes,
    input: &'a HeaderIndex,
    target: &'a HeaderIndex,
    width: usize,
}

impl<'a> ScriptProjector<'a> {
    /// Both schemas are checked up front so a batch never fails half way on a missing column.
    pub fn new(
        indexes: &'a ScriptIndexes,
        input: &'a HeaderIndex,
        target: &'a HeaderIndex,
        width: usize,
    ) -> Result<Self> {
        require_columns(input, SCRIPT_INPUT_COLUMNS)?;
        require_columns(target, STORY_SCRIPT_COLUMNS)?;
        Ok(Self {
            indexes,
            input,
            target,
            width,
        })
    }

    /// Project one writer row.
    pub fn project(&self, cells: &[String], fold: &mut ScriptFold) -> Result<ScriptLine> {
        let row = SourceRow::new(self.input, cells);
        let idx = self.indexes;

        let scene_id = row.get("sceneId");
        let index = row_index(
            row.get("shot"),
            row.get("Row"),
            row.get("TextNum"),
            row.get("FX"),
        );

        let type_id = if row.has("type") {
            idx.enums.name_to_value(row.get("type"))?
        } else {
            NO_TYPE.to_string()
        };
        let speaker = idx.speaker.name_to_value(row.get("Speaker"))?;
        let action_id = idx.actions.name_to_value(row.get("actionId"))?;

        let text = row.raw("Text");
        let text = (!text.trim().is_empty()).then(|| TextEntry {
            key: format!("{scene_id}_{index}"),
            text: text.to_string(),
        });

        if type_id.trim() == BRANCH_TYPE {
            fold.last_branch_index = index.clone();
        }

        let (bonus_id, bonus_label) = if type_id.trim() == CHOICE_TYPE {
            (
                idx.bonuses.name_to_value(row.get("bonusId"))?,
                format!("{}_{}", CHOICE_TYPE, fold.last_branch_index.trim()),
            )
        } else {
            (String::new(), String::new())
        };

        let (asset_id, asset_name) = self.resolve_asset(&row, &type_id)?;

        let mut out = ProjectedRow::new(self.target, self.width);
        for column in PASSTHROUGH_COLUMNS {
            out.set(column, row.raw(column))?;
        }
        out.set("sceneId", scene_id)?
            .set("speaker", speaker)?
            .set("index", index.as_str())?
            .set("type", type_id.as_str())?
            .set("assetId", asset_id)?
            .set("assetName", asset_name)?
            .set("bonusId", bonus_id)?
            .set("bonusLabel", bonus_label)?
            .set("actionId", action_id)?;
        if let Some(entry) = &text {
            out.set("textKey", entry.key.as_str())?
                .set("translation-koKr", entry.text.as_str())?;
        }

        Ok(ScriptLine {
            cells: out.into_cells(),
            text,
        })
    }

    /// `(assetId, assetName)` for a row. Character assets take precedence
    /// over backgrounds, backgrounds over effects.
    fn resolve_asset(&self, row: &SourceRow<'_>, type_id: &str) -> Result<(String, String)> {
        let idx = self.indexes;

        if row.has("CharacterAssetKind") {
            let kind = idx.enums.name_to_value(row.get("CharacterAssetKind"))?;
            let character = idx.characters.name_to_value(row.get("CharacterId"))?;
            let costume = idx.costumes.name_to_value(row.get("CostumeId"))?;
            let emotion = idx.enums.name_to_value(row.get("Emotion"))?;
            let number = row.get("CharacterAssetNum");

            let asset = idx
                .character_assets
                .get(&[
                    kind.as_str(),
                    character.as_str(),
                    costume.as_str(),
                    emotion.as_str(),
                    number,
                ])
                .unwrap_or_default()
                .to_string();
            return Ok((asset, character));
        }

        if row.has("spaceName") {
            let space_name = row.get("spaceName");
            let space = idx.spaces.name_to_value(space_name)?;
            let time_of_day = idx.enums.name_to_value(row.get("timeOfDay"))?;
            if time_of_day.trim().is_empty() {
                return Err(TabulaError::UnresolvedReference {
                    entity: "time of day for space".to_string(),
                    value: space_name.to_string(),
                });
            }

            let asset = idx
                .space_assets
                .get(&[space.as_str(), BACKGROUND_KIND, time_of_day.as_str()])
                .unwrap_or_default()
                .to_string();
            return Ok((asset, type_id.to_string()));
        }

        if row.has("fxAssetId") {
            let asset = idx.assets.name_to_value(row.get("fxAssetId"))?;
            return Ok((asset, type_id.to_string()));
        }

        Ok((String::new(), String::new()))
    }
}

/// Projected rows for one run, plus the text keys and scenes they cover.
#[derive(Debug, Clone, Default)]
pub struct ScriptBatch {
    pub rows: Vec<Vec<String>>,
    pub text_entries: Vec<TextEntry>,
    pub scenes: Vec<String>,
}

impl ScriptBatch {
    /// Project every writer row below the header.
    ///
    /// An end marker row is appended when the sheet does not already end
    /// with one. Rows without a `sceneId` are skipped. Any unresolved
    /// mandatory reference aborts the whole batch.
    pub fn project(generator: &Table, projector: &ScriptProjector<'_>) -> Result<Self> {
        let body = with_end_marker(projector.input, generator.body(1).to_vec(), generator.width())?;

        let mut batch = ScriptBatch::default();
        let mut fold = ScriptFold::default();

        for (i, cells) in body.iter().enumerate() {
            let row = SourceRow::new(projector.input, cells);
            let scene_id = row.get("sceneId");
            if scene_id.is_empty() {
                debug!(row = i + 2, "skipping writer row without sceneId");
                continue;
            }
            if !batch.scenes.iter().any(|s| s == scene_id) {
                batch.scenes.push(scene_id.to_string());
            }

            let line = projector.project(cells, &mut fold)?;
            batch.text_entries.extend(line.text);
            batch.rows.push(line.cells);
        }

        Ok(batch)
    }
}

/// Synthetic `index`: shot, 3-digit row, 3-digit text number, effect.
pub fn row_index(shot: &str, row: &str, text_num: &str, fx: &str) -> String {
    format!(
        "{}{:03}{:03}{}",
        shot.trim(),
        leading_int(row),
        leading_int(text_num),
        fx.trim()
    )
}

/// Integer prefix of a cell (`"12"`, `"12.0"`, `"-3x"`), or 0 when there is none.
pub fn leading_int(value: &str) -> i64 {
    let value = value.trim();
    let (sign, digits) = match value.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, value.strip_prefix('+').unwrap_or(value)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

/// Append a closing row unless the last non-blank writer row already is one.
///
/// The closing row repeats the scene, shot and effect of the last row with `Row` + 1.
pub fn with_end_marker(
    input: &HeaderIndex,
    mut rows: Vec<Vec<String>>,
    width: usize,
) -> Result<Vec<Vec<String>>> {
    let Some(last) = rows
        .iter()
        .rev()
        .find(|r| r.iter().any(|c| !c.trim().is_empty()))
    else {
        return Ok(rows);
    };

    let last = SourceRow::new(input, last);
    if last.get("type") == END_MARKER {
        return Ok(rows);
    }

    let mut end = ProjectedRow::new(input, width);
    end.set("sceneId", last.get("sceneId"))?
        .set("Row", (leading_int(last.get("Row")) + 1).to_string())?
        .set("FX", last.get("FX"))?
        .set("shot", last.get("shot"))?
        .set("type", END_MARKER)?;
    let end = end.into_cells();

    rows.push(end);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    fn reference(name: &str, header: &[&str], rows: &[&[&str]]) -> ReferenceTable {
        let mut all: Vec<Vec<&str>> = vec![header.to_vec(), vec![], vec![]];
        all.extend(rows.iter().map(|r| r.to_vec()));
        Table::from_rows(name, all).to_reference(3)
    }

    fn bundle() -> ReferenceBundle {
        let mut refs = ReferenceBundle::default();
        refs.insert(reference(
            "enum",
            &["Type", "Name", "#Name"],
            &[
                &["ScriptType", "talk", "대사"],
                &["ScriptType", "branch", "분기"],
                &["ScriptType", "choice", "선택지"],
                &["ScriptType", "background", "배경"],
                &["ScriptType", "end", "종료"],
                &["AssetKind", "PORTRAIT", "초상"],
                &["Emotion", "HAPPY", "기쁨"],
                &["TimeOfDay", "NIGHT", "밤"],
            ],
        ));
        refs.insert(reference("assets", &["id", "#Name"], &[&["fx_rain", "비"]]));
        refs.insert(reference("characters", &["id", "#Name"], &[&["c_mina", "미나"]]));
        refs.insert(reference(
            "characterCostumes",
            &["id", "#Name"],
            &[&["cos_school", "교복"]],
        ));
        refs.insert(reference(
            "characterAssets",
            &[
                "assetId",
                "#CharacterAssetKind",
                "#CharacterId",
                "#CostumeId",
                "#Emotion",
                "#Order",
            ],
            &[&["a_mina_happy_1", "PORTRAIT", "c_mina", "cos_school", "HAPPY", "1"]],
        ));
        refs.insert(reference("storyBonus", &["id", "#Name"], &[&["bonus_cool", "쿨"]]));
        refs.insert(reference(
            "storyScriptActions",
            &["id", "#Name"],
            &[&["act_shake", "흔들기"]],
        ));
        refs.insert(reference("spaces", &["id", "#Name"], &[&["sp_cafe", "카페"]]));
        refs.insert(reference(
            "spaceAssets",
            &["assetId", "spaceId", "kind", "timeOfDay"],
            &[&["bg_cafe_night", "sp_cafe", "BACKGROUND", "NIGHT"]],
        ));
        refs
    }

    fn indexes() -> ScriptIndexes {
        let speaker = Table::from_rows("speaker", vec![vec!["speaker", "key"], vec!["미나", "c_mina"]])
            .to_reference(1);
        ScriptIndexes::build(&speaker, &bundle()).unwrap()
    }

    const INPUT_HEADER: &[&str] = &[
        "sceneId",
        "Row",
        "TextNum",
        "shot",
        "FX",
        "type",
        "Speaker",
        "Text",
        "bonusId",
        "CharacterAssetKind",
        "CharacterId",
        "CostumeId",
        "Emotion",
        "CharacterAssetNum",
        "spaceName",
        "timeOfDay",
        "fxAssetId",
        "actionId",
    ];

    fn writer_row(fields: &[(&str, &str)]) -> Vec<String> {
        INPUT_HEADER
            .iter()
            .map(|h| {
                fields
                    .iter()
                    .find(|(k, _)| k == h)
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_default()
            })
            .collect()
    }

    fn schemas() -> (HeaderIndex, HeaderIndex) {
        let input: Vec<String> = INPUT_HEADER.iter().map(|s| s.to_string()).collect();
        let target: Vec<String> = STORY_SCRIPT_COLUMNS.iter().map(|s| s.to_string()).collect();
        (
            HeaderIndex::new("GENERATOR", &input),
            HeaderIndex::new("storyScripts", &target),
        )
    }

    #[test]
    fn test_row_index_is_zero_padded() {
        assert_eq!(row_index("A", "7", "12", "F"), "A007012F");
        assert_eq!(row_index("A", "", "", ""), "A000000");
        assert_eq!(row_index("B", "3.0", "1", ""), "B003001");
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("42"), 42);
        assert_eq!(leading_int(" 7 "), 7);
        assert_eq!(leading_int("12abc"), 12);
        assert_eq!(leading_int("-3"), -3);
        assert_eq!(leading_int("abc"), 0);
        assert_eq!(leading_int(""), 0);
    }

    #[test]
    fn test_dialogue_line() {
        let indexes = indexes();
        let (input, target) = schemas();
        let projector = ScriptProjector::new(&indexes, &input, &target, STORY_SCRIPT_COLUMNS.len()).unwrap();

        let row = writer_row(&[
            ("sceneId", "S1"),
            ("Row", "1"),
            ("TextNum", "2"),
            ("shot", "A"),
            ("type", "대사"),
            ("Speaker", "미나"),
            ("Text", "안녕"),
            ("CharacterAssetKind", "초상"),
            ("CharacterId", "미나"),
            ("CostumeId", "교복"),
            ("Emotion", "기쁨"),
            ("CharacterAssetNum", "1"),
            ("actionId", "흔들기"),
        ]);

        let line = projector.project(&row, &mut ScriptFold::default()).unwrap();

        let get = |col: &str| line.cells[target.position(col).unwrap()].as_str();
        assert_eq!(get("index"), "A001002");
        assert_eq!(get("type"), "talk");
        assert_eq!(get("speaker"), "c_mina");
        assert_eq!(get("assetId"), "a_mina_happy_1");
        assert_eq!(get("assetName"), "c_mina");
        assert_eq!(get("actionId"), "act_shake");
        assert_eq!(get("textKey"), "S1_A001002");
        assert_eq!(get("translation-koKr"), "안녕");
        assert_eq!(
            line.text,
            Some(TextEntry {
                key: "S1_A001002".into(),
                text: "안녕".into()
            })
        );
    }

    #[test]
    fn test_choice_carries_last_branch_index() {
        let indexes = indexes();
        let (input, target) = schemas();
        let projector = ScriptProjector::new(&indexes, &input, &target, STORY_SCRIPT_COLUMNS.len()).unwrap();
        let mut fold = ScriptFold::default();

        let branch = writer_row(&[("sceneId", "S1"), ("Row", "4"), ("shot", "A"), ("type", "분기")]);
        let choice = writer_row(&[
            ("sceneId", "S1"),
            ("Row", "5"),
            ("shot", "A"),
            ("type", "선택지"),
            ("bonusId", "쿨"),
        ]);

        projector.project(&branch, &mut fold).unwrap();
        assert_eq!(fold.last_branch_index, "A004000");

        let line = projector.project(&choice, &mut fold).unwrap();
        let get = |col: &str| line.cells[target.position(col).unwrap()].as_str();
        assert_eq!(get("bonusId"), "bonus_cool");
        assert_eq!(get("bonusLabel"), "choice_A004000");
        assert!(line.text.is_none());
    }

    #[test]
    fn test_background_requires_time_of_day() {
        let indexes = indexes();
        let (input, target) = schemas();
        let projector = ScriptProjector::new(&indexes, &input, &target, STORY_SCRIPT_COLUMNS.len()).unwrap();

        let ok = writer_row(&[
            ("sceneId", "S1"),
            ("type", "배경"),
            ("spaceName", "카페"),
            ("timeOfDay", "밤"),
        ]);
        let line = projector.project(&ok, &mut ScriptFold::default()).unwrap();
        let get = |col: &str| line.cells[target.position(col).unwrap()].as_str();
        assert_eq!(get("assetId"), "bg_cafe_night");
        assert_eq!(get("assetName"), "background");

        let missing = writer_row(&[("sceneId", "S1"), ("type", "배경"), ("spaceName", "카페")]);
        let err = projector.project(&missing, &mut ScriptFold::default()).unwrap_err();
        assert!(matches!(err, TabulaError::UnresolvedReference { ref value, .. } if value == "카페"));
    }

    #[test]
    fn test_empty_type_is_none_and_unknown_type_is_blank() {
        let indexes = indexes();
        let (input, target) = schemas();
        let projector = ScriptProjector::new(&indexes, &input, &target, STORY_SCRIPT_COLUMNS.len()).unwrap();
        let type_col = target.position("type").unwrap();

        let line = projector
            .project(&writer_row(&[("sceneId", "S1"), ("fxAssetId", "비")]), &mut ScriptFold::default())
            .unwrap();
        assert_eq!(line.cells[type_col], "NONE");
        assert_eq!(line.cells[target.position("assetId").unwrap()], "fx_rain");
        assert_eq!(line.cells[target.position("assetName").unwrap()], "NONE");

        let line = projector
            .project(&writer_row(&[("sceneId", "S1"), ("type", "없는타입")]), &mut ScriptFold::default())
            .unwrap();
        assert_eq!(line.cells[type_col], "");
    }

    #[test]
    fn test_missing_input_column_fails_up_front() {
        let indexes = indexes();
        let (_, target) = schemas();
        let input = HeaderIndex::new("GENERATOR", &["sceneId".to_string()]);
        let err = ScriptProjector::new(&indexes, &input, &target, 20).err().unwrap();
        assert!(matches!(err, TabulaError::Schema { ref column, .. } if column == "Row"));
    }

    #[test]
    fn test_end_marker_appended_once() {
        let (input, _) = schemas();
        let rows = vec![writer_row(&[
            ("sceneId", "S1"),
            ("Row", "9"),
            ("shot", "B"),
            ("FX", "F"),
            ("type", "대사"),
        ])];

        let rows = with_end_marker(&input, rows, INPUT_HEADER.len()).unwrap();
        assert_eq!(rows.len(), 2);
        let end = SourceRow::new(&input, &rows[1]);
        assert_eq!(end.get("type"), END_MARKER);
        assert_eq!(end.get("Row"), "10");
        assert_eq!(end.get("shot"), "B");
        assert_eq!(end.get("FX"), "F");

        let rows = with_end_marker(&input, rows, INPUT_HEADER.len()).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_batch_skips_rows_without_scene() {
        let indexes = indexes();
        let (input, target) = schemas();
        let projector = ScriptProjector::new(&indexes, &input, &target, STORY_SCRIPT_COLUMNS.len()).unwrap();

        let mut rows: Vec<Vec<String>> = vec![INPUT_HEADER.iter().map(|s| s.to_string()).collect()];
        rows.push(writer_row(&[("Text", "orphan")]));
        rows.push(writer_row(&[("sceneId", "S2"), ("Row", "1"), ("shot", "A"), ("Text", "하나")]));
        rows.push(writer_row(&[("sceneId", "S2"), ("Row", "2"), ("shot", "A"), ("Text", "둘")]));
        let generator = Table::new("GENERATOR", rows);

        let batch = ScriptBatch::project(&generator, &projector).unwrap();
        assert_eq!(batch.scenes, vec!["S2"]);
        // Two lines plus the synthetic end row.
        assert_eq!(batch.rows.len(), 3);
        assert_eq!(batch.text_entries.len(), 2);
        assert_eq!(batch.text_entries[1].key, "S2_A002000");
    }
}
