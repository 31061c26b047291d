//! Generated script rows (`script_generator`) back into writer rows (`GENERATOR`).

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{Result, TabulaError};
use crate::table::{cell, HeaderIndex, Table};

use super::{require_columns, ProjectedRow, SourceRow};

/// Columns of a generated script sheet.
pub const GENERATED_SCRIPT_COLUMNS: &[&str] =
    &["sceneId", "speaker", "text", "choice_grade", "reply_text"];

const WRITER_COLUMNS: &[&str] = &[
    "sceneId", "type", "spaceName", "Text", "Speaker", "next", "value", "tag", "isEnd",
];

const BACKGROUND: &str = "배경";
const NARRATION: &str = "지문";
const PROTAGONIST: &str = "주인공";
const CHOICE: &str = "선택지";
const DIALOGUE: &str = "대사";
const PLAYER_SPEAKER: &str = "유저";

/// Quality grade of a generated choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceGrade {
    Cool,
    Brilliant,
    Awesome,
}

impl ChoiceGrade {
    /// Branch label the choice jumps to.
    pub fn branch(&self) -> &'static str {
        match self {
            ChoiceGrade::Cool => "#1",
            ChoiceGrade::Brilliant => "#2",
            ChoiceGrade::Awesome => "#3",
        }
    }
}

impl FromStr for ChoiceGrade {
    type Err = TabulaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "COOL" => Ok(ChoiceGrade::Cool),
            "BRILLIANT" => Ok(ChoiceGrade::Brilliant),
            "AWESOME" => Ok(ChoiceGrade::Awesome),
            other => Err(TabulaError::Config(format!("Unknown choice grade: {other}"))),
        }
    }
}

/// Turn generated script rows into writer rows.
///
/// Each scene opens with a background row located where `script_info`
/// says the scene takes place and closes with an `isEnd` row. A choice
/// emits the player's reply line before the choice itself; both carry
/// the grade's branch label.
pub fn transfer_script(
    generated: &Table,
    script_info: &Table,
    writer_header: &[String],
) -> Result<Vec<Vec<String>>> {
    let source = generated.header_index();
    require_columns(&source, GENERATED_SCRIPT_COLUMNS)?;

    let target = HeaderIndex::new("GENERATOR", writer_header);
    require_columns(&target, WRITER_COLUMNS)?;
    let width = writer_header.len();

    let info = script_info.header_index();
    let info_scene = info.require("sceneId")?;
    let info_location = info.require("location")?;
    let locations: HashMap<&str, &str> = script_info
        .body(1)
        .iter()
        .map(|row| (cell(row, info_scene).trim(), cell(row, info_location)))
        .collect();

    let body = generated.body(1);
    let mut out = Vec::new();

    for (i, cells) in body.iter().enumerate() {
        let row = SourceRow::new(&source, cells);
        let scene_id = row.get("sceneId");
        let scene_at = |j: usize| SourceRow::new(&source, &body[j]).get("sceneId");

        let starts_scene = i == 0 || scene_at(i - 1) != scene_id;
        let ends_scene = i + 1 == body.len() || scene_at(i + 1) != scene_id;

        if starts_scene {
            let mut start = ProjectedRow::new(&target, width);
            start
                .set("sceneId", scene_id)?
                .set("type", BACKGROUND)?
                .set("spaceName", locations.get(scene_id).copied().unwrap_or_default())?;
            out.push(start.into_cells());
        }

        let mut line = ProjectedRow::new(&target, width);
        line.set("sceneId", scene_id)?;

        match row.get("speaker") {
            NARRATION => {
                line.set("type", NARRATION)?.set("Text", row.raw("text"))?;
            }
            PROTAGONIST => {
                line.set("type", DIALOGUE)?
                    .set("Speaker", PLAYER_SPEAKER)?
                    .set("Text", row.raw("text"))?;
            }
            CHOICE => {
                let grade = row.get("choice_grade");
                let branch = grade.parse::<ChoiceGrade>().ok().map(|g| g.branch());

                line.set("type", CHOICE)?.set("Text", row.raw("text"))?;
                if let Some(branch) = branch {
                    line.set("next", branch)?;
                }

                let mut reply = ProjectedRow::new(&target, width);
                reply
                    .set("sceneId", scene_id)?
                    .set("value", grade)?
                    .set("type", DIALOGUE)?
                    .set("Speaker", PLAYER_SPEAKER)?
                    .set("Text", row.raw("reply_text"))?
                    .set("tag", branch.unwrap_or_default())?;
                out.push(reply.into_cells());
            }
            speaker => {
                line.set("type", DIALOGUE)?
                    .set("Speaker", speaker)?
                    .set("Text", row.raw("text"))?;
            }
        }
        out.push(line.into_cells());

        if ends_scene {
            let mut end = ProjectedRow::new(&target, width);
            end.set("sceneId", scene_id)?.set("isEnd", "TRUE")?;
            out.push(end.into_cells());
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer_header() -> Vec<String> {
        [
            "sceneId", "Row", "type", "Speaker", "Text", "next", "value", "tag", "spaceName", "isEnd",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn field<'a>(header: &[String], row: &'a [String], name: &str) -> &'a str {
        let pos = header.iter().position(|h| h == name).unwrap();
        row[pos].as_str()
    }

    #[test]
    fn test_scene_framing_and_choice() {
        let generated = Table::from_rows(
            "script_generator",
            vec![
                vec!["sceneId", "speaker", "text", "choice_grade", "reply_text"],
                vec!["S1", "지문", "비가 온다", "", ""],
                vec!["S1", "선택지", "우산을 씌워준다", "BRILLIANT", "같이 쓰자"],
                vec!["S2", "미나", "고마워", "", ""],
                vec!["S2", "주인공", "별말을", "", ""],
            ],
        );
        let info = Table::from_rows(
            "script_info",
            vec![vec!["sceneId", "location"], vec!["S1", "카페"], vec!["S2", "공원"]],
        );
        let header = writer_header();

        let rows = transfer_script(&generated, &info, &header).unwrap();
        let types: Vec<&str> = rows.iter().map(|r| field(&header, r, "type")).collect();
        assert_eq!(
            types,
            vec!["배경", "지문", "대사", "선택지", "", "배경", "대사", "대사", ""]
        );

        assert_eq!(field(&header, &rows[0], "spaceName"), "카페");
        assert_eq!(field(&header, &rows[5], "spaceName"), "공원");

        // Reply precedes the choice and both carry the branch label.
        assert_eq!(field(&header, &rows[2], "Speaker"), "유저");
        assert_eq!(field(&header, &rows[2], "Text"), "같이 쓰자");
        assert_eq!(field(&header, &rows[2], "value"), "BRILLIANT");
        assert_eq!(field(&header, &rows[2], "tag"), "#2");
        assert_eq!(field(&header, &rows[3], "next"), "#2");

        assert_eq!(field(&header, &rows[4], "isEnd"), "TRUE");
        assert_eq!(field(&header, &rows[6], "Speaker"), "미나");
        assert_eq!(field(&header, &rows[7], "Speaker"), "유저");
        assert_eq!(field(&header, &rows[8], "sceneId"), "S2");
    }

    #[test]
    fn test_unknown_grade_has_no_branch() {
        let generated = Table::from_rows(
            "script_generator",
            vec![
                vec!["sceneId", "speaker", "text", "choice_grade", "reply_text"],
                vec!["S1", "선택지", "글쎄", "MEH", "음"],
            ],
        );
        let info = Table::from_rows("script_info", vec![vec!["sceneId", "location"]]);
        let header = writer_header();

        let rows = transfer_script(&generated, &info, &header).unwrap();
        assert_eq!(field(&header, &rows[1], "tag"), "");
        assert_eq!(field(&header, &rows[2], "next"), "");
        assert_eq!(field(&header, &rows[0], "spaceName"), "");
    }

    #[test]
    fn test_grade_parse() {
        assert_eq!("COOL".parse::<ChoiceGrade>().unwrap().branch(), "#1");
        assert_eq!(" AWESOME ".parse::<ChoiceGrade>().unwrap().branch(), "#3");
        assert!("cool".parse::<ChoiceGrade>().is_err());
    }
}
