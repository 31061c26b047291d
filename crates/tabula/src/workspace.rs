//! Top-level operations over a workspace of workbooks.
//!
//! A workspace is a directory of workbook directories plus an optional
//! `tabula.toml`. Every operation reads what it needs fresh from the
//! workbooks, builds its output in memory, and only writes once the whole
//! output is built.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{TabulaConfig, CONFIG_FILE};
use crate::error::{Result, TabulaError};
use crate::localization::{
    export_bundles, merge_bundles, read_bundles, target_languages, translation_rows, ExportedFile,
    MergeSummary,
};
use crate::merge::{merge_upsert, SortKey};
use crate::projection::{
    transfer_script, DialogueStoryProjector, FullStoryProjector, ScriptBatch, ScriptIndexes,
    ScriptProjector, TextKeyStats, upsert_text_keys,
};
use crate::reference::{
    dictionary_by, records, CompositeIndex, RecordDictionary, ReferenceBundle, TableDirectory,
    REFERENCE_METADATA_ROWS,
};
use crate::remote::{
    is_reachable, sheet_to_csv, Environment, GenerationEndpoint, GenerationRequest,
    GenerationService, HttpGenerationClient, HttpSyncClient, PullRequest, PullResult,
    PushRequest, SheetMapping, SyncResult, SyncService,
};
use crate::table::{CsvWorkbook, TableStore};
use crate::validation::{
    results_table, Finding, FindingCounts, JsonColumnValidator, ScheduleValidator, Validator,
};

/// Writer sheet of the script generator workbook.
pub const GENERATOR_SHEET: &str = "GENERATOR";
/// Speaker sheet of the script generator workbook.
pub const SPEAKER_SHEET: &str = "speaker";
/// Engine script table.
pub const STORY_SCRIPTS_TABLE: &str = "storyScripts";
/// Master sheet receiving dialogue text keys.
pub const TEXT_KEY_SHEET: &str = "localization";
/// Speaker sheet of the story workbook and of the localization workbook.
pub const DIALOG_SPEAKER_SHEET: &str = "dialogSpeaker";
pub const DICTIONARY_SHEET: &str = "Dictionary";
pub const DIALOG_GENERATOR_SHEET: &str = "dialog_generator";
pub const SCENE_INFO_SHEET: &str = "scene_info";
pub const SCRIPT_INFO_SHEET: &str = "script_info";
pub const SCRIPT_GENERATOR_SHEET: &str = "script_generator";
pub const SYSTEM_SHEET: &str = "ref_system";

/// Findings of a schedule validation run.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub sheet: String,
    pub findings: Vec<Finding>,
    pub counts: FindingCounts,
}

impl ValidationReport {
    fn new(sheet: &str, findings: Vec<Finding>) -> Self {
        let counts = FindingCounts::of(&findings);
        Self {
            sheet: sheet.to_string(),
            findings,
            counts,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// What a script generation run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptReport {
    pub scenes: Vec<String>,
    /// Rows projected from the writer sheet.
    pub rows: usize,
    /// Rows in `storyScripts` after the merge.
    pub total_rows: usize,
    pub text_keys: TextKeyStats,
}

/// Outcome of pushing one sheet.
#[derive(Debug, Clone, Serialize)]
pub struct PushOutcome {
    pub sheet: String,
    pub table: String,
    pub result: SyncResult,
}

/// Outcome of pulling one sheet.
#[derive(Debug, Clone, Serialize)]
pub struct PullOutcome {
    pub sheet: String,
    pub table: String,
    pub exact: Option<bool>,
    pub result: PullResult,
}

/// Per-sheet result of a sync-all run.
#[derive(Debug, Clone, Serialize)]
pub struct SheetSync {
    pub sheet: String,
    pub table: String,
    pub result: std::result::Result<SyncResult, String>,
}

/// Health check result.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    pub url: String,
    pub status: u16,
    pub reachable: bool,
}

/// A workspace directory and its configuration.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    config: TabulaConfig,
}

impl Workspace {
    /// Open a workspace, reading `tabula.toml` from its root when present.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let config = TabulaConfig::load(&root.join(CONFIG_FILE))?;
        Ok(Self::with_config(root, config))
    }

    pub fn with_config(root: impl AsRef<Path>, config: TabulaConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &TabulaConfig {
        &self.config
    }

    /// Open a workbook by its path relative to the workspace root.
    ///
    /// The relative path is the workbook id.
    pub fn workbook(&self, file_id: &str) -> Result<CsvWorkbook> {
        Ok(CsvWorkbook::open(self.root.join(file_id))?.with_id(file_id))
    }

    pub fn master(&self) -> Result<CsvWorkbook> {
        self.workbook(&self.config.workbooks.master)
    }

    /// Workbook registered for `table` in the master table directory.
    fn owning_workbook(&self, master: &dyn TableStore, table: &str) -> Result<CsvWorkbook> {
        let directory = TableDirectory::load(master)?;
        self.workbook(directory.file_id(table)?)
    }

    fn glossary(&self) -> Result<RecordDictionary> {
        let book = self.workbook(&self.config.workbooks.dictionary)?;
        let table = book.read_table(DICTIONARY_SHEET)?;
        Ok(dictionary_by(records(&table), "ko-KR"))
    }

    /// Validate the character schedule and write the findings sheet.
    pub fn validate_schedule(&self, dry_run: bool) -> Result<ValidationReport> {
        let settings = &self.config.schedule;
        let book = self.workbook(&self.config.workbooks.schedule)?;
        let table = book.read_table(&settings.sheet)?;

        let findings = ScheduleValidator::new(settings.start_row).validate(&table)?;
        let report = ValidationReport::new(&settings.sheet, findings);
        info!(
            sheet = %settings.sheet,
            errors = report.counts.errors,
            warnings = report.counts.warnings,
            "schedule validated"
        );

        if !dry_run {
            book.write_table(&results_table(&settings.results_sheet, &report.findings))?;
        }
        Ok(report)
    }

    /// Check every `json`-typed column of a master sheet.
    pub fn validate_json(&self, sheet: &str) -> Result<ValidationReport> {
        let table = self.master()?.read_table(sheet)?;
        let findings = JsonColumnValidator.validate(&table)?;
        info!(sheet = %sheet, findings = findings.len(), "json columns validated");
        Ok(ValidationReport::new(sheet, findings))
    }

    fn json_dir(&self, dir: Option<&Path>) -> PathBuf {
        dir.map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.join(&self.config.localization.json_dir))
    }

    /// Write one JSON file per language of the localization sheet.
    pub fn export_json(&self, dir: Option<&Path>) -> Result<Vec<ExportedFile>> {
        let table = self.master()?.read_table(&self.config.localization.sheet)?;
        export_bundles(&table, &self.json_dir(dir))
    }

    /// Merge per-language JSON files back into the localization sheet.
    pub fn import_json(&self, dir: Option<&Path>, dry_run: bool) -> Result<MergeSummary> {
        let dir = self.json_dir(dir);
        let bundles = read_bundles(&dir)?;
        if bundles.is_empty() {
            return Err(TabulaError::EmptyData(format!(
                "No JSON files found in {}",
                dir.display()
            )));
        }

        let master = self.master()?;
        let mut table = master.read_table(&self.config.localization.sheet)?;
        let summary = merge_bundles(&mut table, &bundles)?;
        if !dry_run {
            master.write_table(&table)?;
        }
        Ok(summary)
    }

    /// Batch translation job for a localization sheet of the master workbook.
    pub fn translation_request(&self, sheet: Option<&str>) -> Result<GenerationRequest> {
        let sheet = sheet.unwrap_or(&self.config.localization.sheet);
        let master = self.master()?;
        let table = master.read_table(sheet)?;

        let speaker_book = self.owning_workbook(&master, "localization")?;
        let speakers = speaker_book.read_table(DIALOG_SPEAKER_SHEET)?.to_reference(1);
        let speakers = CompositeIndex::build(&speakers, &["Name"], "id")?;

        let rows = translation_rows(&table, &speakers)?;
        let languages = target_languages(table.header());
        info!(sheet = %sheet, rows = rows.len() - 1, languages = languages.len(), "translation request built");

        Ok(GenerationRequest::new(GenerationEndpoint::BatchTranslate, rows, sheet, master.id())
            .with_languages(languages)
            .with_dictionary(self.glossary()?))
    }

    /// Project the writer sheet into `storyScripts` and register its dialogue text keys.
    ///
    /// Scenes present in the writer sheet replace their rows in
    /// `storyScripts`; other scenes are kept. Nothing is written when any
    /// row fails to resolve or the writer sheet has no rows.
    pub fn generate_script(&self, dry_run: bool) -> Result<ScriptReport> {
        let master = self.master()?;
        let generator = self.workbook(&self.config.workbooks.generator)?;

        let refs = ReferenceBundle::load_listed(&generator, &master)?;
        let speaker = generator.read_table(SPEAKER_SHEET)?.to_reference(1);
        let indexes = ScriptIndexes::build(&speaker, &refs)?;

        let writer = generator.read_table(GENERATOR_SHEET)?;
        let script_book = self.owning_workbook(&master, STORY_SCRIPTS_TABLE)?;
        let target = script_book.read_table(STORY_SCRIPTS_TABLE)?;

        let input_schema = writer.header_index();
        let target_schema = target.header_index();
        let projector = ScriptProjector::new(&indexes, &input_schema, &target_schema, target.width())?;
        let batch = ScriptBatch::project(&writer, &projector)?;

        let primary_key = target_schema.require("sceneId")?;
        let sort_keys = [
            SortKey::named(&target_schema, "sceneId")?,
            SortKey::named(&target_schema, "index")?,
        ];
        let merged = merge_upsert(
            target.body(REFERENCE_METADATA_ROWS),
            &batch.rows,
            primary_key,
            &sort_keys,
        );

        let mut text_sheet = master.read_table(TEXT_KEY_SHEET)?;
        let text_keys = upsert_text_keys(&mut text_sheet, &batch.text_entries)?;

        let report = ScriptReport {
            scenes: batch.scenes,
            rows: batch.rows.len(),
            total_rows: merged.len(),
            text_keys,
        };

        if batch.rows.is_empty() {
            warn!(sheet = GENERATOR_SHEET, "no writer rows to project, storyScripts left as is");
            return Ok(report);
        }

        if !dry_run {
            script_book.write_rows(STORY_SCRIPTS_TABLE, REFERENCE_METADATA_ROWS, merged)?;
            master.write_table(&text_sheet)?;
        }
        info!(
            scenes = report.scenes.len(),
            rows = report.rows,
            text_keys_inserted = report.text_keys.inserted,
            text_keys_updated = report.text_keys.updated,
            dry_run,
            "script generated"
        );
        Ok(report)
    }

    /// Replace the writer sheet body with rows built from generated scripts.
    ///
    /// Returns the number of writer rows produced.
    pub fn transfer_script(&self, dry_run: bool) -> Result<usize> {
        let story = self.workbook(&self.config.workbooks.story)?;
        let generated = story.read_table(SCRIPT_GENERATOR_SHEET)?;
        let script_info = story.read_table(SCRIPT_INFO_SHEET)?;

        let generator = self.workbook(&self.config.workbooks.generator)?;
        let writer = generator.read_table(GENERATOR_SHEET)?;

        let rows = transfer_script(&generated, &script_info, writer.header())?;
        let count = rows.len();
        if !dry_run {
            generator.write_rows(GENERATOR_SHEET, 1, rows)?;
        }
        info!(rows = count, dry_run, "script transferred to writer sheet");
        Ok(count)
    }

    /// Dialogue generation job for the scenes flagged in `scene_info`.
    pub fn story_request(&self) -> Result<GenerationRequest> {
        let master = self.master()?;
        let story = self.workbook(&self.config.workbooks.story)?;

        let refs = ReferenceBundle::load_listed(&story, &master)?;
        let speakers = story.read_table(DIALOG_SPEAKER_SHEET)?.to_reference(1);
        let projector = DialogueStoryProjector::new(&speakers, &refs)?;

        let dialogs = story.read_table(DIALOG_GENERATOR_SHEET)?;
        let scene_info = story.read_table(SCENE_INFO_SHEET)?;
        let rows = projector.project(&dialogs, &scene_info)?;
        ensure_rows(&rows, SCENE_INFO_SHEET)?;

        Ok(GenerationRequest::new(
            GenerationEndpoint::StoryGenerate,
            rows,
            DIALOG_GENERATOR_SHEET,
            story.id(),
        )
        .with_dictionary(self.glossary()?))
    }

    /// Whole-scene generation job for the scenes flagged in `script_info`.
    pub fn full_story_request(&self) -> Result<GenerationRequest> {
        let master = self.master()?;
        let story = self.workbook(&self.config.workbooks.story)?;

        let refs = ReferenceBundle::load_listed(&story, &master)?;
        let speakers = story.read_table(DIALOG_SPEAKER_SHEET)?.to_reference(1);
        let systems = story.read_table(SYSTEM_SHEET)?.to_reference(1);
        let projector = FullStoryProjector::new(&speakers, &systems, &refs)?;

        let script_info = story.read_table(SCRIPT_INFO_SHEET)?;
        let rows = projector.project(&script_info)?;
        ensure_rows(&rows, SCRIPT_INFO_SHEET)?;

        Ok(GenerationRequest::new(
            GenerationEndpoint::FullStoryGenerate,
            rows,
            SCRIPT_GENERATOR_SHEET,
            story.id(),
        )
        .with_emotions(projector.emotions().to_vec())
        .with_dictionary(self.glossary()?))
    }

    /// Send a job to the generation backend.
    pub fn submit(
        &self,
        service: &dyn GenerationService,
        endpoint: GenerationEndpoint,
        request: &GenerationRequest,
    ) -> Result<u16> {
        let status = service.submit(endpoint, request)?;
        info!(endpoint = endpoint.path(), status, rows = request.row_count(), "generation job accepted");
        Ok(status)
    }

    pub fn generation_client(&self) -> Result<HttpGenerationClient> {
        HttpGenerationClient::new(
            &self.config.services.generation_url,
            self.config.services.timeout(),
        )
    }

    pub fn sync_client(&self, env: Environment) -> Result<HttpSyncClient> {
        HttpSyncClient::new(self.config.services.admin_url(env), self.config.services.timeout())
    }

    /// Sheet mapping of the master workbook; empty when the mapping sheet is absent.
    pub fn sheet_mapping(&self) -> Result<SheetMapping> {
        let master = self.master()?;
        let name = &self.config.sync.mapping_sheet;
        if !master.has_table(name)? {
            warn!(sheet = %name, "mapping sheet not found, using kebab-case table names");
            return Ok(SheetMapping::default());
        }
        Ok(SheetMapping::from_table(&master.read_table(name)?))
    }

    /// Push one master sheet to the admin database.
    pub fn push_sheet(&self, service: &dyn SyncService, api_key: &str, sheet: &str) -> Result<PushOutcome> {
        let master = self.master()?;
        let mapping = self.sheet_mapping()?;
        self.push_with(service, api_key, &master, &mapping, sheet)
    }

    fn push_with(
        &self,
        service: &dyn SyncService,
        api_key: &str,
        master: &CsvWorkbook,
        mapping: &SheetMapping,
        sheet: &str,
    ) -> Result<PushOutcome> {
        let target = mapping.target(sheet);
        let table = master.read_table(sheet)?;

        let request = PushRequest {
            table_name: target.table_name.clone(),
            csv_data: sheet_to_csv(&table)?,
            api_key: api_key.to_string(),
            exact: target.push_exact,
            filters: target.filters.clone(),
        };
        let result = service.push(&request)?;

        Ok(PushOutcome {
            sheet: sheet.to_string(),
            table: target.table_name,
            result,
        })
    }

    /// Ask the admin service to write its table back into a master sheet.
    ///
    /// `exact` overrides the mapping's `pullExact` when given.
    pub fn pull_sheet(
        &self,
        service: &dyn SyncService,
        api_key: &str,
        sheet: &str,
        exact: Option<bool>,
    ) -> Result<PullOutcome> {
        let master = self.master()?;
        let target = self.sheet_mapping()?.target(sheet);
        let exact = target.pull_exact_or(exact);
        let spreadsheet_id = self
            .config
            .sync
            .spreadsheet_id
            .clone()
            .unwrap_or_else(|| master.id().to_string());

        let request = PullRequest {
            table_name: target.table_name.clone(),
            sheet_name: sheet.to_string(),
            spreadsheet_id,
            api_key: api_key.to_string(),
            exact,
            filters: target.filters.clone(),
        };
        let result = service.pull(&request)?;

        Ok(PullOutcome {
            sheet: sheet.to_string(),
            table: target.table_name,
            exact,
            result,
        })
    }

    /// Master sheets a sync-all run pushes: everything but `#` sheets and the mapping sheet.
    pub fn syncable_sheets(&self) -> Result<Vec<String>> {
        let mapping_sheet = &self.config.sync.mapping_sheet;
        Ok(self
            .master()?
            .table_names()?
            .into_iter()
            .filter(|name| !name.starts_with('#') && name != mapping_sheet)
            .collect())
    }

    /// Push every syncable sheet. A failing sheet does not stop the run.
    pub fn sync_all(&self, service: &dyn SyncService, api_key: &str) -> Result<Vec<SheetSync>> {
        let master = self.master()?;
        let mapping = self.sheet_mapping()?;

        let mut results = Vec::new();
        for sheet in self.syncable_sheets()? {
            let table = mapping.target(&sheet).table_name;
            let result = match self.push_with(service, api_key, &master, &mapping, &sheet) {
                Ok(outcome) => Ok(outcome.result),
                Err(e) => {
                    warn!(sheet = %sheet, error = %e, "sheet sync failed");
                    Err(remote_message(&e))
                }
            };
            results.push(SheetSync { sheet, table, result });
        }

        let failed = results.iter().filter(|r| r.result.is_err()).count();
        info!(sheets = results.len(), failed, "sync-all finished");
        Ok(results)
    }

    /// Probe the admin health endpoint.
    pub fn check_connection(&self, service: &dyn SyncService) -> Result<ConnectionStatus> {
        let status = service.health()?;
        Ok(ConnectionStatus {
            url: service.base_url().to_string(),
            status,
            reachable: is_reachable(status),
        })
    }
}

fn ensure_rows(rows: &[Vec<String>], source: &str) -> Result<()> {
    if rows.len() <= 1 {
        return Err(TabulaError::EmptyData(format!(
            "No scenes in '{source}' are marked isGenerate"
        )));
    }
    Ok(())
}

fn remote_message(error: &TabulaError) -> String {
    match error {
        TabulaError::RemoteCall { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
