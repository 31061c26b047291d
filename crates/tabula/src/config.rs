//! Workspace configuration (`tabula.toml`).

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TabulaError};
use crate::remote::Environment;

/// Name of the configuration file at the workspace root.
pub const CONFIG_FILE: &str = "tabula.toml";

/// Top-level configuration. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabulaConfig {
    pub workbooks: WorkbookPaths,
    pub services: ServiceConfig,
    pub sync: SyncConfig,
    pub schedule: ScheduleConfig,
    pub localization: LocalizationConfig,
}

impl TabulaConfig {
    /// Load a config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| TabulaError::io(path, e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| TabulaError::Config(format!("Invalid {CONFIG_FILE}: {e}")))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| TabulaError::Config(format!("Failed to encode config: {e}")))
    }
}

/// Workbook directories, relative to the workspace root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookPaths {
    /// Master data tables, `Localization` and `#DataTable_Index`.
    pub master: String,
    /// `GENERATOR`, `speaker` and `ref_sheets`.
    pub generator: String,
    /// Story generation sheets.
    pub story: String,
    /// `Dictionary`.
    pub dictionary: String,
    /// `CharacterSchedule`.
    pub schedule: String,
}

impl Default for WorkbookPaths {
    fn default() -> Self {
        Self {
            master: "master".to_string(),
            generator: "script-generator".to_string(),
            story: "story-generator".to_string(),
            dictionary: "dictionary".to_string(),
            schedule: "character-schedule".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the generation and translation backend.
    pub generation_url: String,
    pub admin_url: String,
    pub dev_admin_url: String,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            generation_url: "http://localhost:8080".to_string(),
            admin_url: "http://localhost:3000".to_string(),
            dev_admin_url: "http://localhost:3001".to_string(),
            timeout_secs: 60,
        }
    }
}

impl ServiceConfig {
    pub fn admin_url(&self, env: Environment) -> &str {
        match env {
            Environment::Prod => &self.admin_url,
            Environment::Dev => &self.dev_admin_url,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Sheet holding the sheet-to-table mapping.
    pub mapping_sheet: String,
    /// Spreadsheet id sent with pulls; the workbook id when unset.
    pub spreadsheet_id: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mapping_sheet: "#SheetMapping".to_string(),
            spreadsheet_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub sheet: String,
    /// First data row (0-based).
    pub start_row: usize,
    pub results_sheet: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            sheet: "CharacterSchedule".to_string(),
            start_row: crate::validation::DEFAULT_START_ROW,
            results_sheet: "Validation_Results".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizationConfig {
    pub sheet: String,
    /// Directory for per-language JSON files, relative to the workspace root.
    pub json_dir: String,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            sheet: "Localization".to_string(),
            json_dir: "localization-json".to_string(),
        }
    }
}
