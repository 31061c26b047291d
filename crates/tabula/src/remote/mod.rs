//! Remote services: the generation backend and the admin sync webhooks.
//!
//! Both are reached over blocking HTTP. Each has a trait so pipelines can
//! run against the recording mocks in tests and dry runs.

mod generation;
mod mapping;
mod mock;
mod sync;

pub use generation::{
    GenerationEndpoint, GenerationRequest, GenerationService, HttpGenerationClient,
};
pub use mapping::{sheet_to_csv, to_kebab_case, SheetMapping, SyncTarget, MAPPING_DATA_START_ROW};
pub use mock::{MockSyncService, RecordingGenerationService};
pub use sync::{
    error_report, is_reachable, HttpSyncClient, InvalidRow, OperationError, OperationRef, ParseSummary,
    PullDetails, PullRequest, PullResult, PushRequest, PushSummary, SyncErrorBody, SyncResult,
    SyncService,
};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TabulaError};

/// Admin deployment a sync call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Prod,
    Dev,
}

impl Environment {
    /// Human-readable name used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Environment::Prod => "Production",
            Environment::Dev => "Development",
        }
    }

    /// Environment variable holding this environment's API key.
    pub fn key_variable(&self) -> &'static str {
        match self {
            Environment::Prod => "TABULA_API_KEY_PROD",
            Environment::Dev => "TABULA_API_KEY_DEV",
        }
    }

    /// API key from the process environment.
    pub fn api_key(&self) -> Result<String> {
        self.api_key_from(|name| std::env::var(name).ok())
    }

    /// API key from an arbitrary variable lookup. Empty values count as missing.
    pub fn api_key_from<F>(&self, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(self.key_variable())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| TabulaError::MissingCredential {
                environment: self.label().to_string(),
                variable: self.key_variable().to_string(),
            })
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Prod)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Environment {
    type Err = TabulaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Ok(Environment::Prod),
            "dev" | "development" => Ok(Environment::Dev),
            other => Err(TabulaError::Config(format!(
                "Unknown environment '{other}' (expected prod or dev)"
            ))),
        }
    }
}
