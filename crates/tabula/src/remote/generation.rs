//! Client for the generation backend (translation and story generation).

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, TabulaError};
use crate::reference::RecordDictionary;

/// Generation jobs the backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationEndpoint {
    BatchTranslate,
    StoryGenerate,
    FullStoryGenerate,
}

impl GenerationEndpoint {
    /// Path below the service base URL.
    pub fn path(&self) -> &'static str {
        match self {
            GenerationEndpoint::BatchTranslate => "/ai/batch-group-translate",
            GenerationEndpoint::StoryGenerate => "/ai-create/story-generate",
            GenerationEndpoint::FullStoryGenerate => "/ai-create/full-story-generate",
        }
    }

    /// Prompt template the backend should use for this job.
    pub fn prompt_file(&self) -> &'static str {
        match self {
            GenerationEndpoint::BatchTranslate => "translate_prompt.txt",
            GenerationEndpoint::StoryGenerate => "story_generate_default.txt",
            GenerationEndpoint::FullStoryGenerate => "story_generate_fullScript.txt",
        }
    }
}

/// Payload of a generation call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Rows including the header row.
    pub data: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_setup: Option<Vec<String>>,
    pub dictionary: RecordDictionary,
    /// Sheet the backend writes its results into.
    pub sheet_name: String,
    /// Workbook holding that sheet.
    pub sheet_id: String,
    pub prompt_file: String,
}

impl GenerationRequest {
    pub fn new(
        endpoint: GenerationEndpoint,
        data: Vec<Vec<String>>,
        sheet_name: impl Into<String>,
        sheet_id: impl Into<String>,
    ) -> Self {
        Self {
            data,
            languages: None,
            emotions: None,
            global_setup: None,
            dictionary: RecordDictionary::new(),
            sheet_name: sheet_name.into(),
            sheet_id: sheet_id.into(),
            prompt_file: endpoint.prompt_file().to_string(),
        }
    }

    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = Some(languages);
        self
    }

    pub fn with_emotions(mut self, emotions: Vec<String>) -> Self {
        self.emotions = Some(emotions);
        self
    }

    pub fn with_global_setup(mut self, setup: Vec<String>) -> Self {
        self.global_setup = Some(setup);
        self
    }

    pub fn with_dictionary(mut self, dictionary: RecordDictionary) -> Self {
        self.dictionary = dictionary;
        self
    }

    /// Data rows, excluding the header.
    pub fn row_count(&self) -> usize {
        self.data.len().saturating_sub(1)
    }
}

/// A backend that accepts generation jobs.
///
/// Results are written back by the backend itself; callers only learn
/// whether the job was accepted.
pub trait GenerationService {
    /// Submit a job. Returns the HTTP status on success.
    fn submit(&self, endpoint: GenerationEndpoint, request: &GenerationRequest) -> Result<u16>;
}

/// HTTP client for the generation backend.
pub struct HttpGenerationClient {
    client: Client,
    base_url: String,
}

impl HttpGenerationClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TabulaError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl GenerationService for HttpGenerationClient {
    fn submit(&self, endpoint: GenerationEndpoint, request: &GenerationRequest) -> Result<u16> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        debug!(url = %url, rows = request.row_count(), sheet = %request.sheet_name, "submitting generation job");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .map_err(|e| TabulaError::RemoteCall {
                endpoint: url.clone(),
                status: None,
                message: e.to_string(),
                body: None,
            })?;

        let status = response.status();
        info!(url = %url, status = status.as_u16(), "generation job submitted");

        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(TabulaError::RemoteCall {
                endpoint: url,
                status: Some(status.as_u16()),
                message: text,
                body: None,
            });
        }
        Ok(status.as_u16())
    }
}
