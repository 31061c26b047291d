//! Push/pull webhooks of the admin service.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Result, TabulaError};

const PUSH_PATH: &str = "/api/sync/google-sheets/webhook/push";
const PULL_PATH: &str = "/api/sync/google-sheets/webhook/pull";
const HEALTH_PATH: &str = "/api/health";

/// Sheet contents sent to the admin database.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    pub table_name: String,
    pub csv_data: String,
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
}

/// Request for the admin service to write a table back into a sheet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub table_name: String,
    pub sheet_name: String,
    pub spreadsheet_id: String,
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushSummary {
    pub total: u64,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
}

/// The database operation an [`OperationError`] belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OperationRef {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<Value>,
    pub composite_id: Option<Value>,
}

impl OperationRef {
    /// `id` when present, otherwise the JSON form of `compositeId`.
    pub fn display_id(&self) -> String {
        match (&self.id, &self.composite_id) {
            (Some(Value::String(id)), _) => id.clone(),
            (Some(id), _) if !id.is_null() => id.to_string(),
            (_, Some(composite)) if !composite.is_null() => composite.to_string(),
            _ => "?".to_string(),
        }
    }
}

/// A create/update/delete that failed on the admin side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationError {
    pub operation: OperationRef,
    pub error: String,
}

/// A CSV row the admin service refused to parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvalidRow {
    pub row: Option<u64>,
    pub errors: Vec<String>,
}

impl InvalidRow {
    fn line(&self, position: usize) -> String {
        let row = self.row.unwrap_or(position as u64 + 1);
        let errors = if self.errors.is_empty() {
            "Unknown error".to_string()
        } else {
            self.errors.join(", ")
        };
        format!("Row {row}: {errors}")
    }
}

/// Successful push response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub summary: PushSummary,
    pub errors: Vec<OperationError>,
    pub invalid_rows_count: u64,
    pub invalid_rows: Vec<InvalidRow>,
    /// Present only for exact pushes.
    pub deleted_count: Option<u64>,
    pub error: Option<String>,
}

impl SyncResult {
    /// Whether the push went through but left something to look at.
    pub fn has_warnings(&self) -> bool {
        !self.errors.is_empty() || self.invalid_rows_count > 0
    }

    /// One-line count summary.
    pub fn summary_line(&self) -> String {
        let deleted = self
            .deleted_count
            .map(|d| format!(", Deleted: {d}"))
            .unwrap_or_default();
        format!(
            "Created: {}, Updated: {}, Skipped: {}{}",
            self.summary.created, self.summary.updated, self.summary.skipped, deleted
        )
    }

    /// Detailed report for pushes with warnings.
    ///
    /// Lists at most 5 operation errors and 3 invalid rows.
    pub fn report_lines(&self) -> Vec<String> {
        let s = &self.summary;
        let mut lines = vec![
            format!("Total: {}", s.total),
            format!("Created: {}", s.created),
            format!("Updated: {}", s.updated),
            format!("Skipped: {}", s.skipped),
            format!("Errors: {}", s.errors),
        ];
        if let Some(deleted) = self.deleted_count {
            lines.push(format!("Deleted: {deleted}"));
        }

        if !self.errors.is_empty() {
            lines.push(format!("Operation errors ({}):", self.errors.len()));
            for err in self.errors.iter().take(5) {
                let kind = err.operation.kind.as_deref().unwrap_or("unknown");
                lines.push(format!(
                    "  [{kind}] id={}: {}",
                    err.operation.display_id(),
                    err.error
                ));
            }
            if self.errors.len() > 5 {
                lines.push(format!("  ... and {} more errors", self.errors.len() - 5));
            }
        }

        if self.invalid_rows_count > 0 {
            lines.push(format!("Invalid rows ({} skipped):", self.invalid_rows_count));
            lines.extend(self.invalid_rows.iter().take(3).enumerate().map(|(i, r)| format!("  {}", r.line(i))));
            if self.invalid_rows.len() > 3 {
                lines.push(format!("  ... and {} more", self.invalid_rows.len() - 3));
            }
        }
        lines
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PullDetails {
    pub rows_fetched: Option<u64>,
    pub rows_updated: Option<u64>,
    pub rows_inserted: Option<u64>,
}

/// Pull response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PullResult {
    pub success: bool,
    pub details: PullDetails,
    pub error: Option<String>,
}

impl PullResult {
    pub fn summary_line(&self) -> String {
        let count = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string());
        format!(
            "Fetched: {}, Updated: {}, Inserted: {}",
            count(self.details.rows_fetched),
            count(self.details.rows_updated),
            count(self.details.rows_inserted)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseSummary {
    pub total: u64,
    pub valid: u64,
    pub invalid: u64,
}

/// Body of a non-200 sync response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncErrorBody {
    pub error: Option<String>,
    pub hint: Option<String>,
    /// Either a list of messages or a single value.
    pub details: Option<Value>,
    pub summary: Option<ParseSummary>,
    pub invalid_rows: Vec<InvalidRow>,
}

impl SyncErrorBody {
    /// Parse an error body; text that is not a JSON object becomes the error message.
    pub fn parse(text: &str) -> Self {
        serde_json::from_str::<SyncErrorBody>(text).unwrap_or_else(|_| SyncErrorBody {
            error: Some(text.to_string()),
            ..Default::default()
        })
    }

    /// Hint, details, parse summary and up to 5 invalid rows.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(hint) = &self.hint {
            lines.push(format!("Hint: {hint}"));
        }

        match &self.details {
            Some(Value::Array(items)) => {
                lines.push("Details:".to_string());
                for item in items.iter().take(5) {
                    lines.push(format!("  - {}", value_text(item)));
                }
                if items.len() > 5 {
                    lines.push(format!("  ... and {} more", items.len() - 5));
                }
            }
            Some(Value::Null) | None => {}
            Some(other) => {
                lines.push("Details:".to_string());
                lines.push(format!("  {}", value_text(other)));
            }
        }

        if let Some(s) = &self.summary {
            lines.push(format!(
                "Parse summary: Total: {}, Valid: {}, Invalid: {}",
                s.total, s.valid, s.invalid
            ));
        }

        if !self.invalid_rows.is_empty() {
            let shown = self.invalid_rows.len().min(5);
            lines.push(format!("Invalid rows (first {shown}):"));
            lines.extend(self.invalid_rows.iter().take(5).enumerate().map(|(i, r)| format!("  {}", r.line(i))));
            if self.invalid_rows.len() > 5 {
                lines.push(format!("  ... and {} more invalid rows", self.invalid_rows.len() - 5));
            }
        }
        lines
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Status line plus body details for a failed remote call.
pub fn error_report(error: &TabulaError) -> Vec<String> {
    match error {
        TabulaError::RemoteCall {
            status,
            message,
            body,
            ..
        } => {
            let status = status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            let mut lines = vec![format!("Status: {status}"), format!("Error: {message}")];
            if let Some(body) = body {
                lines.extend(body.report_lines());
            }
            lines
        }
        other => vec![format!("Error: {other}")],
    }
}

/// The admin service's table sync endpoints.
pub trait SyncService {
    /// Send a sheet's CSV to the database.
    fn push(&self, request: &PushRequest) -> Result<SyncResult>;

    /// Ask the service to write a table back into a sheet.
    fn pull(&self, request: &PullRequest) -> Result<PullResult>;

    /// HTTP status of the health endpoint.
    fn health(&self) -> Result<u16>;

    /// Base URL the service is reached at.
    fn base_url(&self) -> &str;
}

/// Whether a health status means the server is reachable.
pub fn is_reachable(status: u16) -> bool {
    status == 200 || status == 404
}

/// HTTP client for one admin deployment.
pub struct HttpSyncClient {
    client: Client,
    base_url: String,
}

impl HttpSyncClient {
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

    fn post<P: Serialize, T: DeserializeOwned>(&self, path: &str, payload: &P) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .map_err(|e| unreachable_error(&url, e))?;

        let status = response.status();
        let text = response.text().map_err(|e| unreachable_error(&url, e))?;
        debug!(url = %url, status = status.as_u16(), bytes = text.len(), "sync response");

        if status != StatusCode::OK {
            let body = SyncErrorBody::parse(&text);
            let message = body
                .error
                .clone()
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            warn!(url = %url, status = status.as_u16(), error = %message, "sync call rejected");
            return Err(TabulaError::RemoteCall {
                endpoint: url,
                status: Some(status.as_u16()),
                message,
                body: Some(Box::new(body)),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

fn unreachable_error(url: &str, e: reqwest::Error) -> TabulaError {
    TabulaError::RemoteCall {
        endpoint: url.to_string(),
        status: None,
        message: e.to_string(),
        body: None,
    }
}

impl SyncService for HttpSyncClient {
    fn push(&self, request: &PushRequest) -> Result<SyncResult> {
        let result: SyncResult = self.post(PUSH_PATH, request)?;
        info!(
            table = %request.table_name,
            created = result.summary.created,
            updated = result.summary.updated,
            skipped = result.summary.skipped,
            "pushed"
        );
        Ok(result)
    }

    fn pull(&self, request: &PullRequest) -> Result<PullResult> {
        let result: PullResult = self.post(PULL_PATH, request)?;
        info!(table = %request.table_name, sheet = %request.sheet_name, success = result.success, "pulled");
        Ok(result)
    }

    fn health(&self) -> Result<u16> {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| unreachable_error(&url, e))?;
        Ok(response.status().as_u16())
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
