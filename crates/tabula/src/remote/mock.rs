//! In-process service doubles that record what they were sent.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::error::{Result, TabulaError};

use super::generation::{GenerationEndpoint, GenerationRequest, GenerationService};
use super::sync::{
    PullDetails, PullRequest, PullResult, PushRequest, PushSummary, SyncErrorBody, SyncResult,
    SyncService,
};

/// Generation backend that accepts every job and keeps it.
#[derive(Debug, Default)]
pub struct RecordingGenerationService {
    submitted: RefCell<Vec<(GenerationEndpoint, GenerationRequest)>>,
}

impl RecordingGenerationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs submitted so far, in order.
    pub fn submitted(&self) -> Vec<(GenerationEndpoint, GenerationRequest)> {
        self.submitted.borrow().clone()
    }
}

impl GenerationService for RecordingGenerationService {
    fn submit(&self, endpoint: GenerationEndpoint, request: &GenerationRequest) -> Result<u16> {
        self.submitted.borrow_mut().push((endpoint, request.clone()));
        Ok(200)
    }
}

/// Admin service that records requests and answers with canned results.
///
/// Pushes to tables listed with [`MockSyncService::rejecting`] fail with
/// a 400 and an error body.
#[derive(Debug)]
pub struct MockSyncService {
    pushes: RefCell<Vec<PushRequest>>,
    pulls: RefCell<Vec<PullRequest>>,
    rejected: HashSet<String>,
    health_status: u16,
}

impl MockSyncService {
    pub fn new() -> Self {
        Self {
            pushes: RefCell::new(Vec::new()),
            pulls: RefCell::new(Vec::new()),
            rejected: HashSet::new(),
            health_status: 200,
        }
    }

    /// Reject pushes to `table`.
    pub fn rejecting(mut self, table: impl Into<String>) -> Self {
        self.rejected.insert(table.into());
        self
    }

    pub fn with_health_status(mut self, status: u16) -> Self {
        self.health_status = status;
        self
    }

    pub fn pushes(&self) -> Vec<PushRequest> {
        self.pushes.borrow().clone()
    }

    pub fn pulls(&self) -> Vec<PullRequest> {
        self.pulls.borrow().clone()
    }
}

impl Default for MockSyncService {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncService for MockSyncService {
    fn push(&self, request: &PushRequest) -> Result<SyncResult> {
        self.pushes.borrow_mut().push(request.clone());

        if self.rejected.contains(&request.table_name) {
            return Err(TabulaError::RemoteCall {
                endpoint: format!("mock://push/{}", request.table_name),
                status: Some(400),
                message: "Table not found".to_string(),
                body: Some(Box::new(SyncErrorBody {
                    error: Some("Table not found".to_string()),
                    hint: Some("Check the sheet mapping".to_string()),
                    ..Default::default()
                })),
            });
        }

        // One data row per CSV line after the header.
        let rows = request.csv_data.lines().count().saturating_sub(1) as u64;
        Ok(SyncResult {
            success: true,
            summary: PushSummary {
                total: rows,
                updated: rows,
                ..Default::default()
            },
            deleted_count: request.exact.filter(|e| *e).map(|_| 0),
            ..Default::default()
        })
    }

    fn pull(&self, request: &PullRequest) -> Result<PullResult> {
        self.pulls.borrow_mut().push(request.clone());
        Ok(PullResult {
            success: true,
            details: PullDetails {
                rows_fetched: Some(0),
                rows_updated: Some(0),
                rows_inserted: Some(0),
            },
            error: None,
        })
    }

    fn health(&self) -> Result<u16> {
        Ok(self.health_status)
    }

    fn base_url(&self) -> &str {
        "mock://admin"
    }
}
