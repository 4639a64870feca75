//! Batch request/response shapes shared by bulk create, update and delete.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ServiceError;

/// How a batch treats failures of individual elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkMode {
    /// Each element succeeds or fails on its own.
    #[default]
    Independent,
    /// All or nothing: the first failure restores the pre-batch state.
    Atomic,
}

/// One element of a bulk update: the raw id and the partial payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PatchRequest<P> {
    pub id: Value,
    pub changes: P,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub index: usize,
    pub status: u16,
    pub error: String,
}

impl BulkFailure {
    pub fn new(index: usize, err: &ServiceError) -> Self {
        Self { index, status: err.status_code(), error: err.to_string() }
    }
}

/// Partitioned result of an independent batch.
#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<BulkFailure>,
}

impl<T> Default for BulkOutcome<T> {
    fn default() -> Self { Self { succeeded: Vec::new(), failed: Vec::new() } }
}

impl<T> BulkOutcome<T> {
    pub fn push(&mut self, index: usize, result: Result<T, ServiceError>) {
        match result {
            Ok(v) => self.succeeded.push(v),
            Err(e) => self.failed.push(BulkFailure::new(index, &e)),
        }
    }
}
