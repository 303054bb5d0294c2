//! Outcome types of transfer operations

use crate::traits::{TransferError, TransferErrorKind};
use serde::Serialize;
use std::path::PathBuf;

/// One file to upload: a staged local file and its derived remote path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub local_path: PathBuf,
    pub remote_path: String,
}

impl TransferRequest {
    pub fn new(local_path: impl Into<PathBuf>, remote_path: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            remote_path: remote_path.into(),
        }
    }
}

/// A file that reached the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSuccess {
    pub local_path: PathBuf,
    pub remote_path: String,
    pub byte_size: u64,
}

/// A file that did not reach the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFailure {
    pub local_path: PathBuf,
    pub remote_path: Option<String>,
    pub kind: TransferErrorKind,
    pub reason: String,
}

impl UploadFailure {
    pub fn from_error(request: &TransferRequest, error: &TransferError) -> Self {
        Self {
            local_path: request.local_path.clone(),
            remote_path: Some(request.remote_path.clone()),
            kind: error.kind(),
            reason: error.to_string(),
        }
    }
}

/// A file fetched from the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadSuccess {
    pub remote_path: String,
    pub local_path: PathBuf,
    pub byte_size: u64,
}

/// Aggregate outcome of a batch upload
///
/// Both lists keep the input order. Every input file appears in exactly one
/// of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub successful: Vec<UploadSuccess>,
    pub failed: Vec<UploadFailure>,
}

impl BatchResult {
    pub fn total_files(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    pub fn success_count(&self) -> usize {
        self.successful.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Serialize for BatchResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("BatchResult", 5)?;
        state.serialize_field("successful", &self.successful)?;
        state.serialize_field("failed", &self.failed)?;
        state.serialize_field("totalFiles", &self.total_files())?;
        state.serialize_field("successCount", &self.success_count())?;
        state.serialize_field("failureCount", &self.failure_count())?;
        state.end()
    }
}
