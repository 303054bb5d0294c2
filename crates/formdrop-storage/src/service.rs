//! Upload service
//!
//! Turns a set of staged files into remote artifacts: derive remote paths,
//! upload them as one batch, then delete the staged copies whatever happened.

use crate::cleanup::cleanup_local_files;
use crate::keys::{generate_remote_path, sanitize_file_name};
use crate::session::TransferSession;
use crate::traits::TransferErrorKind;
use crate::types::TransferRequest;
use chrono::{DateTime, Utc};
use formdrop_core::{AppError, Config};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// A file the receiving layer wrote to local temp storage
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub local_path: PathBuf,
    /// Name the client sent; used for the remote file name.
    pub original_name: String,
    pub content_type: String,
    pub size: u64,
}

/// A staged file that reached the remote store
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub original_name: String,
    /// Name the file was staged under locally.
    pub stored_name: String,
    pub remote_path: String,
    pub content_type: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// A staged file that did not reach the remote store
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedUpload {
    pub original_name: String,
    pub stored_name: String,
    pub remote_path: Option<String>,
    pub kind: TransferErrorKind,
    pub reason: String,
}

/// Outcome of one submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub submission_id: String,
    pub uploaded: Vec<UploadedFile>,
    pub failed: Vec<FailedUpload>,
}

impl UploadReport {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// 200 when every file arrived, 207 (multi-status) on partial failure.
    pub fn status_code(&self) -> u16 {
        if self.is_complete_success() {
            200
        } else {
            207
        }
    }
}

impl StagedFile {
    fn stored_name(&self) -> String {
        self.local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| sanitize_file_name(&self.original_name))
    }
}

/// Upload pipeline for form submissions
pub struct UploadService {
    session: Arc<TransferSession>,
    upload_path: String,
    max_files: usize,
    max_file_size_bytes: u64,
}

impl UploadService {
    /// Create a new UploadService without submission limits
    ///
    /// `upload_path` is the remote base directory (e.g. "/uploads").
    pub fn new(session: Arc<TransferSession>, upload_path: impl Into<String>) -> Self {
        Self {
            session,
            upload_path: upload_path.into(),
            max_files: usize::MAX,
            max_file_size_bytes: u64::MAX,
        }
    }

    /// Create an UploadService using the configured base path and limits
    pub fn from_config(session: Arc<TransferSession>, config: &Config) -> Self {
        Self::new(session, config.upload_path())
            .with_limits(config.max_files_per_form(), config.max_file_size_bytes())
    }

    pub fn with_limits(mut self, max_files: usize, max_file_size_bytes: u64) -> Self {
        self.max_files = max_files;
        self.max_file_size_bytes = max_file_size_bytes;
        self
    }

    pub fn session(&self) -> &Arc<TransferSession> {
        &self.session
    }

    /// Upload every staged file of one submission and clean up the staged copies.
    ///
    /// A missing `submission_id` gets a generated `temp_…` id. Individual file
    /// failures are reported in the returned report; only a remote store that
    /// cannot be reached at all is an error. A submission over the file count
    /// or file size limit is rejected before any transfer. Staged files are
    /// deleted in every case.
    pub async fn submit(
        &self,
        owner_id: &str,
        submission_id: Option<&str>,
        files: Vec<StagedFile>,
    ) -> Result<UploadReport, AppError> {
        if files.is_empty() {
            return Err(AppError::BadRequest("No files uploaded".to_string()));
        }

        if let Err(e) = self.check_limits(&files) {
            cleanup_local_files(files.iter().map(|f| &f.local_path)).await;
            tracing::debug!(owner_id = %owner_id, error = %e, "Submission rejected");
            return Err(e);
        }

        let submission_id = submission_id
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("temp_{}", Uuid::new_v4().simple()));

        let requests: Vec<TransferRequest> = files
            .iter()
            .map(|file| {
                TransferRequest::new(
                    file.local_path.clone(),
                    generate_remote_path(
                        &self.upload_path,
                        owner_id,
                        &submission_id,
                        &file.original_name,
                    ),
                )
            })
            .collect();

        let batch = self.session.upload_multiple_files(&requests).await;

        cleanup_local_files(files.iter().map(|f| &f.local_path)).await;

        let batch = batch.map_err(|e| {
            let err = AppError::from(e);
            tracing::error!(
                owner_id = %owner_id,
                submission_id = %submission_id,
                error = %err.detailed_message(),
                "Upload batch could not start"
            );
            err
        })?;

        let staged: HashMap<&PathBuf, &StagedFile> =
            files.iter().map(|f| (&f.local_path, f)).collect();
        let uploaded_at = Utc::now();

        let uploaded = batch
            .successful
            .iter()
            .filter_map(|success| {
                staged.get(&success.local_path).map(|file| UploadedFile {
                    original_name: file.original_name.clone(),
                    stored_name: file.stored_name(),
                    remote_path: success.remote_path.clone(),
                    content_type: file.content_type.clone(),
                    size: success.byte_size,
                    uploaded_at,
                })
            })
            .collect();

        let failed = batch
            .failed
            .into_iter()
            .filter_map(|failure| {
                staged.get(&failure.local_path).map(|file| FailedUpload {
                    original_name: file.original_name.clone(),
                    stored_name: file.stored_name(),
                    remote_path: failure.remote_path,
                    kind: failure.kind,
                    reason: failure.reason,
                })
            })
            .collect();

        let report = UploadReport {
            submission_id,
            uploaded,
            failed,
        };

        if report.is_complete_success() {
            tracing::info!(
                owner_id = %owner_id,
                submission_id = %report.submission_id,
                files = report.uploaded.len(),
                "Submission files uploaded"
            );
        } else {
            tracing::warn!(
                owner_id = %owner_id,
                submission_id = %report.submission_id,
                uploaded = report.uploaded.len(),
                failed = report.failed.len(),
                "Some submission files failed to upload"
            );
        }

        Ok(report)
    }

    fn check_limits(&self, files: &[StagedFile]) -> Result<(), AppError> {
        if files.len() > self.max_files {
            return Err(AppError::BadRequest(format!(
                "Too many files: {} (maximum {})",
                files.len(),
                self.max_files
            )));
        }

        if let Some(file) = files.iter().find(|f| f.size > self.max_file_size_bytes) {
            return Err(AppError::BadRequest(format!(
                "File too large: {} ({} bytes, maximum {})",
                file.original_name, file.size, self.max_file_size_bytes
            )));
        }

        Ok(())
    }

    /// Probe the remote store (connects if needed).
    pub async fn check_remote_store(&self) -> bool {
        self.session.check_connection().await
    }
}
