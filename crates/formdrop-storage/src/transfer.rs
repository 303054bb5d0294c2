//! File-level operations over a [`TransferSession`]
//!
//! Each public operation takes the session lock for its whole duration, so
//! the stages of one upload (directory ensure, transfer, size check) are never
//! interleaved with another caller's commands.

use crate::keys::remote_parent_dir;
use crate::session::{ConnectionSlot, TransferSession};
use crate::traits::{ConnectError, RemoteEntry, TransferError};
use crate::types::{BatchResult, DownloadSuccess, TransferRequest, UploadFailure, UploadSuccess};
use std::path::Path;
use std::time::Instant;
use tokio::fs;

impl TransferSession {
    /// Upload one local file to `remote_path`.
    ///
    /// Stages, in order: connect, local size, ensure remote parent directory,
    /// transfer, size verification. A mismatching remote size fails the
    /// upload; a failing size query only logs a warning.
    pub async fn upload_file(
        &self,
        local_path: impl AsRef<Path>,
        remote_path: &str,
    ) -> Result<UploadSuccess, TransferError> {
        let mut slot = self.connection.lock().await;
        self.upload_file_locked(&mut slot, local_path.as_ref(), remote_path)
            .await
    }

    /// Upload every request in order, collecting successes and failures.
    ///
    /// Individual failures never abort the batch. Only a failure to connect
    /// before the first file is returned as an error.
    pub async fn upload_multiple_files(
        &self,
        files: &[TransferRequest],
    ) -> Result<BatchResult, ConnectError> {
        let mut slot = self.connection.lock().await;
        self.ensure_connected(&mut slot).await?;

        let start = Instant::now();
        let mut result = BatchResult::default();

        for request in files {
            match self
                .upload_file_locked(&mut slot, &request.local_path, &request.remote_path)
                .await
            {
                Ok(success) => result.successful.push(success),
                Err(e) => result.failed.push(UploadFailure::from_error(request, &e)),
            }
        }

        tracing::info!(
            total_files = result.total_files(),
            success_count = result.success_count(),
            failure_count = result.failure_count(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Batch upload finished"
        );

        Ok(result)
    }

    /// Download a remote file, creating the local parent directory if needed.
    pub async fn download_file(
        &self,
        remote_path: &str,
        local_path: impl AsRef<Path>,
    ) -> Result<DownloadSuccess, TransferError> {
        let local_path = local_path.as_ref();
        let mut slot = self.connection.lock().await;
        let conn = self.ensure_connected(&mut slot).await?;

        if let Some(parent) = local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| TransferError::LocalIo {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let start = Instant::now();
        match self.with_timeout(conn.get_file(remote_path, local_path)).await {
            Ok(byte_size) => {
                tracing::info!(
                    remote_path = %remote_path,
                    local_path = %local_path.display(),
                    size_bytes = byte_size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "File downloaded"
                );
                Ok(DownloadSuccess {
                    remote_path: remote_path.to_string(),
                    local_path: local_path.to_path_buf(),
                    byte_size,
                })
            }
            Err(e) => {
                tracing::error!(
                    remote_path = %remote_path,
                    local_path = %local_path.display(),
                    error = %e,
                    "File download failed"
                );
                TransferSession::discard_if_broken(&mut slot, &e);
                Err(TransferError::Download {
                    remote_path: remote_path.to_string(),
                    source: e,
                })
            }
        }
    }

    /// Delete a remote file.
    pub async fn delete_file(&self, remote_path: &str) -> Result<(), TransferError> {
        let mut slot = self.connection.lock().await;
        let conn = self.ensure_connected(&mut slot).await?;

        match self.with_timeout(conn.remove_file(remote_path)).await {
            Ok(()) => {
                tracing::info!(remote_path = %remote_path, "Remote file deleted");
                Ok(())
            }
            Err(e) => {
                tracing::error!(remote_path = %remote_path, error = %e, "Remote file deletion failed");
                TransferSession::discard_if_broken(&mut slot, &e);
                Err(TransferError::Delete {
                    remote_path: remote_path.to_string(),
                    source: e,
                })
            }
        }
    }

    /// List a remote directory.
    pub async fn list_files(&self, remote_path: &str) -> Result<Vec<RemoteEntry>, TransferError> {
        let mut slot = self.connection.lock().await;
        self.list_files_locked(&mut slot, remote_path).await
    }

    pub(crate) async fn list_files_locked(
        &self,
        slot: &mut ConnectionSlot,
        remote_path: &str,
    ) -> Result<Vec<RemoteEntry>, TransferError> {
        let conn = self.ensure_connected(slot).await?;

        match self.with_timeout(conn.list(remote_path)).await {
            Ok(entries) => {
                tracing::debug!(
                    remote_path = %remote_path,
                    entries = entries.len(),
                    "Listed remote directory"
                );
                Ok(entries)
            }
            Err(e) => {
                tracing::error!(remote_path = %remote_path, error = %e, "Failed to list remote directory");
                TransferSession::discard_if_broken(slot, &e);
                Err(TransferError::List {
                    remote_path: remote_path.to_string(),
                    source: e,
                })
            }
        }
    }

    async fn upload_file_locked(
        &self,
        slot: &mut ConnectionSlot,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<UploadSuccess, TransferError> {
        tracing::debug!(
            local_path = %local_path.display(),
            remote_path = %remote_path,
            "Starting upload"
        );
        let start = Instant::now();

        let result = self.run_upload_stages(slot, local_path, remote_path).await;

        match &result {
            Ok(success) => tracing::info!(
                local_path = %local_path.display(),
                remote_path = %remote_path,
                size_bytes = success.byte_size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "File uploaded"
            ),
            Err(e) => {
                tracing::error!(
                    local_path = %local_path.display(),
                    remote_path = %remote_path,
                    stage = ?e.kind(),
                    error = %e,
                    "File upload failed"
                );
                if let Some(source) = e.remote_source() {
                    TransferSession::discard_if_broken(slot, source);
                }
            }
        }

        result
    }

    async fn run_upload_stages(
        &self,
        slot: &mut ConnectionSlot,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<UploadSuccess, TransferError> {
        let conn = self.ensure_connected(slot).await?;

        let metadata = match fs::metadata(local_path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Err(TransferError::LocalFileMissing(local_path.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TransferError::LocalFileMissing(local_path.to_path_buf()))
            }
            Err(e) => {
                return Err(TransferError::LocalIo {
                    path: local_path.to_path_buf(),
                    source: e,
                })
            }
        };
        let local_size = metadata.len();
        tracing::debug!(local_path = %local_path.display(), size_bytes = local_size, "Local file size");

        let remote_dir = remote_parent_dir(remote_path);
        self.with_timeout(conn.ensure_dir(&remote_dir))
            .await
            .map_err(|e| TransferError::DirectoryCreate {
                dir: remote_dir.clone(),
                source: e,
            })?;
        tracing::debug!(remote_dir = %remote_dir, "Remote directory ensured");

        self.with_timeout(conn.put_file(local_path, remote_path))
            .await
            .map_err(|e| TransferError::Upload {
                remote_path: remote_path.to_string(),
                source: e,
            })?;

        match self.with_timeout(conn.size(remote_path)).await {
            Ok(remote_size) if remote_size != local_size => {
                return Err(TransferError::Verification {
                    remote_path: remote_path.to_string(),
                    local_size,
                    remote_size,
                });
            }
            Ok(remote_size) => {
                tracing::debug!(remote_path = %remote_path, size_bytes = remote_size, "Remote size verified");
            }
            // Stores without size support still count as a successful upload.
            Err(e) => {
                tracing::warn!(
                    remote_path = %remote_path,
                    error = %e,
                    "Could not verify remote file size"
                );
                TransferSession::discard_if_broken(slot, &e);
            }
        }

        Ok(UploadSuccess {
            local_path: local_path.to_path_buf(),
            remote_path: remote_path.to_string(),
            byte_size: local_size,
        })
    }
}
