//! Remote store abstraction traits
//!
//! A `RemoteConnector` opens connections; a `RemoteConnection` is one live
//! connection to the remote store. Every backend (FTP, local directory, the
//! in-memory test store) implements both. The session layer owns exactly one
//! connection at a time and never shares it between concurrent operations.

use crate::RemoteStoreBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Failure of a single remote operation
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Remote path not found: {0}")]
    NotFound(String),

    #[error("Invalid remote path: {0}")]
    InvalidPath(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Remote store error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoteError {
    /// Whether the connection this error came from can no longer be trusted.
    pub fn is_connection_broken(&self) -> bool {
        matches!(
            self,
            RemoteError::Timeout(_) | RemoteError::NotConnected | RemoteError::Io(_)
        )
    }
}

/// Result type for remote operations
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Connecting failed, including the single reconnect attempt.
///
/// `source` is the cause of the last attempt.
#[derive(Debug, Error)]
#[error("Connection to {endpoint} failed (reconnect attempt): {source}")]
pub struct ConnectError {
    pub endpoint: String,
    #[source]
    pub source: RemoteError,
}

/// Failure of one file-level operation
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Local file does not exist: {}", .0.display())]
    LocalFileMissing(PathBuf),

    #[error("Failed to read local file {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {dir}: {source}")]
    DirectoryCreate {
        dir: String,
        #[source]
        source: RemoteError,
    },

    #[error("Upload to {remote_path} failed: {source}")]
    Upload {
        remote_path: String,
        #[source]
        source: RemoteError,
    },

    #[error(
        "Upload verification failed for {remote_path}: local size {local_size}, remote size {remote_size}"
    )]
    Verification {
        remote_path: String,
        local_size: u64,
        remote_size: u64,
    },

    #[error("Download of {remote_path} failed: {source}")]
    Download {
        remote_path: String,
        #[source]
        source: RemoteError,
    },

    #[error("Deletion of {remote_path} failed: {source}")]
    Delete {
        remote_path: String,
        #[source]
        source: RemoteError,
    },

    #[error("Listing {remote_path} failed: {source}")]
    List {
        remote_path: String,
        #[source]
        source: RemoteError,
    },
}

/// Machine-readable tag of a [`TransferError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferErrorKind {
    Connect,
    LocalFileMissing,
    LocalIo,
    DirectoryCreate,
    Upload,
    Verification,
    Download,
    Delete,
    List,
}

impl TransferError {
    pub fn kind(&self) -> TransferErrorKind {
        match self {
            TransferError::Connect(_) => TransferErrorKind::Connect,
            TransferError::LocalFileMissing(_) => TransferErrorKind::LocalFileMissing,
            TransferError::LocalIo { .. } => TransferErrorKind::LocalIo,
            TransferError::DirectoryCreate { .. } => TransferErrorKind::DirectoryCreate,
            TransferError::Upload { .. } => TransferErrorKind::Upload,
            TransferError::Verification { .. } => TransferErrorKind::Verification,
            TransferError::Download { .. } => TransferErrorKind::Download,
            TransferError::Delete { .. } => TransferErrorKind::Delete,
            TransferError::List { .. } => TransferErrorKind::List,
        }
    }

    /// The underlying remote error, for stages that talk to the remote store.
    pub fn remote_source(&self) -> Option<&RemoteError> {
        match self {
            TransferError::Connect(e) => Some(&e.source),
            TransferError::DirectoryCreate { source, .. }
            | TransferError::Upload { source, .. }
            | TransferError::Download { source, .. }
            | TransferError::Delete { source, .. }
            | TransferError::List { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConnectError> for formdrop_core::AppError {
    fn from(err: ConnectError) -> Self {
        formdrop_core::AppError::RemoteStore(err.to_string())
    }
}

impl From<TransferError> for formdrop_core::AppError {
    fn from(err: TransferError) -> Self {
        use formdrop_core::AppError;

        let remote_not_found = matches!(err.remote_source(), Some(RemoteError::NotFound(_)));

        match err {
            TransferError::Connect(e) => e.into(),
            TransferError::LocalFileMissing(_) => AppError::NotFound(err.to_string()),
            TransferError::LocalIo { .. } => AppError::Internal(err.to_string()),
            other if remote_not_found => AppError::NotFound(other.to_string()),
            other => AppError::Transfer(other.to_string()),
        }
    }
}

/// Kind of a remote directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

impl RemoteEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// One live connection to a remote store
///
/// Methods take `&mut self`: a connection runs one command at a time.
/// Remote paths are absolute, `/`-separated strings.
#[async_trait]
pub trait RemoteConnection: Send {
    /// Switch to binary (image) transfer mode
    async fn set_binary_mode(&mut self) -> RemoteResult<()>;

    /// Create `path` and any missing intermediate directories
    async fn ensure_dir(&mut self, path: &str) -> RemoteResult<()>;

    /// Upload a local file, returning the number of bytes sent
    async fn put_file(&mut self, local_path: &Path, remote_path: &str) -> RemoteResult<u64>;

    /// Download a remote file to a local path, returning the number of bytes written
    async fn get_file(&mut self, remote_path: &str, local_path: &Path) -> RemoteResult<u64>;

    /// Size in bytes of a remote file
    async fn size(&mut self, remote_path: &str) -> RemoteResult<u64>;

    /// List a remote directory
    async fn list(&mut self, path: &str) -> RemoteResult<Vec<RemoteEntry>>;

    /// Remove a remote file
    async fn remove_file(&mut self, remote_path: &str) -> RemoteResult<()>;

    /// Remove an empty remote directory
    async fn remove_dir(&mut self, path: &str) -> RemoteResult<()>;

    /// Close the connection politely
    async fn close(&mut self) -> RemoteResult<()>;
}

/// Opens connections to a remote store
#[async_trait]
pub trait RemoteConnector: Send + Sync {
    /// Open a fresh connection (authenticating if the backend needs it)
    async fn connect(&self) -> RemoteResult<Box<dyn RemoteConnection>>;

    /// Get the remote store backend type
    fn backend_type(&self) -> RemoteStoreBackend;

    /// Endpoint description for logs; never includes credentials
    fn endpoint(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use formdrop_core::{AppError, ErrorMetadata};

    #[test]
    fn test_kind_tags() {
        let err = TransferError::LocalFileMissing(PathBuf::from("/tmp/none"));
        assert_eq!(err.kind(), TransferErrorKind::LocalFileMissing);
        assert_eq!(
            serde_json::to_string(&err.kind()).unwrap(),
            "\"local_file_missing\""
        );
    }

    #[test]
    fn test_connect_error_keeps_cause() {
        let err = ConnectError {
            endpoint: "ftp.example.com:21".to_string(),
            source: RemoteError::Backend("530 Login incorrect".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("reconnect attempt"));
        assert!(message.contains("530 Login incorrect"));
    }

    #[test]
    fn test_app_error_mapping() {
        let connect = TransferError::Connect(ConnectError {
            endpoint: "x".to_string(),
            source: RemoteError::Timeout(Duration::from_secs(30)),
        });
        assert_eq!(AppError::from(connect).http_status_code(), 503);

        let missing = TransferError::Download {
            remote_path: "/uploads/a".to_string(),
            source: RemoteError::NotFound("/uploads/a".to_string()),
        };
        assert_eq!(AppError::from(missing).http_status_code(), 404);

        let upload = TransferError::Upload {
            remote_path: "/uploads/a".to_string(),
            source: RemoteError::Backend("552".to_string()),
        };
        assert_eq!(AppError::from(upload).error_code(), "TRANSFER_FAILED");
    }

    #[test]
    fn test_broken_connection_classification() {
        assert!(RemoteError::Timeout(Duration::from_secs(1)).is_connection_broken());
        assert!(!RemoteError::NotFound("x".to_string()).is_connection_broken());
    }
}
