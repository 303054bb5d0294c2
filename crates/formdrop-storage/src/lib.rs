//! Formdrop Storage Library
//!
//! This crate moves staged upload files to the remote store. It includes the
//! remote connection traits, the FTP and local-directory backends, the
//! transfer session that owns the single connection, and the upload service
//! that ties path derivation, batch transfer and temp cleanup together.
//!
//! # Remote path format
//!
//! Every uploaded artifact lives at
//! `{base}/{YYYY-MM-DD}/{owner_id}/{submission_id}/{sanitized_file_name}`.
//! Path generation is centralized in the `keys` module.
//!
//! # Concurrency
//!
//! A [`TransferSession`] wraps exactly one connection and runs one remote
//! operation at a time. Batches upload sequentially; parallel uploads need one
//! session per concurrent operation.

pub mod cleanup;
pub mod factory;
#[cfg(feature = "remote-ftp")]
pub mod ftp;
pub mod keys;
#[cfg(feature = "remote-local")]
pub mod local;
pub mod maintenance;
pub mod service;
pub mod session;
pub mod traits;
pub mod transfer;
pub mod types;

// Test helpers (only available in test mode)
#[cfg(test)]
pub mod test_helpers;

// Re-export commonly used types
pub use cleanup::{cleanup_local_files, CleanupSummary};
pub use factory::{create_connector, create_session};
pub use formdrop_core::RemoteStoreBackend;
#[cfg(feature = "remote-ftp")]
pub use ftp::FtpConnector;
pub use keys::{generate_remote_path, generate_remote_path_for_date, sanitize_file_name};
#[cfg(feature = "remote-local")]
pub use local::LocalConnector;
pub use maintenance::PruneReport;
pub use service::{FailedUpload, StagedFile, UploadReport, UploadService, UploadedFile};
pub use session::{SessionOptions, TransferSession};
pub use traits::{
    ConnectError, EntryKind, RemoteConnection, RemoteConnector, RemoteEntry, RemoteError,
    RemoteResult, TransferError, TransferErrorKind,
};
pub use types::{BatchResult, DownloadSuccess, TransferRequest, UploadFailure, UploadSuccess};
