//! Test helpers: build a transfer session over a directory-backed remote store.
//!
//! Run from workspace root: `cargo test -p formdrop-storage --test upload_pipeline_test`.

use formdrop_core::{telemetry, Config};
use formdrop_storage::{create_session, StagedFile, TransferSession, UploadService};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tempfile::TempDir;

static TRACING: Once = Once::new();

/// Test environment: session, upload service and the owned temp directories.
pub struct TestStore {
    pub session: Arc<TransferSession>,
    pub service: UploadService,
    pub config: Config,
    pub remote_dir: TempDir,
    pub staging_dir: TempDir,
}

impl TestStore {
    /// Filesystem location of a remote path.
    pub fn remote(&self, remote_path: &str) -> PathBuf {
        self.remote_dir.path().join(remote_path.trim_start_matches('/'))
    }

    /// Write a staged file the way the receiving layer would.
    pub fn stage(&self, stored_name: &str, original_name: &str, contents: &[u8]) -> StagedFile {
        let local_path = self.staging_dir.path().join(stored_name);
        std::fs::write(&local_path, contents).unwrap();
        StagedFile {
            local_path,
            original_name: original_name.to_string(),
            content_type: "application/octet-stream".to_string(),
            size: contents.len() as u64,
        }
    }

    pub fn staging(&self) -> &Path {
        self.staging_dir.path()
    }
}

pub async fn setup_test_store() -> TestStore {
    let remote_dir = tempfile::tempdir().unwrap();
    let staging_dir = tempfile::tempdir().unwrap();
    let remote = remote_dir.path().to_string_lossy().to_string();
    let staging = staging_dir.path().to_string_lossy().to_string();

    let config = Config::from_lookup(|key| match key {
        "ENVIRONMENT" => Some("test".to_string()),
        "REMOTE_STORE_BACKEND" => Some("local".to_string()),
        "LOCAL_REMOTE_STORE_PATH" => Some(remote.clone()),
        "UPLOAD_TEMP_DIR" => Some(staging.clone()),
        "FTP_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap();

    TRACING.call_once(|| {
        // Another test binary may already own the global subscriber.
        let _ = telemetry::init_tracing(&config);
    });

    let session = create_session(&config).await.unwrap();
    let service = UploadService::from_config(session.clone(), &config);

    TestStore {
        session,
        service,
        config,
        remote_dir,
        staging_dir,
    }
}
