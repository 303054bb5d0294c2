use crate::traits::{
    EntryKind, RemoteConnection, RemoteConnector, RemoteEntry, RemoteError, RemoteResult,
};
use crate::RemoteStoreBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Directory-backed remote store
///
/// Remote paths such as `/uploads/2024-03-09/u/s/file.pdf` are mapped below
/// `base_path`. Useful for development and tests where no FTP server runs.
#[derive(Clone, Debug)]
pub struct LocalConnector {
    base_path: PathBuf,
}

impl LocalConnector {
    /// Create a new LocalConnector, creating `base_path` if needed
    ///
    /// # Arguments
    /// * `base_path` - Root directory standing in for the remote store
    ///   (e.g., "/var/lib/formdrop/remote")
    pub async fn new(base_path: impl Into<PathBuf>) -> RemoteResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            RemoteError::Backend(format!(
                "Failed to create remote store directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalConnector { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait]
impl RemoteConnector for LocalConnector {
    async fn connect(&self) -> RemoteResult<Box<dyn RemoteConnection>> {
        let meta = fs::metadata(&self.base_path).await?;
        if !meta.is_dir() {
            return Err(RemoteError::Backend(format!(
                "{} is not a directory",
                self.base_path.display()
            )));
        }

        Ok(Box::new(LocalConnection {
            base_path: self.base_path.clone(),
        }))
    }

    fn backend_type(&self) -> RemoteStoreBackend {
        RemoteStoreBackend::Local
    }

    fn endpoint(&self) -> String {
        format!("file://{}", self.base_path.display())
    }
}

struct LocalConnection {
    base_path: PathBuf,
}

impl LocalConnection {
    /// Convert a remote path to a filesystem path below the base directory.
    ///
    /// Rejects `..` and any other component that could escape the base.
    fn remote_to_path(&self, remote_path: &str) -> RemoteResult<PathBuf> {
        let normalized = remote_path.replace('\\', "/");
        let mut path = self.base_path.clone();

        for component in Path::new(normalized.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(RemoteError::InvalidPath(format!(
                        "{} escapes the store root",
                        remote_path
                    )))
                }
            }
        }

        Ok(path)
    }

    async fn require_exists(path: &Path, remote_path: &str) -> RemoteResult<std::fs::Metadata> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RemoteError::NotFound(remote_path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl RemoteConnection for LocalConnection {
    async fn set_binary_mode(&mut self) -> RemoteResult<()> {
        Ok(())
    }

    async fn ensure_dir(&mut self, path: &str) -> RemoteResult<()> {
        let dir = self.remote_to_path(path)?;
        fs::create_dir_all(&dir).await.map_err(|e| {
            RemoteError::Backend(format!("Failed to create {}: {}", dir.display(), e))
        })
    }

    async fn put_file(&mut self, local_path: &Path, remote_path: &str) -> RemoteResult<u64> {
        let target = self.remote_to_path(remote_path)?;
        let start = std::time::Instant::now();

        let mut source = fs::File::open(local_path).await?;
        let mut file = fs::File::create(&target).await.map_err(|e| {
            RemoteError::Backend(format!("Failed to create file {}: {}", target.display(), e))
        })?;

        let bytes_copied = tokio::io::copy(&mut source, &mut file).await.map_err(|e| {
            RemoteError::Backend(format!("Failed to write file {}: {}", target.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            RemoteError::Backend(format!("Failed to sync file {}: {}", target.display(), e))
        })?;

        tracing::debug!(
            path = %target.display(),
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local remote store write successful"
        );

        Ok(bytes_copied)
    }

    async fn get_file(&mut self, remote_path: &str, local_path: &Path) -> RemoteResult<u64> {
        let source_path = self.remote_to_path(remote_path)?;
        Self::require_exists(&source_path, remote_path).await?;

        let bytes = fs::copy(&source_path, local_path).await.map_err(|e| {
            RemoteError::Backend(format!(
                "Failed to copy {} to {}: {}",
                source_path.display(),
                local_path.display(),
                e
            ))
        })?;
        Ok(bytes)
    }

    async fn size(&mut self, remote_path: &str) -> RemoteResult<u64> {
        let path = self.remote_to_path(remote_path)?;
        let meta = Self::require_exists(&path, remote_path).await?;
        Ok(meta.len())
    }

    async fn list(&mut self, path: &str) -> RemoteResult<Vec<RemoteEntry>> {
        let dir = self.remote_to_path(path)?;
        Self::require_exists(&dir, path).await?;

        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(&dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let meta = entry.metadata().await?;
            entries.push(RemoteEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                kind: if meta.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
                size: meta.len(),
                modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn remove_file(&mut self, remote_path: &str) -> RemoteResult<()> {
        let path = self.remote_to_path(remote_path)?;
        Self::require_exists(&path, remote_path).await?;
        fs::remove_file(&path).await.map_err(|e| {
            RemoteError::Backend(format!("Failed to delete file {}: {}", path.display(), e))
        })
    }

    async fn remove_dir(&mut self, path: &str) -> RemoteResult<()> {
        let dir = self.remote_to_path(path)?;
        Self::require_exists(&dir, path).await?;
        fs::remove_dir(&dir).await.map_err(|e| {
            RemoteError::Backend(format!("Failed to remove directory {}: {}", dir.display(), e))
        })
    }

    async fn close(&mut self) -> RemoteResult<()> {
        Ok(())
    }
}
