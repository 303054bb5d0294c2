use crate::traits::{
    EntryKind, RemoteConnection, RemoteConnector, RemoteEntry, RemoteError, RemoteResult,
};
use crate::RemoteStoreBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use formdrop_core::FtpConfig;
use std::net::ToSocketAddrs;
use std::path::Path;
use std::time::Duration;
use suppaftp::list::File as ListEntry;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, Status};

/// FTP remote store connector
///
/// Built on suppaftp's blocking client; every command runs on tokio's blocking
/// pool so the async runtime is never stalled by socket I/O.
#[derive(Clone)]
pub struct FtpConnector {
    host: String,
    port: u16,
    user: String,
    password: String,
    timeout: Duration,
}

impl FtpConnector {
    pub fn new(config: &FtpConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            user: config.user.clone(),
            password: config.password.clone(),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl RemoteConnector for FtpConnector {
    async fn connect(&self) -> RemoteResult<Box<dyn RemoteConnection>> {
        let connector = self.clone();

        let stream = tokio::task::spawn_blocking(move || connector.open_blocking())
            .await
            .map_err(|e| RemoteError::Backend(format!("FTP connect task failed: {}", e)))??;

        Ok(Box::new(FtpConnection {
            stream: Some(stream),
        }))
    }

    fn backend_type(&self) -> RemoteStoreBackend {
        RemoteStoreBackend::Ftp
    }

    fn endpoint(&self) -> String {
        format!("ftp://{}@{}:{}", self.user, self.host, self.port)
    }
}

impl FtpConnector {
    fn open_blocking(&self) -> RemoteResult<FtpStream> {
        let addr = (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                RemoteError::Backend(format!("Could not resolve FTP host {}", self.host))
            })?;

        let mut stream = FtpStream::connect_timeout(addr, self.timeout).map_err(map_ftp_error)?;
        stream.get_ref().set_read_timeout(Some(self.timeout))?;
        stream.get_ref().set_write_timeout(Some(self.timeout))?;
        stream
            .login(self.user.as_str(), self.password.as_str())
            .map_err(map_ftp_error)?;

        Ok(stream)
    }
}

fn map_ftp_error(err: FtpError) -> RemoteError {
    match err {
        FtpError::ConnectionError(e) => RemoteError::Io(e),
        FtpError::UnexpectedResponse(ref response) if response.status == Status::FileUnavailable => {
            RemoteError::NotFound(err.to_string())
        }
        other => RemoteError::Backend(other.to_string()),
    }
}

fn to_entry(entry: &ListEntry) -> RemoteEntry {
    RemoteEntry {
        name: entry.name().to_string(),
        kind: if entry.is_directory() {
            EntryKind::Directory
        } else {
            EntryKind::File
        },
        size: entry.size() as u64,
        modified_at: Some(DateTime::<Utc>::from(entry.modified())),
    }
}

/// Directory segments `ensure_dir` walks, and whether the walk starts at `/`.
fn dir_segments(path: &str) -> (bool, Vec<String>) {
    let path = path.replace('\\', "/");
    let segments = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(str::to_string)
        .collect();
    (path.starts_with('/'), segments)
}

struct FtpConnection {
    /// Taken while a command runs on the blocking pool. Stays `None` if that
    /// command never came back (timeout or panic).
    stream: Option<FtpStream>,
}

impl FtpConnection {
    async fn run<T, F>(&mut self, op: F) -> RemoteResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut FtpStream) -> RemoteResult<T> + Send + 'static,
    {
        let mut stream = self.stream.take().ok_or(RemoteError::NotConnected)?;

        let (stream, result) = tokio::task::spawn_blocking(move || {
            let result = op(&mut stream);
            (stream, result)
        })
        .await
        .map_err(|e| RemoteError::Backend(format!("FTP command task failed: {}", e)))?;

        self.stream = Some(stream);
        result
    }
}

#[async_trait]
impl RemoteConnection for FtpConnection {
    async fn set_binary_mode(&mut self) -> RemoteResult<()> {
        self.run(|ftp| ftp.transfer_type(FileType::Binary).map_err(map_ftp_error))
            .await
    }

    async fn ensure_dir(&mut self, path: &str) -> RemoteResult<()> {
        let (absolute, segments) = dir_segments(path);
        self.run(move |ftp| {
            if absolute {
                ftp.cwd("/").map_err(map_ftp_error)?;
            }
            for segment in &segments {
                if ftp.cwd(segment).is_err() {
                    ftp.mkdir(segment).map_err(map_ftp_error)?;
                    ftp.cwd(segment).map_err(map_ftp_error)?;
                }
            }
            ftp.cwd("/").map_err(map_ftp_error)
        })
        .await
    }

    async fn put_file(&mut self, local_path: &Path, remote_path: &str) -> RemoteResult<u64> {
        let local_path = local_path.to_path_buf();
        let remote_path = remote_path.to_string();
        self.run(move |ftp| {
            let mut file = std::fs::File::open(&local_path)?;
            ftp.put_file(remote_path.as_str(), &mut file)
                .map_err(map_ftp_error)
        })
        .await
    }

    async fn get_file(&mut self, remote_path: &str, local_path: &Path) -> RemoteResult<u64> {
        let local_path = local_path.to_path_buf();
        let remote_path = remote_path.to_string();
        self.run(move |ftp| {
            let buffer = ftp.retr_as_buffer(remote_path.as_str()).map_err(map_ftp_error)?;
            let data = buffer.into_inner();
            std::fs::write(&local_path, &data)?;
            Ok(data.len() as u64)
        })
        .await
    }

    async fn size(&mut self, remote_path: &str) -> RemoteResult<u64> {
        let remote_path = remote_path.to_string();
        self.run(move |ftp| {
            ftp.size(remote_path.as_str())
                .map(|size| size as u64)
                .map_err(map_ftp_error)
        })
        .await
    }

    async fn list(&mut self, path: &str) -> RemoteResult<Vec<RemoteEntry>> {
        let path = path.to_string();
        self.run(move |ftp| {
            let lines = ftp.list(Some(path.as_str())).map_err(map_ftp_error)?;
            let mut entries = Vec::with_capacity(lines.len());
            for line in lines {
                match line.parse::<ListEntry>() {
                    Ok(entry) if entry.name() != "." && entry.name() != ".." => {
                        entries.push(to_entry(&entry))
                    }
                    Ok(_) => {}
                    Err(e) => tracing::debug!(line = %line, error = %e, "Skipping unparsable FTP listing line"),
                }
            }
            Ok(entries)
        })
        .await
    }

    async fn remove_file(&mut self, remote_path: &str) -> RemoteResult<()> {
        let remote_path = remote_path.to_string();
        self.run(move |ftp| ftp.rm(remote_path.as_str()).map_err(map_ftp_error))
            .await
    }

    async fn remove_dir(&mut self, path: &str) -> RemoteResult<()> {
        let path = path.to_string();
        self.run(move |ftp| ftp.rmdir(path.as_str()).map_err(map_ftp_error))
            .await
    }

    async fn close(&mut self) -> RemoteResult<()> {
        self.run(|ftp| ftp.quit().map_err(map_ftp_error)).await?;
        self.stream = None;
        Ok(())
    }
}
