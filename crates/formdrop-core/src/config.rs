//! Configuration module
//!
//! This module provides the configuration structures for the upload pipeline:
//! remote store credentials, upload paths and limits, and logging settings.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage_types::RemoteStoreBackend;

// Common constants
const FTP_PORT: u16 = 21;
const FTP_TIMEOUT_SECS: u64 = 30;
const UPLOAD_PATH: &str = "/uploads";
const UPLOAD_TEMP_DIR: &str = "./uploads/temp";
const MAX_FILE_SIZE: u64 = 10_485_760;
const MAX_FILES_PER_FORM: usize = 10;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Base configuration shared by every service
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub environment: String,
    pub log_format: LogFormat,
}

/// FTP server credentials
#[derive(Clone)]
pub struct FtpConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub port: u16,
    /// Applied to the TCP connect and to every command afterwards.
    pub timeout: Duration,
}

impl fmt::Debug for FtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Remote store selection and backend settings
#[derive(Clone, Debug)]
pub struct RemoteStoreConfig {
    pub backend: RemoteStoreBackend,
    pub ftp: Option<FtpConfig>,
    /// Root directory used by the local backend.
    pub local_path: Option<PathBuf>,
    pub timeout: Duration,
}

/// Upload path and limit settings
#[derive(Clone, Debug)]
pub struct UploadConfig {
    /// Remote base directory every derived path starts with.
    pub upload_path: String,
    /// Where the receiving layer stages incoming files.
    pub temp_dir: PathBuf,
    pub max_file_size_bytes: u64,
    pub max_files_per_form: usize,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub remote_store: RemoteStoreConfig,
    pub upload: UploadConfig,
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let log_format = match lookup("LOG_FORMAT")
            .unwrap_or_else(|| "text".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            "text" | "pretty" => LogFormat::Text,
            other => return Err(anyhow::anyhow!("Invalid LOG_FORMAT: {}", other)),
        };

        let backend = match lookup("REMOTE_STORE_BACKEND") {
            Some(value) => value.parse::<RemoteStoreBackend>()?,
            None => RemoteStoreBackend::Ftp,
        };

        let timeout = Duration::from_secs(
            lookup("FTP_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(FTP_TIMEOUT_SECS),
        );

        // FTP credentials are only assembled when all three are present;
        // validate() reports what is missing.
        let ftp = match (lookup("FTP_HOST"), lookup("FTP_USER"), lookup("FTP_PASSWORD")) {
            (Some(host), Some(user), Some(password)) => Some(FtpConfig {
                host,
                user,
                password,
                port: lookup("FTP_PORT")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(FTP_PORT),
                timeout,
            }),
            _ => None,
        };

        let remote_store = RemoteStoreConfig {
            backend,
            ftp,
            local_path: lookup("LOCAL_REMOTE_STORE_PATH").map(PathBuf::from),
            timeout,
        };

        let upload = UploadConfig {
            upload_path: lookup("UPLOAD_PATH").unwrap_or_else(|| UPLOAD_PATH.to_string()),
            temp_dir: lookup("UPLOAD_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(UPLOAD_TEMP_DIR)),
            max_file_size_bytes: lookup("MAX_FILE_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_FILE_SIZE),
            max_files_per_form: lookup("MAX_FILES_PER_FORM")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_FILES_PER_FORM),
        };

        Ok(Config {
            base: BaseConfig {
                environment,
                log_format,
            },
            remote_store,
            upload,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.remote_store.backend {
            RemoteStoreBackend::Ftp => {
                if self.remote_store.ftp.is_none() {
                    return Err(anyhow::anyhow!(
                        "FTP_HOST, FTP_USER and FTP_PASSWORD must be set when using the FTP backend"
                    ));
                }
            }
            RemoteStoreBackend::Local => {
                if self.remote_store.local_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_REMOTE_STORE_PATH must be set when using the local backend"
                    ));
                }
            }
        }

        if self.upload.upload_path.trim().is_empty() {
            return Err(anyhow::anyhow!("UPLOAD_PATH cannot be empty"));
        }

        if self.upload.max_files_per_form == 0 {
            return Err(anyhow::anyhow!("MAX_FILES_PER_FORM must be at least 1"));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn environment(&self) -> &str {
        &self.base.environment
    }

    pub fn log_format(&self) -> LogFormat {
        self.base.log_format
    }

    pub fn remote_store_backend(&self) -> RemoteStoreBackend {
        self.remote_store.backend
    }

    pub fn ftp(&self) -> Option<&FtpConfig> {
        self.remote_store.ftp.as_ref()
    }

    pub fn local_remote_store_path(&self) -> Option<&PathBuf> {
        self.remote_store.local_path.as_ref()
    }

    pub fn remote_timeout(&self) -> Duration {
        self.remote_store.timeout
    }

    pub fn upload_path(&self) -> &str {
        &self.upload.upload_path
    }

    pub fn upload_temp_dir(&self) -> &PathBuf {
        &self.upload.temp_dir
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.upload.max_file_size_bytes
    }

    pub fn max_files_per_form(&self) -> usize {
        self.upload.max_files_per_form
    }
}
