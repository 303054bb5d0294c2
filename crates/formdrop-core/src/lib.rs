//! Formdrop Core Library
//!
//! This crate provides configuration, error types and tracing setup shared by
//! the formdrop crates.

pub mod config;
pub mod error;
pub mod storage_types;
pub mod telemetry;

// Re-export commonly used types
pub use config::{BaseConfig, Config, FtpConfig, LogFormat, RemoteStoreConfig, UploadConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::RemoteStoreBackend;
