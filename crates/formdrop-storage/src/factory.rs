#[cfg(feature = "remote-ftp")]
use crate::FtpConnector;
#[cfg(feature = "remote-local")]
use crate::LocalConnector;
use crate::session::{SessionOptions, TransferSession};
use crate::traits::{RemoteConnector, RemoteError, RemoteResult};
use crate::RemoteStoreBackend;
use formdrop_core::Config;
use std::sync::Arc;

/// Create a remote store connector based on configuration
pub async fn create_connector(config: &Config) -> RemoteResult<Arc<dyn RemoteConnector>> {
    match config.remote_store_backend() {
        #[cfg(feature = "remote-ftp")]
        RemoteStoreBackend::Ftp => {
            let ftp = config.ftp().ok_or_else(|| {
                RemoteError::Backend(
                    "FTP_HOST, FTP_USER and FTP_PASSWORD not configured".to_string(),
                )
            })?;
            Ok(Arc::new(FtpConnector::new(ftp)))
        }

        #[cfg(not(feature = "remote-ftp"))]
        RemoteStoreBackend::Ftp => Err(RemoteError::Backend(
            "FTP backend not available (remote-ftp feature not enabled)".to_string(),
        )),

        #[cfg(feature = "remote-local")]
        RemoteStoreBackend::Local => {
            let base_path = config.local_remote_store_path().ok_or_else(|| {
                RemoteError::Backend("LOCAL_REMOTE_STORE_PATH not configured".to_string())
            })?;
            let connector = LocalConnector::new(base_path.clone()).await?;
            Ok(Arc::new(connector))
        }

        #[cfg(not(feature = "remote-local"))]
        RemoteStoreBackend::Local => Err(RemoteError::Backend(
            "Local backend not available (remote-local feature not enabled)".to_string(),
        )),
    }
}

/// Create a disconnected transfer session using the configured timeout
pub async fn create_session(config: &Config) -> RemoteResult<Arc<TransferSession>> {
    let connector = create_connector(config).await?;
    let options = SessionOptions {
        connect_timeout: config.remote_timeout(),
        command_timeout: config.remote_timeout(),
    };

    tracing::info!(
        backend = %connector.backend_type(),
        endpoint = %connector.endpoint(),
        "Remote store configured"
    );

    Ok(Arc::new(TransferSession::with_options(connector, options)))
}
