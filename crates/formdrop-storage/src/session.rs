//! Transfer session
//!
//! A `TransferSession` owns the single connection to the remote store. It is
//! constructed explicitly (usually once per process, held in an `Arc`) and
//! connects on demand. The connection lives behind an async mutex so that
//! exactly one logical operation talks to it at a time; concurrent callers
//! queue rather than interleave protocol commands.

use crate::traits::{ConnectError, RemoteConnection, RemoteConnector, RemoteError, RemoteResult};
use crate::RemoteStoreBackend;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection slot: `Some` while connected.
pub(crate) type ConnectionSlot = Option<Box<dyn RemoteConnection>>;

/// Timeouts applied by a session
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Bound on each connect attempt (the reconnect gets its own budget).
    pub connect_timeout: Duration,
    /// Bound on every remote command.
    pub command_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            command_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// The one connection to the remote store, with its lifecycle
pub struct TransferSession {
    connector: Arc<dyn RemoteConnector>,
    pub(crate) connection: Mutex<ConnectionSlot>,
    options: SessionOptions,
}

impl TransferSession {
    /// Create a disconnected session with default timeouts
    pub fn new(connector: Arc<dyn RemoteConnector>) -> Self {
        Self::with_options(connector, SessionOptions::default())
    }

    pub fn with_options(connector: Arc<dyn RemoteConnector>, options: SessionOptions) -> Self {
        Self {
            connector,
            connection: Mutex::new(None),
            options,
        }
    }

    pub fn backend_type(&self) -> RemoteStoreBackend {
        self.connector.backend_type()
    }

    pub fn endpoint(&self) -> String {
        self.connector.endpoint()
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    /// Connect if not already connected.
    ///
    /// A failed attempt is followed by exactly one reconnect with a fresh
    /// connection. If that fails too, the error carries the reconnect's cause
    /// and the session stays disconnected.
    pub async fn connect(&self) -> Result<(), ConnectError> {
        let mut slot = self.connection.lock().await;
        self.ensure_connected(&mut slot).await.map(|_| ())
    }

    /// Close the connection if open. Idempotent; close errors are only logged.
    pub async fn disconnect(&self) {
        let mut slot = self.connection.lock().await;
        let Some(mut conn) = slot.take() else {
            return;
        };

        match self.with_timeout(conn.close()).await {
            Ok(()) => tracing::info!(endpoint = %self.endpoint(), "Disconnected from remote store"),
            Err(e) => tracing::warn!(
                endpoint = %self.endpoint(),
                error = %e,
                "Remote store disconnect error"
            ),
        }
    }

    /// Liveness probe: connect if needed, then list `/`.
    ///
    /// Returns `false` on any failure; the cause is logged and swallowed.
    pub async fn check_connection(&self) -> bool {
        let mut slot = self.connection.lock().await;

        let conn = match self.ensure_connected(&mut slot).await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(error = %e, "Remote store connection check failed");
                return false;
            }
        };

        match self.with_timeout(conn.list("/")).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    endpoint = %self.endpoint(),
                    error = %e,
                    "Remote store connection check failed"
                );
                Self::discard_if_broken(&mut slot, &e);
                false
            }
        }
    }

    /// Return the live connection in `slot`, connecting first if it is empty.
    pub(crate) async fn ensure_connected<'a>(
        &self,
        slot: &'a mut ConnectionSlot,
    ) -> Result<&'a mut Box<dyn RemoteConnection>, ConnectError> {
        if slot.is_none() {
            *slot = Some(self.open_connection().await?);
        }

        slot.as_mut().ok_or_else(|| ConnectError {
            endpoint: self.endpoint(),
            source: RemoteError::NotConnected,
        })
    }

    /// Run one remote command under the command timeout.
    pub(crate) async fn with_timeout<T, F>(&self, fut: F) -> RemoteResult<T>
    where
        F: Future<Output = RemoteResult<T>>,
    {
        match tokio::time::timeout(self.options.command_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout(self.options.command_timeout)),
        }
    }

    /// Drop a connection that can no longer be trusted so the next
    /// operation reconnects.
    pub(crate) fn discard_if_broken(slot: &mut ConnectionSlot, error: &RemoteError) {
        if error.is_connection_broken() && slot.take().is_some() {
            tracing::warn!(error = %error, "Dropping broken remote store connection");
        }
    }

    async fn open_connection(&self) -> Result<Box<dyn RemoteConnection>, ConnectError> {
        let endpoint = self.endpoint();
        let start = Instant::now();

        let conn = match self.attempt_connect().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(endpoint = %endpoint, error = %e, "Remote store connection failed");
                tracing::info!(endpoint = %endpoint, "Attempting to reconnect");

                match self.attempt_connect().await {
                    Ok(conn) => {
                        tracing::info!(endpoint = %endpoint, "Reconnected to remote store");
                        conn
                    }
                    Err(reconnect_error) => {
                        tracing::error!(
                            endpoint = %endpoint,
                            error = %reconnect_error,
                            "Remote store reconnection failed"
                        );
                        return Err(ConnectError {
                            endpoint,
                            source: reconnect_error,
                        });
                    }
                }
            }
        };

        tracing::info!(
            endpoint = %endpoint,
            backend = %self.backend_type(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Connected to remote store"
        );

        Ok(conn)
    }

    /// One connect attempt, including binary mode.
    ///
    /// A refused TYPE command is tolerated; a binary mode step that leaves the
    /// connection unusable fails the attempt.
    async fn attempt_connect(&self) -> RemoteResult<Box<dyn RemoteConnection>> {
        let mut conn =
            match tokio::time::timeout(self.options.connect_timeout, self.connector.connect())
                .await
            {
                Ok(result) => result?,
                Err(_) => return Err(RemoteError::Timeout(self.options.connect_timeout)),
            };

        match self.with_timeout(conn.set_binary_mode()).await {
            Ok(()) => tracing::debug!(endpoint = %self.endpoint(), "Set binary transfer mode"),
            Err(e) if e.is_connection_broken() => return Err(e),
            Err(e) => tracing::warn!(
                endpoint = %self.endpoint(),
                error = %e,
                "Could not set binary transfer mode"
            ),
        }

        Ok(conn)
    }
}
