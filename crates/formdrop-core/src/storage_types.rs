use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Remote store backend types
///
/// Defined in core because configuration selects the backend before any
/// storage code runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStoreBackend {
    Ftp,
    Local,
}

impl FromStr for RemoteStoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ftp" => Ok(RemoteStoreBackend::Ftp),
            "local" => Ok(RemoteStoreBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid remote store backend: {}", s)),
        }
    }
}

impl Display for RemoteStoreBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RemoteStoreBackend::Ftp => write!(f, "ftp"),
            RemoteStoreBackend::Local => write!(f, "local"),
        }
    }
}
