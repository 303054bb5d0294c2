//! Local temp file cleanup
//!
//! Staged upload files are deleted after every transfer attempt, whatever its
//! outcome, so the temp directory does not grow.

use std::path::Path;
use tokio::fs;

/// What a cleanup pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub removed: usize,
    pub missing: usize,
    pub failed: usize,
}

/// Delete every path that exists. Never fails; errors are logged and the
/// remaining paths are still processed.
pub async fn cleanup_local_files<I, P>(paths: I) -> CleanupSummary
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut summary = CleanupSummary::default();

    for path in paths {
        let path = path.as_ref();
        match fs::remove_file(path).await {
            Ok(()) => {
                summary.removed += 1;
                tracing::debug!(path = %path.display(), "Cleaned up local file");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                summary.missing += 1;
            }
            Err(e) => {
                summary.failed += 1;
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to clean up local file"
                );
            }
        }
    }

    if summary.failed > 0 {
        tracing::warn!(
            removed = summary.removed,
            failed = summary.failed,
            "Local cleanup left files behind"
        );
    }

    summary
}
