//! Remote store housekeeping

use crate::keys::day_directory;
use crate::session::TransferSession;
use crate::traits::TransferError;
use chrono::NaiveDate;
use serde::Serialize;

/// Outcome of pruning empty submission directories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneReport {
    pub empty_found: usize,
    pub removed: usize,
}

impl TransferSession {
    /// Remove submission directories under `{base}/{date}/{owner}/` that hold
    /// no files (failed submissions leave them behind).
    ///
    /// Failing to list the day directory is an error; a failing owner listing
    /// or directory removal is logged and skipped.
    pub async fn prune_empty_submission_dirs(
        &self,
        base: &str,
        date: NaiveDate,
    ) -> Result<PruneReport, TransferError> {
        let day_dir = day_directory(base, date);
        let mut slot = self.connection.lock().await;
        let mut report = PruneReport::default();

        let owners = self.list_files_locked(&mut slot, &day_dir).await?;

        for owner in owners.iter().filter(|e| e.is_directory()) {
            let owner_dir = format!("{}/{}", day_dir, owner.name);
            let submissions = match self.list_files_locked(&mut slot, &owner_dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(dir = %owner_dir, error = %e, "Skipping owner directory");
                    continue;
                }
            };

            for submission in submissions.iter().filter(|e| e.is_directory()) {
                let submission_dir = format!("{}/{}", owner_dir, submission.name);
                let files = match self.list_files_locked(&mut slot, &submission_dir).await {
                    Ok(entries) => entries,
                    Err(e) => {
                        tracing::warn!(dir = %submission_dir, error = %e, "Skipping submission directory");
                        continue;
                    }
                };

                if files.iter().any(|e| e.is_file()) {
                    continue;
                }
                report.empty_found += 1;

                let conn = self.ensure_connected(&mut slot).await?;
                match self.with_timeout(conn.remove_dir(&submission_dir)).await {
                    Ok(()) => {
                        report.removed += 1;
                        tracing::info!(dir = %submission_dir, "Removed empty submission directory");
                    }
                    Err(e) => {
                        tracing::warn!(
                            dir = %submission_dir,
                            error = %e,
                            "Failed to remove empty submission directory"
                        );
                        TransferSession::discard_if_broken(&mut slot, &e);
                    }
                }
            }
        }

        tracing::info!(
            day_dir = %day_dir,
            empty_found = report.empty_found,
            removed = report.removed,
            "Prune finished"
        );

        Ok(report)
    }
}
