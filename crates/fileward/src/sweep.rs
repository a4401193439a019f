//! Retention sweeper: purges quarantined files older than the retention window.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::cancel::CancelToken;
use crate::error::{CleanerError, Result};
use crate::names::FileName;
use crate::storage::{QuarantineBatch, QuarantineId, QuarantineStore};

/// A record purged from quarantine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgedFile {
    pub id: QuarantineId,
    pub name: String,
    pub quarantined_at: DateTime<Utc>,
    /// False when the file was already gone and only the record was removed.
    pub file_was_present: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub purged: Vec<PurgedFile>,
}

impl SweepReport {
    pub fn count(&self) -> usize {
        self.purged.len()
    }

    /// Records whose file had already disappeared.
    pub fn missing_files(&self) -> usize {
        self.purged.iter().filter(|p| !p.file_was_present).count()
    }
}

pub struct RetentionSweeper {
    quarantine_dir: PathBuf,
    store: Arc<dyn QuarantineStore>,
    cancel: CancelToken,
}

impl RetentionSweeper {
    pub fn new(quarantine_dir: PathBuf, store: Arc<dyn QuarantineStore>) -> Self {
        Self {
            quarantine_dir,
            store,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Delete every file (and its record) at least `retention_days` old at `now`.
    ///
    /// Files already missing are tolerated: the record is still removed. Any
    /// other delete failure aborts the batch and rolls back record deletions.
    pub async fn sweep(&self, now: DateTime<Utc>, retention_days: u32) -> Result<SweepReport> {
        let due = self
            .store
            .list_older_than(retention_days, now)
            .await
            .map_err(|source| CleanerError::QueryFailed { source })?;

        if due.is_empty() {
            debug!(retention_days, "No quarantined files due for purge");
            return Ok(SweepReport::default());
        }

        info!(records = due.len(), retention_days, "Purging expired quarantine");

        let mut batch = self
            .store
            .begin()
            .await
            .map_err(|source| CleanerError::TransactionFailed {
                stage: "begin",
                source,
            })?;

        let mut purged: Vec<PurgedFile> = Vec::with_capacity(due.len());
        for record in due {
            if self.cancel.is_cancelled() {
                let err = CleanerError::Cancelled {
                    processed: purged.len(),
                };
                return Err(abort(batch, &purged, err).await);
            }

            let file_was_present = match FileName::parse(record.file_name.as_str()) {
                Ok(name) => match self.delete_file(&name) {
                    Ok(present) => present,
                    Err(source) => {
                        let err = CleanerError::FileDeleteFailed {
                            id: record.id,
                            name: record.file_name,
                            source,
                        };
                        return Err(abort(batch, &purged, err).await);
                    }
                },
                Err(err) => {
                    warn!(
                        id = %record.id,
                        name = %record.file_name,
                        error = %err,
                        "Record does not name a file; removing record only"
                    );
                    false
                }
            };

            match batch.delete(record.id).await {
                Ok(true) => {}
                Ok(false) => debug!(id = %record.id, "Quarantine record already removed"),
                Err(source) => {
                    let err = CleanerError::RecordDeleteFailed {
                        id: record.id,
                        name: record.file_name,
                        source,
                    };
                    return Err(abort(batch, &purged, err).await);
                }
            }

            info!(id = %record.id, file = %record.file_name, "Purged quarantined file");
            purged.push(PurgedFile {
                id: record.id,
                name: record.file_name,
                quarantined_at: record.quarantined_at,
                file_was_present,
            });
        }

        if let Err(source) = batch.commit().await {
            let err = CleanerError::TransactionFailed {
                stage: "commit",
                source,
            };
            error!(error = %err, "Sweep aborted");
            return Err(err);
        }

        Ok(SweepReport { purged })
    }

    /// Returns whether the file existed.
    fn delete_file(&self, name: &FileName) -> io::Result<bool> {
        let path = self.quarantine_dir.join(name.as_str());
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Quarantined file already gone; removing its record");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

async fn abort(
    batch: Box<dyn QuarantineBatch>,
    purged: &[PurgedFile],
    err: CleanerError,
) -> CleanerError {
    if let Err(rollback_err) = batch.rollback().await {
        warn!(error = %rollback_err, "Rollback of purge batch failed");
    }
    let deleted = purged.iter().filter(|p| p.file_was_present).count();
    if deleted > 0 {
        warn!(
            count = deleted,
            "Deleted files keep their records until the next sweep"
        );
    }
    error!(error = %err, "Sweep aborted");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteQuarantineStore;
    use chrono::Duration;
    use fileward_db::{FilewardDb, SqlIdent};
    use tempfile::TempDir;

    async fn store() -> Arc<SqliteQuarantineStore> {
        let db = FilewardDb::open_memory().await.unwrap();
        let store = SqliteQuarantineStore::open(db, SqlIdent::parse("quarantined_files").unwrap())
            .await
            .unwrap();
        Arc::new(store)
    }

    async fn seed(store: &SqliteQuarantineStore, records: &[(&str, DateTime<Utc>)]) {
        let mut batch = store.begin().await.unwrap();
        for (name, at) in records {
            batch.append(name, *at).await.unwrap();
        }
        batch.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_purges_due_files_and_records() {
        let tmp = TempDir::new().unwrap();
        let store = store().await;
        let now = Utc::now();
        fs::write(tmp.path().join("old.txt"), b"x").unwrap();
        fs::write(tmp.path().join("new.txt"), b"x").unwrap();
        seed(
            &store,
            &[("old.txt", now - Duration::days(31)), ("new.txt", now - Duration::days(1))],
        )
        .await;

        let sweeper = RetentionSweeper::new(tmp.path().to_path_buf(), store.clone());
        let report = sweeper.sweep(now, 30).await.unwrap();

        assert_eq!(report.count(), 1);
        assert_eq!(report.purged[0].name, "old.txt");
        assert!(!tmp.path().join("old.txt").exists());
        assert!(tmp.path().join("new.txt").exists());
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_still_removes_record() {
        let tmp = TempDir::new().unwrap();
        let store = store().await;
        let now = Utc::now();
        seed(&store, &[("gone.txt", now - Duration::days(40))]).await;

        let sweeper = RetentionSweeper::new(tmp.path().to_path_buf(), store.clone());
        let report = sweeper.sweep(now, 30).await.unwrap();

        assert_eq!(report.count(), 1);
        assert_eq!(report.missing_files(), 1);
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_record_name_never_touches_filesystem() {
        let tmp = TempDir::new().unwrap();
        let quarantine = tmp.path().join("quarantine");
        fs::create_dir_all(&quarantine).unwrap();
        fs::write(tmp.path().join("outside.txt"), b"keep").unwrap();
        let store = store().await;
        let now = Utc::now();
        seed(&store, &[("../outside.txt", now - Duration::days(90))]).await;

        let sweeper = RetentionSweeper::new(quarantine, store.clone());
        let report = sweeper.sweep(now, 30).await.unwrap();

        assert_eq!(report.count(), 1);
        assert!(!report.purged[0].file_was_present);
        assert!(tmp.path().join("outside.txt").exists());
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_rolls_back_records() {
        let tmp = TempDir::new().unwrap();
        let store = store().await;
        let now = Utc::now();
        fs::write(tmp.path().join("a.txt"), b"x").unwrap();
        // A directory where a file is expected cannot be removed with remove_file.
        fs::create_dir(tmp.path().join("b.txt")).unwrap();
        seed(
            &store,
            &[("a.txt", now - Duration::days(50)), ("b.txt", now - Duration::days(50))],
        )
        .await;

        let sweeper = RetentionSweeper::new(tmp.path().to_path_buf(), store.clone());
        let err = sweeper.sweep(now, 30).await.unwrap_err();

        assert!(matches!(err, CleanerError::FileDeleteFailed { ref name, .. } if name == "b.txt"));
        // a.txt is physically gone but both records survive the rollback.
        assert!(!tmp.path().join("a.txt").exists());
        assert_eq!(store.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_nothing_due_opens_no_batch() {
        let tmp = TempDir::new().unwrap();
        let store = store().await;

        let sweeper = RetentionSweeper::new(tmp.path().to_path_buf(), store);
        let report = sweeper.sweep(Utc::now(), 30).await.unwrap();
        assert_eq!(report.count(), 0);
    }
}
