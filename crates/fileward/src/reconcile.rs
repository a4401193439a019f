//! Reconciler: moves files unknown to the inventory into quarantine.
//!
//! The batch runs inside one quarantine-store transaction. Each file is
//! renamed first and recorded second, so a failure part way through leaves at
//! most files in the quarantine directory without records (orphans), never
//! records without files. Orphans are logged; they are not moved back.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::cancel::CancelToken;
use crate::config::Folders;
use crate::error::{CleanerError, Result};
use crate::lister::list_local;
use crate::names::{FileName, FileSet};
use crate::storage::{QuarantineBatch, QuarantineId, QuarantineStore};

/// A file moved into quarantine and recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovedFile {
    pub id: QuarantineId,
    pub name: FileName,
    pub quarantined_at: DateTime<Utc>,
}

/// Outcome of a committed reconcile batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub moved: Vec<MovedFile>,
}

impl ReconcileReport {
    pub fn count(&self) -> usize {
        self.moved.len()
    }
}

pub struct Reconciler {
    folders: Folders,
    store: Arc<dyn QuarantineStore>,
    cancel: CancelToken,
}

impl Reconciler {
    pub fn new(folders: Folders, store: Arc<dyn QuarantineStore>) -> Self {
        Self {
            folders,
            store,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Files in `local` that `known` does not mention, in case-folded name order.
    pub fn plan(known: &FileSet, local: &FileSet) -> Vec<FileName> {
        local.difference(known).cloned().collect()
    }

    /// Quarantine every file in `local - known`.
    ///
    /// Nothing is touched when the difference is empty. On error the store
    /// transaction is rolled back; files already renamed stay in quarantine.
    pub async fn reconcile(&self, known: &FileSet, local: &FileSet) -> Result<ReconcileReport> {
        let plan = Self::plan(known, local);
        if plan.is_empty() {
            debug!(known = known.len(), local = local.len(), "Nothing to quarantine");
            return Ok(ReconcileReport::default());
        }

        info!(
            files = plan.len(),
            quarantine = %self.folders.quarantine.display(),
            "Quarantining unknown files"
        );

        fs::create_dir_all(&self.folders.quarantine).map_err(|source| {
            CleanerError::QuarantineDirFailed {
                path: self.folders.quarantine.clone(),
                source,
            }
        })?;
        let mut occupied = list_local(&self.folders.quarantine)?;

        let mut batch = self
            .store
            .begin()
            .await
            .map_err(|source| CleanerError::TransactionFailed {
                stage: "begin",
                source,
            })?;

        let mut moved: Vec<MovedFile> = Vec::with_capacity(plan.len());
        for name in plan {
            if self.cancel.is_cancelled() {
                let err = CleanerError::Cancelled {
                    processed: moved.len(),
                };
                return Err(abort(batch, orphans(&moved, None), err).await);
            }

            if let Err(err) = self.move_into_quarantine(&name, &occupied) {
                return Err(abort(batch, orphans(&moved, None), err).await);
            }
            occupied.insert(name.clone());

            let quarantined_at = Utc::now();
            match batch.append(name.as_str(), quarantined_at).await {
                Ok(id) => {
                    info!(id = %id, file = %name, "Quarantined file");
                    moved.push(MovedFile {
                        id,
                        name,
                        quarantined_at,
                    });
                }
                Err(source) => {
                    let err = CleanerError::RecordWriteFailed {
                        name: name.to_string(),
                        source,
                    };
                    return Err(abort(batch, orphans(&moved, Some(&name)), err).await);
                }
            }
        }

        if let Err(source) = batch.commit().await {
            let err = CleanerError::TransactionFailed {
                stage: "commit",
                source,
            };
            report_orphans(&orphans(&moved, None));
            error!(error = %err, "Reconcile aborted");
            return Err(err);
        }

        Ok(ReconcileReport { moved })
    }

    /// Rename `name` from the source folder into quarantine, refusing to
    /// overwrite. `occupied` holds the files already in quarantine; a name
    /// equal to one of them ignoring case is a conflict.
    fn move_into_quarantine(&self, name: &FileName, occupied: &FileSet) -> Result<()> {
        let from = self.folders.source.join(name.as_str());
        let to = self.folders.quarantine.join(name.as_str());

        if let Some(existing) = occupied.get(name) {
            return Err(CleanerError::FileConflict {
                name: name.to_string(),
                destination: self.folders.quarantine.join(existing.as_str()),
            });
        }

        match fs::symlink_metadata(&to) {
            Ok(_) => {
                return Err(CleanerError::FileConflict {
                    name: name.to_string(),
                    destination: to,
                })
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(CleanerError::MoveFailed {
                    name: name.to_string(),
                    source,
                })
            }
        }

        fs::rename(&from, &to).map_err(|source| CleanerError::MoveFailed {
            name: name.to_string(),
            source,
        })
    }
}

fn orphans(moved: &[MovedFile], pending: Option<&FileName>) -> Vec<String> {
    moved
        .iter()
        .map(|file| file.name.to_string())
        .chain(pending.map(FileName::to_string))
        .collect()
}

fn report_orphans(orphans: &[String]) {
    if !orphans.is_empty() {
        warn!(
            count = orphans.len(),
            files = ?orphans,
            "Files remain in quarantine without records"
        );
    }
}

/// Roll the batch back and hand back the error that caused it.
async fn abort(
    batch: Box<dyn QuarantineBatch>,
    orphans: Vec<String>,
    err: CleanerError,
) -> CleanerError {
    if let Err(rollback_err) = batch.rollback().await {
        warn!(error = %rollback_err, "Rollback of quarantine batch failed");
    }
    report_orphans(&orphans);
    error!(error = %err, "Reconcile aborted");
    err
}
