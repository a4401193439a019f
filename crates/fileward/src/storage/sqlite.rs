//! SQLite implementations of the storage traits.
//!
//! Both adapters share one [`FilewardDb`] pool. SQL lives in `fileward_db`;
//! this module maps rows and errors into core types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fileward_db::{FilewardDb, QuarantineRow, QuarantineTx, SqlIdent};
use tracing::debug;

use super::traits::{
    retention_cutoff, InventorySource, QuarantineBatch, QuarantineId, QuarantineRecord,
    QuarantineStore,
};
use crate::error::{CleanerError, Result};
use crate::names::{FileName, FileSet};

/// Known inventory read from a view (or table) in the database.
pub struct SqlInventorySource {
    db: FilewardDb,
    view: SqlIdent,
    column: SqlIdent,
}

impl SqlInventorySource {
    pub fn new(db: FilewardDb, view: SqlIdent, column: SqlIdent) -> Self {
        Self { db, view, column }
    }
}

#[async_trait]
impl InventorySource for SqlInventorySource {
    async fn list_known(&self) -> Result<FileSet> {
        let raw = self
            .db
            .inventory_list_names(&self.view, &self.column)
            .await
            .map_err(|source| CleanerError::SourceUnavailable { source })?;

        let mut known = FileSet::new();
        for name in raw {
            match FileName::parse(name.as_str()) {
                Ok(name) => {
                    known.insert(name);
                }
                Err(err) => debug!(view = %self.view, name = %name, error = %err, "Skipped inventory entry"),
            }
        }
        Ok(known)
    }
}

/// Quarantine records kept in a SQLite table.
pub struct SqliteQuarantineStore {
    db: FilewardDb,
    table: SqlIdent,
}

impl SqliteQuarantineStore {
    /// Wrap an existing table without touching the schema.
    pub fn new(db: FilewardDb, table: SqlIdent) -> Self {
        Self { db, table }
    }

    /// Create the quarantine table if it does not exist yet.
    pub async fn open(db: FilewardDb, table: SqlIdent) -> fileward_db::Result<Self> {
        db.quarantine_ensure_table(&table).await?;
        Ok(Self::new(db, table))
    }
}

#[async_trait]
impl QuarantineStore for SqliteQuarantineStore {
    async fn begin(&self) -> fileward_db::Result<Box<dyn QuarantineBatch>> {
        let tx = self.db.quarantine_begin(&self.table).await?;
        Ok(Box::new(SqliteQuarantineBatch { tx }))
    }

    async fn list_older_than(
        &self,
        retention_days: u32,
        now: DateTime<Utc>,
    ) -> fileward_db::Result<Vec<QuarantineRecord>> {
        let cutoff = retention_cutoff(now, retention_days).timestamp_millis();
        let rows = self
            .db
            .quarantine_list_older_than(&self.table, cutoff)
            .await?;
        Ok(rows.into_iter().map(row_to_record).collect())
    }

    async fn list_all(&self) -> fileward_db::Result<Vec<QuarantineRecord>> {
        let rows = self.db.quarantine_list_all(&self.table).await?;
        Ok(rows.into_iter().map(row_to_record).collect())
    }
}

fn row_to_record(row: QuarantineRow) -> QuarantineRecord {
    let quarantined_at = row.quarantined_at_utc();
    QuarantineRecord {
        id: QuarantineId::new(row.id),
        file_name: row.file_name,
        quarantined_at,
    }
}

struct SqliteQuarantineBatch {
    tx: QuarantineTx,
}

#[async_trait]
impl QuarantineBatch for SqliteQuarantineBatch {
    async fn append(
        &mut self,
        file_name: &str,
        quarantined_at: DateTime<Utc>,
    ) -> fileward_db::Result<QuarantineId> {
        let id = self
            .tx
            .append(file_name, quarantined_at.timestamp_millis())
            .await?;
        Ok(QuarantineId::new(id))
    }

    async fn delete(&mut self, id: QuarantineId) -> fileward_db::Result<bool> {
        self.tx.delete(id.get()).await
    }

    async fn commit(self: Box<Self>) -> fileward_db::Result<()> {
        self.tx.commit().await
    }

    async fn rollback(self: Box<Self>) -> fileward_db::Result<()> {
        self.tx.rollback().await
    }
}
