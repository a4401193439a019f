//! Storage abstraction traits for fileward.
//!
//! The reconciler and sweeper only see these traits. The SQLite adapters in
//! [`super::sqlite`] are the production implementations; [`super::memory`]
//! holds an in-memory inventory for tests and dry runs.

use crate::error::Result;
use crate::names::FileSet;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Identifier assigned to a quarantine record by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct QuarantineId(i64);

impl QuarantineId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for QuarantineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file moved into quarantine, pending purge.
///
/// `file_name` is kept as stored; it is validated when the sweeper acts on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarantineRecord {
    pub id: QuarantineId,
    pub file_name: String,
    pub quarantined_at: DateTime<Utc>,
}

/// Read-only source of the file names that must stay in the source folder.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Snapshot of the known inventory.
    ///
    /// Fails with `SourceUnavailable` when the backing record cannot be queried.
    async fn list_known(&self) -> Result<FileSet>;
}

/// Durable record of quarantined files.
#[async_trait]
pub trait QuarantineStore: Send + Sync {
    /// Open a batch. All mutations go through the batch and land together on
    /// commit.
    async fn begin(&self) -> fileward_db::Result<Box<dyn QuarantineBatch>>;

    /// Records whose age at `now` is at least `retention_days` days, ascending
    /// by id. Recomputed on every call.
    async fn list_older_than(
        &self,
        retention_days: u32,
        now: DateTime<Utc>,
    ) -> fileward_db::Result<Vec<QuarantineRecord>>;

    /// Every record, ascending by id.
    async fn list_all(&self) -> fileward_db::Result<Vec<QuarantineRecord>>;
}

/// One transaction's worth of quarantine mutations.
///
/// Dropping a batch without calling [`QuarantineBatch::commit`] discards it.
#[async_trait]
pub trait QuarantineBatch: Send {
    async fn append(
        &mut self,
        file_name: &str,
        quarantined_at: DateTime<Utc>,
    ) -> fileward_db::Result<QuarantineId>;

    /// Delete a record by id. A missing id is a no-op; the return value says
    /// whether a record was removed.
    async fn delete(&mut self, id: QuarantineId) -> fileward_db::Result<bool>;

    async fn commit(self: Box<Self>) -> fileward_db::Result<()>;

    async fn rollback(self: Box<Self>) -> fileward_db::Result<()>;
}

/// Start of the purge window: records quarantined at or before this instant
/// are eligible.
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: u32) -> DateTime<Utc> {
    now.checked_sub_signed(chrono::Duration::days(i64::from(retention_days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
