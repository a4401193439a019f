//! Quarantine table operations.
//!
//! Mutations only happen through [`QuarantineTx`], so a batch of appends or
//! deletes either commits as a whole or not at all. Dropping a transaction
//! without committing rolls it back.

use crate::error::{DbError, Result};
use crate::ident::SqlIdent;
use crate::types::QuarantineRow;
use crate::FilewardDb;
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{Row, Transaction};
use tracing::{debug, debug_span, Instrument};

impl FilewardDb {
    /// Open a transaction for a batch of quarantine mutations.
    pub async fn quarantine_begin(&self, table: &SqlIdent) -> Result<QuarantineTx> {
        let tx = self.pool.begin().await?;
        debug!(table = %table, "Quarantine transaction opened");
        Ok(QuarantineTx {
            tx: Some(tx),
            table: table.clone(),
            appended: 0,
            deleted: 0,
        })
    }

    /// Records quarantined at or before `cutoff_millis`, ascending by id.
    pub async fn quarantine_list_older_than(
        &self,
        table: &SqlIdent,
        cutoff_millis: i64,
    ) -> Result<Vec<QuarantineRow>> {
        let sql = format!(
            "SELECT id, file_name, quarantined_at FROM {} WHERE quarantined_at <= ? ORDER BY id ASC",
            table.quoted()
        );
        let span = debug_span!("db.query", op = "SELECT", table = %table);

        let rows = sqlx::query(&sql)
            .bind(cutoff_millis)
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;

        rows.iter().map(row_to_quarantine).collect()
    }

    /// Every quarantine record, ascending by id.
    pub async fn quarantine_list_all(&self, table: &SqlIdent) -> Result<Vec<QuarantineRow>> {
        let sql = format!(
            "SELECT id, file_name, quarantined_at FROM {} ORDER BY id ASC",
            table.quoted()
        );
        let span = debug_span!("db.query", op = "SELECT", table = %table);

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;

        rows.iter().map(row_to_quarantine).collect()
    }

    /// Number of quarantine records.
    pub async fn quarantine_count(&self, table: &SqlIdent) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.quoted());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

fn row_to_quarantine(row: &SqliteRow) -> Result<QuarantineRow> {
    Ok(QuarantineRow {
        id: row.try_get("id")?,
        file_name: row.try_get("file_name")?,
        quarantined_at: row.try_get("quarantined_at")?,
    })
}

/// An open transaction on the quarantine table.
pub struct QuarantineTx {
    tx: Option<Transaction<'static, Sqlite>>,
    table: SqlIdent,
    appended: usize,
    deleted: usize,
}

impl std::fmt::Debug for QuarantineTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuarantineTx")
            .field("table", &self.table)
            .field("open", &self.tx.is_some())
            .field("appended", &self.appended)
            .field("deleted", &self.deleted)
            .finish()
    }
}

impl QuarantineTx {
    fn conn(&mut self) -> Result<&mut Transaction<'static, Sqlite>> {
        self.tx
            .as_mut()
            .ok_or_else(|| DbError::invalid_state("quarantine transaction already finished"))
    }

    /// Insert one record and return its id.
    pub async fn append(&mut self, file_name: &str, quarantined_at: i64) -> Result<i64> {
        let sql = format!(
            "INSERT INTO {} (file_name, quarantined_at) VALUES (?, ?)",
            self.table.quoted()
        );
        let span = debug_span!("db.exec", op = "INSERT", table = %self.table);

        let tx = self.conn()?;
        let result = sqlx::query(&sql)
            .bind(file_name)
            .bind(quarantined_at)
            .execute(&mut **tx)
            .instrument(span)
            .await?;

        self.appended += 1;
        Ok(result.last_insert_rowid())
    }

    /// Delete one record by id. Returns whether a row was removed; a missing id is not an error.
    pub async fn delete(&mut self, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.table.quoted());
        let span = debug_span!("db.exec", op = "DELETE", table = %self.table);

        let tx = self.conn()?;
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&mut **tx)
            .instrument(span)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            self.deleted += 1;
        }
        Ok(removed)
    }

    /// Commit every mutation made through this transaction.
    pub async fn commit(mut self) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| DbError::invalid_state("quarantine transaction already finished"))?;
        tx.commit().await?;
        debug!(
            table = %self.table,
            appended = self.appended,
            deleted = self.deleted,
            "Quarantine transaction committed"
        );
        Ok(())
    }

    /// Discard every mutation made through this transaction.
    pub async fn rollback(mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
            debug!(table = %self.table, "Quarantine transaction rolled back");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (FilewardDb, SqlIdent) {
        let db = FilewardDb::open_memory().await.unwrap();
        let table = SqlIdent::parse("quarantined_files").unwrap();
        db.quarantine_ensure_table(&table).await.unwrap();
        (db, table)
    }

    #[tokio::test]
    async fn test_append_commit_visible() {
        let (db, table) = setup().await;

        let mut tx = db.quarantine_begin(&table).await.unwrap();
        let first = tx.append("c.txt", 1_000).await.unwrap();
        let second = tx.append("d.txt", 2_000).await.unwrap();
        tx.commit().await.unwrap();

        assert!(second > first);
        let rows = db.quarantine_list_all(&table).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["c.txt", "d.txt"]);
    }

    #[tokio::test]
    async fn test_rollback_discards_appends() {
        let (db, table) = setup().await;

        let mut tx = db.quarantine_begin(&table).await.unwrap();
        tx.append("c.txt", 1_000).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(db.quarantine_count(&table).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_drop_without_commit_rolls_back() {
        let (db, table) = setup().await;

        {
            let mut tx = db.quarantine_begin(&table).await.unwrap();
            tx.append("c.txt", 1_000).await.unwrap();
        }

        assert_eq!(db.quarantine_count(&table).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_noop() {
        let (db, table) = setup().await;

        let mut tx = db.quarantine_begin(&table).await.unwrap();
        assert!(!tx.delete(42).await.unwrap());
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_list_older_than_is_inclusive_and_ordered() {
        let (db, table) = setup().await;

        let mut tx = db.quarantine_begin(&table).await.unwrap();
        tx.append("late.txt", 5_000).await.unwrap();
        tx.append("edge.txt", 3_000).await.unwrap();
        tx.append("early.txt", 1_000).await.unwrap();
        tx.commit().await.unwrap();

        let rows = db.quarantine_list_older_than(&table, 3_000).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["edge.txt", "early.txt"]);
        assert!(rows[0].id < rows[1].id);
    }
}
