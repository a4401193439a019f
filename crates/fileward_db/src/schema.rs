//! Schema creation for the quarantine table.
//!
//! The inventory view belongs to whoever maintains the known-file record and is
//! never created or altered here.

use crate::error::Result;
use crate::ident::SqlIdent;
use crate::FilewardDb;
use tracing::{debug_span, info, Instrument};

impl FilewardDb {
    /// Create the quarantine table and its age index if they don't exist.
    pub async fn quarantine_ensure_table(&self, table: &SqlIdent) -> Result<()> {
        let span = debug_span!("db.exec", op = "CREATE", table = %table);

        async {
            sqlx::query(&format!(
                r#"CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    file_name TEXT NOT NULL,
                    quarantined_at INTEGER NOT NULL
                )"#,
                table.quoted()
            ))
            .execute(&self.pool)
            .await?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {} ON {}(quarantined_at)",
                index_name(table),
                table.quoted()
            ))
            .execute(&self.pool)
            .await?;

            Ok::<_, crate::DbError>(())
        }
        .instrument(span)
        .await?;

        info!(table = %table, "Quarantine table verified");
        Ok(())
    }
}

/// Index names share the table's schema qualifier in SQLite.
fn index_name(table: &SqlIdent) -> String {
    let index = format!("idx_{}_quarantined_at", table.name());
    let quoted_index = format!("\"{}\"", index);
    match table.to_string().split_once('.') {
        Some((schema, _)) => format!("\"{}\".{}", schema, quoted_index),
        None => quoted_index,
    }
}
