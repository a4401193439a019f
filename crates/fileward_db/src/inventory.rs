//! Inventory view queries (the externally maintained list of known files).

use crate::error::Result;
use crate::ident::SqlIdent;
use crate::FilewardDb;
use sqlx::Row;
use std::time::Instant;
use tracing::{debug, debug_span, Instrument};

impl FilewardDb {
    /// Read every file name in the inventory view.
    ///
    /// NULL values are dropped. Duplicates are returned as-is; callers build
    /// their own set semantics on top.
    pub async fn inventory_list_names(
        &self,
        view: &SqlIdent,
        column: &SqlIdent,
    ) -> Result<Vec<String>> {
        let sql = format!("SELECT {} FROM {}", column.quoted(), view.quoted());
        let span = debug_span!(
            "db.query",
            op = "SELECT",
            table = %view,
            duration_ms = tracing::field::Empty
        );
        let start = Instant::now();

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .instrument(span.clone())
            .await?;

        let mut names = Vec::with_capacity(rows.len());
        let mut skipped = 0usize;
        for row in &rows {
            match row.try_get::<Option<String>, _>(0)? {
                Some(name) => names.push(name),
                None => skipped += 1,
            }
        }

        span.record("duration_ms", start.elapsed().as_millis() as u64);
        if skipped > 0 {
            debug!(view = %view, skipped, "Skipped NULL inventory names");
        }
        Ok(names)
    }
}
