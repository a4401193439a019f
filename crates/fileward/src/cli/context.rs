//! Shared setup for commands that touch the database.

use anyhow::{Context, Result};
use fileward::storage::{SqlInventorySource, SqliteQuarantineStore};
use fileward::{CancelToken, CleanerConfig, CleanerError, PassContext};
use fileward_db::FilewardDb;
use std::sync::Arc;
use tracing::{debug, warn};

/// Single-threaded runtime: a pass is strictly sequential.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

/// Open the database and wire the SQLite adapters into a [`PassContext`].
///
/// A database that cannot be opened is reported as `SourceUnavailable`: no
/// pass can start without the inventory.
pub async fn open_context(config: &CleanerConfig, cancel: CancelToken) -> Result<PassContext> {
    let db = FilewardDb::open(&config.database_url)
        .await
        .map_err(|source| CleanerError::SourceUnavailable { source })
        .with_context(|| {
            format!(
                "Failed to open database {}",
                fileward_db::redact_url(&config.database_url)
            )
        })?;
    debug!(db = ?db, "Database ready");

    let store = SqliteQuarantineStore::open(db.clone(), config.quarantine_table.clone())
        .await
        .map_err(|source| CleanerError::Store { source })
        .with_context(|| format!("Failed to prepare quarantine table {}", config.quarantine_table))?;

    let inventory = SqlInventorySource::new(
        db,
        config.inventory_view.clone(),
        config.inventory_column.clone(),
    );

    Ok(PassContext::from_config(config, Arc::new(inventory), Arc::new(store)).with_cancel(cancel))
}

/// Cancel `token` on Ctrl-C. The pass stops before the next file.
pub fn cancel_on_interrupt(token: &CancelToken) {
    let token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current file");
            token.cancel();
        }
    });
}
