//! fileward - core library
//!
//! Keeps a source directory in line with an external inventory of known
//! files. A pass lists both sides, moves files the inventory does not know
//! about into a quarantine directory (recording each move in the quarantine
//! store), then purges quarantined files whose records are older than the
//! retention window.
//!
//! # Example
//!
//! ```rust,ignore
//! use fileward::{run_pass, CleanerConfig, PassContext};
//! use fileward::storage::{SqlInventorySource, SqliteQuarantineStore};
//! use fileward_db::FilewardDb;
//! use std::sync::Arc;
//!
//! let config = CleanerConfig::load(None)?;
//! let db = FilewardDb::open(&config.database_url).await?;
//! let store = SqliteQuarantineStore::open(db.clone(), config.quarantine_table.clone()).await?;
//! let inventory = SqlInventorySource::new(
//!     db,
//!     config.inventory_view.clone(),
//!     config.inventory_column.clone(),
//! );
//!
//! let ctx = PassContext::from_config(&config, Arc::new(inventory), Arc::new(store));
//! let report = run_pass(&ctx, chrono::Utc::now()).await?;
//! println!("moved {} purged {}", report.moved, report.purged);
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod lister;
pub mod lock;
pub mod names;
pub mod pass;
pub mod reconcile;
pub mod storage;
pub mod sweep;

pub use cancel::CancelToken;
pub use config::{CleanerConfig, ConfigError, Folders};
pub use error::{CleanerError, Result};
pub use lister::list_local;
pub use lock::{try_lock_pass, PassLock};
pub use names::{FileName, FileNameError, FileSet};
pub use pass::{run_pass, PassContext, PassPlan, PassReport, Steps};
pub use reconcile::{MovedFile, ReconcileReport, Reconciler};
pub use sweep::{PurgedFile, RetentionSweeper, SweepReport};
