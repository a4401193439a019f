//! Storage abstraction layer for fileward.
//!
//! # Example
//!
//! ```rust,ignore
//! use fileward::storage::{QuarantineStore, SqliteQuarantineStore};
//! use fileward_db::{FilewardDb, SqlIdent};
//!
//! let db = FilewardDb::open("sqlite:records.sqlite3").await?;
//! let store = SqliteQuarantineStore::open(db, SqlIdent::parse("quarantined_files")?).await?;
//!
//! for record in store.list_all().await? {
//!     println!("{} {} {}", record.id, record.file_name, record.quarantined_at);
//! }
//! ```

mod memory;
mod sqlite;
mod traits;

pub use memory::StaticInventory;
pub use sqlite::{SqlInventorySource, SqliteQuarantineStore};
pub use traits::{
    retention_cutoff, InventorySource, QuarantineBatch, QuarantineId, QuarantineRecord,
    QuarantineStore,
};
