//! Error types for reconcile and sweep passes.

use crate::storage::QuarantineId;
use fileward_db::DbError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CleanerError>;

/// Errors surfaced by a pass. Every variant names the file, record or path it
/// was working on when it stopped.
#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("Inventory source unavailable: {source}")]
    SourceUnavailable {
        #[source]
        source: DbError,
    },

    #[error("Source directory missing: {}", path.display())]
    DirectoryMissing { path: PathBuf },

    #[error("Failed to list directory {}: {source}", path.display())]
    ListFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create quarantine directory {}: {source}", path.display())]
    QuarantineDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{name}' already exists in quarantine: {}", destination.display())]
    FileConflict { name: String, destination: PathBuf },

    #[error("Failed to move '{name}' into quarantine: {source}")]
    MoveFailed {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to record quarantine of '{name}': {source}")]
    RecordWriteFailed {
        name: String,
        #[source]
        source: DbError,
    },

    #[error("Failed to delete quarantine record {id} ('{name}'): {source}")]
    RecordDeleteFailed {
        id: QuarantineId,
        name: String,
        #[source]
        source: DbError,
    },

    #[error("Quarantine transaction failed to {stage}: {source}")]
    TransactionFailed {
        stage: &'static str,
        #[source]
        source: DbError,
    },

    #[error("Failed to delete quarantined file '{name}' (record {id}): {source}")]
    FileDeleteFailed {
        id: QuarantineId,
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to query quarantine records: {source}")]
    QueryFailed {
        #[source]
        source: DbError,
    },

    #[error("Quarantine store error: {source}")]
    Store {
        #[source]
        source: DbError,
    },

    #[error("Pass cancelled after {processed} file(s)")]
    Cancelled { processed: usize },

    #[error("Another pass holds the lock at {}", path.display())]
    PassLocked { path: PathBuf },

    #[error("Failed to acquire pass lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CleanerError {
    /// Stable machine-readable code for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            Self::DirectoryMissing { .. } => "DIRECTORY_MISSING",
            Self::ListFailed { .. } => "LIST_FAILED",
            Self::QuarantineDirFailed { .. } => "QUARANTINE_DIR_FAILED",
            Self::FileConflict { .. } => "FILE_CONFLICT",
            Self::MoveFailed { .. } => "MOVE_FAILED",
            Self::RecordWriteFailed { .. } => "RECORD_WRITE_FAILED",
            Self::RecordDeleteFailed { .. } => "RECORD_DELETE_FAILED",
            Self::TransactionFailed { .. } => "TRANSACTION_FAILED",
            Self::FileDeleteFailed { .. } => "FILE_DELETE_FAILED",
            Self::QueryFailed { .. } => "QUERY_FAILED",
            Self::Store { .. } => "STORE_ERROR",
            Self::Cancelled { .. } => "CANCELLED",
            Self::PassLocked { .. } => "PASS_LOCKED",
            Self::Lock { .. } => "LOCK_FAILED",
        }
    }
}
