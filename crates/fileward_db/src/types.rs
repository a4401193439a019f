//! Row types returned by the database layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the quarantine table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarantineRow {
    /// Store-assigned identifier, ascending in insertion order
    pub id: i64,
    /// Base name of the quarantined file
    pub file_name: String,
    /// When the file was moved into quarantine (Unix millis)
    pub quarantined_at: i64,
}

impl QuarantineRow {
    /// Quarantine time as a UTC timestamp.
    pub fn quarantined_at_utc(&self) -> DateTime<Utc> {
        crate::FilewardDb::millis_to_datetime(self.quarantined_at)
    }
}
