//! In-memory inventory source.

use async_trait::async_trait;

use super::traits::InventorySource;
use crate::error::Result;
use crate::names::{FileName, FileSet};

/// A fixed known inventory.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    known: FileSet,
}

impl StaticInventory {
    pub fn new(known: FileSet) -> Self {
        Self { known }
    }

    /// Build from raw names, skipping any that are not valid base names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let known = names
            .into_iter()
            .filter_map(|name| FileName::parse(name).ok())
            .collect();
        Self { known }
    }
}

#[async_trait]
impl InventorySource for StaticInventory {
    async fn list_known(&self) -> Result<FileSet> {
        Ok(self.known.clone())
    }
}
