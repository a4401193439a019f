//! File names and name sets.
//!
//! A [`FileName`] is a bare base name (no directory component). Comparison,
//! ordering and hashing are case-insensitive, matching how the source folder
//! and the inventory are reconciled: `Report.PDF` and `report.pdf` are the
//! same file.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileNameError {
    #[error("file name is empty")]
    Empty,

    #[error("'{0}' is a relative path marker, not a file name")]
    DotEntry(String),

    #[error("'{0}' contains a path separator")]
    Separator(String),

    #[error("file name contains a NUL byte")]
    Nul,
}

/// A base file name with case-insensitive identity.
#[derive(Clone)]
pub struct FileName {
    raw: String,
    key: String,
}

impl FileName {
    /// Validate a base name.
    pub fn parse(raw: impl Into<String>) -> Result<Self, FileNameError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(FileNameError::Empty);
        }
        if raw == "." || raw == ".." {
            return Err(FileNameError::DotEntry(raw));
        }
        if raw.contains('/') || raw.contains('\\') {
            return Err(FileNameError::Separator(raw));
        }
        if raw.contains('\0') {
            return Err(FileNameError::Nul);
        }
        let key = fold_case(&raw);
        Ok(Self { raw, key })
    }

    /// The name as spelled on disk / in the record.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Case-folded comparison key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

fn fold_case(name: &str) -> String {
    name.to_lowercase()
}

impl PartialEq for FileName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for FileName {}

impl PartialOrd for FileName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FileName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl Hash for FileName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl fmt::Debug for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileName({:?})", self.raw)
    }
}

impl AsRef<std::path::Path> for FileName {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.raw)
    }
}

impl std::str::FromStr for FileName {
    type Err = FileNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FileName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

/// A deduplicated, case-insensitively ordered snapshot of file names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    names: BTreeSet<FileName>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a name. Returns `false` (and keeps the existing spelling) if a
    /// case-insensitive equal name is already present.
    pub fn insert(&mut self, name: FileName) -> bool {
        if let Some(existing) = self.names.get(&name) {
            if existing.as_str() != name.as_str() {
                warn!(
                    kept = %existing,
                    dropped = %name,
                    "File names differ only by case; treating them as one file"
                );
            }
            return false;
        }
        self.names.insert(name)
    }

    pub fn contains(&self, name: &FileName) -> bool {
        self.names.contains(name)
    }

    /// The stored spelling of a case-insensitively equal name.
    pub fn get(&self, name: &FileName) -> Option<&FileName> {
        self.names.get(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, FileName> {
        self.names.iter()
    }

    /// Names in `self` that are not in `other`, in case-folded order.
    pub fn difference<'a>(&'a self, other: &'a FileSet) -> impl Iterator<Item = &'a FileName> + 'a {
        self.names.difference(&other.names)
    }
}

impl FromIterator<FileName> for FileSet {
    fn from_iter<I: IntoIterator<Item = FileName>>(iter: I) -> Self {
        let mut set = FileSet::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a FileName;
    type IntoIter = btree_set::Iter<'a, FileName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

impl IntoIterator for FileSet {
    type Item = FileName;
    type IntoIter = btree_set::IntoIter<FileName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}
