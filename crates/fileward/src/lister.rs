//! Source directory listing.

use crate::error::{CleanerError, Result};
use crate::names::{FileName, FileSet};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Base names of the regular files directly inside `dir`.
///
/// Subdirectories are skipped and never traversed. Symlinks that resolve to a
/// file count as files. Names are sorted before they are collected, so when
/// two entries differ only by case the lexically first spelling is the one
/// kept.
pub fn list_local(dir: &Path) -> Result<FileSet> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(CleanerError::DirectoryMissing {
                path: dir.to_path_buf(),
            })
        }
        Err(source) => {
            if !dir.is_dir() && dir.exists() {
                return Err(CleanerError::DirectoryMissing {
                    path: dir.to_path_buf(),
                });
            }
            return Err(CleanerError::ListFailed {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let list_err = |source| CleanerError::ListFailed {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(list_err)?;
        let path = entry.path();

        // fs::metadata follows symlinks; a dangling link is not a file.
        let is_file = match fs::metadata(&path) {
            Ok(meta) => meta.is_file(),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Skipped unreadable entry");
                false
            }
        };
        if !is_file {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => warn!(dir = %dir.display(), name = ?raw, "Skipped non-UTF-8 file name"),
        }
    }

    names.sort();

    let mut local = FileSet::new();
    for name in names {
        match FileName::parse(name) {
            Ok(name) => {
                local.insert(name);
            }
            Err(err) => warn!(dir = %dir.display(), error = %err, "Skipped invalid file name"),
        }
    }

    debug!(dir = %dir.display(), files = local.len(), "Listed source directory");
    Ok(local)
}
