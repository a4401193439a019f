//! Configuration loading
//!
//! Reads `<home>/config.toml` (or an explicit `--config` path), then applies
//! `FILEWARD_*` environment overrides and validates the result into a
//! [`CleanerConfig`] that is passed by value into the pass.

use fileward_db::SqlIdent;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Retention used when the configured value is absent or unusable.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

pub const ENV_DATABASE_URL: &str = "FILEWARD_DATABASE_URL";
pub const ENV_SOURCE_DIR: &str = "FILEWARD_SOURCE_DIR";
pub const ENV_QUARANTINE_DIR: &str = "FILEWARD_QUARANTINE_DIR";
pub const ENV_RETENTION_DAYS: &str = "FILEWARD_RETENTION_DAYS";

/// Error type for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config not found at: {0}")]
    NotFound(String),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Result type for config operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Source and quarantine directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folders {
    pub source: PathBuf,
    pub quarantine: PathBuf,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct CleanerConfig {
    pub database_url: String,
    pub folders: Folders,
    #[serde(serialize_with = "serialize_ident")]
    pub inventory_view: SqlIdent,
    #[serde(serialize_with = "serialize_ident")]
    pub inventory_column: SqlIdent,
    #[serde(serialize_with = "serialize_ident")]
    pub quarantine_table: SqlIdent,
    pub retention_days: u32,
}

fn serialize_ident<S: serde::Serializer>(
    ident: &SqlIdent,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(ident)
}

/// config.toml as written on disk. Every field is optional here; required
/// settings are checked in [`CleanerConfig::resolve`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub folders: FoldersSection,
    #[serde(default)]
    pub retention: RetentionSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSection {
    pub url: Option<String>,
    pub inventory_view: Option<String>,
    pub inventory_column: Option<String>,
    pub quarantine_table: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoldersSection {
    pub source: Option<PathBuf>,
    pub quarantine: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetentionSection {
    pub days: Option<RawDays>,
}

/// Retention as written: `days = 30` or `days = "30"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawDays {
    Int(i64),
    Text(String),
}

fn default_inventory_view() -> &'static str {
    "known_files"
}

fn default_inventory_column() -> &'static str {
    "file_name"
}

fn default_quarantine_table() -> &'static str {
    "quarantined_files"
}

/// Default config location: `<home>/config.toml`
pub fn default_config_path() -> PathBuf {
    fileward_logging::fileward_home().join("config.toml")
}

impl FileConfig {
    /// Parse a config file. A missing file yields an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_existing(path)
    }

    /// Parse a config file that must exist.
    pub fn load_existing(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }
}

impl CleanerConfig {
    /// Load from `explicit` (must exist) or the default path (may be absent),
    /// with overrides from the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit {
            Some(path) => FileConfig::load_existing(path)?,
            None => FileConfig::load(&default_config_path())?,
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge environment overrides into `file` and validate.
    pub fn resolve<F>(file: FileConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let database_url = env(ENV_DATABASE_URL)
            .or(file.database.url)
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("database.url"))?;

        let source = env(ENV_SOURCE_DIR)
            .map(PathBuf::from)
            .or(file.folders.source)
            .ok_or(ConfigError::Missing("folders.source"))?;
        let quarantine = env(ENV_QUARANTINE_DIR)
            .map(PathBuf::from)
            .or(file.folders.quarantine)
            .ok_or(ConfigError::Missing("folders.quarantine"))?;

        if normalize(&source) == normalize(&quarantine) {
            return Err(ConfigError::Invalid(format!(
                "source and quarantine folders are the same: {}",
                source.display()
            )));
        }

        let raw_days = env(ENV_RETENTION_DAYS)
            .map(RawDays::Text)
            .or(file.retention.days);

        Ok(Self {
            database_url,
            folders: Folders { source, quarantine },
            inventory_view: ident(
                "database.inventory_view",
                file.database.inventory_view.as_deref(),
                default_inventory_view(),
            )?,
            inventory_column: ident(
                "database.inventory_column",
                file.database.inventory_column.as_deref(),
                default_inventory_column(),
            )?,
            quarantine_table: ident(
                "database.quarantine_table",
                file.database.quarantine_table.as_deref(),
                default_quarantine_table(),
            )?,
            retention_days: retention_days(raw_days.as_ref()),
        })
    }
}

fn ident(setting: &str, value: Option<&str>, default: &str) -> Result<SqlIdent> {
    let value = value.unwrap_or(default);
    SqlIdent::parse(value).map_err(|err| ConfigError::Invalid(format!("{}: {}", setting, err)))
}

fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

/// Validate a raw retention value, falling back to the default.
pub fn retention_days(raw: Option<&RawDays>) -> u32 {
    let parsed = match raw {
        None => return DEFAULT_RETENTION_DAYS,
        Some(RawDays::Int(days)) => u32::try_from(*days).ok(),
        Some(RawDays::Text(text)) => text.trim().parse::<u32>().ok(),
    };

    match parsed {
        Some(days) => days,
        None => {
            warn!(
                value = ?raw,
                default = DEFAULT_RETENTION_DAYS,
                "Invalid retention days; using default"
            );
            DEFAULT_RETENTION_DAYS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn parse(toml_text: &str) -> FileConfig {
        toml::from_str(toml_text).unwrap()
    }

    const FULL: &str = r#"
        [database]
        url = "sqlite:/var/lib/fileward/records.sqlite3"
        inventory_view = "known_files"
        quarantine_table = "main.quarantined_files"

        [folders]
        source = "/srv/uploads"
        quarantine = "/srv/uploads-quarantine"

        [retention]
        days = 14
    "#;

    #[test]
    fn test_resolve_full_config() {
        let config = CleanerConfig::resolve(parse(FULL), no_env).unwrap();

        assert_eq!(config.database_url, "sqlite:/var/lib/fileward/records.sqlite3");
        assert_eq!(config.folders.source, PathBuf::from("/srv/uploads"));
        assert_eq!(config.inventory_column.to_string(), "file_name");
        assert_eq!(config.quarantine_table.to_string(), "main.quarantined_files");
        assert_eq!(config.retention_days, 14);
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [
            (ENV_SOURCE_DIR, "/data/in"),
            (ENV_RETENTION_DAYS, "7"),
            (ENV_DATABASE_URL, ""),
        ]
        .into_iter()
        .collect();

        let config =
            CleanerConfig::resolve(parse(FULL), |key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.folders.source, PathBuf::from("/data/in"));
        assert_eq!(config.retention_days, 7);
        // Blank values are ignored.
        assert_eq!(config.database_url, "sqlite:/var/lib/fileward/records.sqlite3");
    }

    #[test]
    fn test_retention_defaulting() {
        assert_eq!(retention_days(None), 30);
        assert_eq!(retention_days(Some(&RawDays::Int(0))), 0);
        assert_eq!(retention_days(Some(&RawDays::Int(-3))), 30);
        assert_eq!(retention_days(Some(&RawDays::Text(" 45 ".into()))), 45);
        assert_eq!(retention_days(Some(&RawDays::Text("forever".into()))), 30);
        assert_eq!(retention_days(Some(&RawDays::Text("-1".into()))), 30);
    }

    #[test]
    fn test_retention_accepts_string_in_toml() {
        let file = parse(
            r#"
            [database]
            url = "sqlite::memory:"
            [folders]
            source = "in"
            quarantine = "out"
            [retention]
            days = "60"
            "#,
        );
        assert_eq!(CleanerConfig::resolve(file, no_env).unwrap().retention_days, 60);
    }

    #[test]
    fn test_missing_required_settings() {
        let err = CleanerConfig::resolve(FileConfig::default(), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("database.url")));

        let file = parse("[database]\nurl = \"sqlite::memory:\"\n[folders]\nsource = \"in\"\n");
        let err = CleanerConfig::resolve(file, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("folders.quarantine")));
    }

    #[test]
    fn test_rejects_same_folder() {
        let file = parse(
            "[database]\nurl = \"sqlite::memory:\"\n[folders]\nsource = \"/srv/in\"\nquarantine = \"/srv/./in\"\n",
        );
        let err = CleanerConfig::resolve(file, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_unsafe_identifier() {
        let file = parse(
            "[database]\nurl = \"sqlite::memory:\"\ninventory_view = \"files; DROP TABLE x\"\n[folders]\nsource = \"a\"\nquarantine = \"b\"\n",
        );
        let err = CleanerConfig::resolve(file, no_env).unwrap_err();
        assert!(err.to_string().contains("database.inventory_view"));
    }

    #[test]
    fn test_load_missing_default_is_empty() {
        let temp = TempDir::new().unwrap();
        let config = FileConfig::load(&temp.path().join("config.toml")).unwrap();
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_load_existing_requires_file() {
        let temp = TempDir::new().unwrap();
        let err = FileConfig::load_existing(&temp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
