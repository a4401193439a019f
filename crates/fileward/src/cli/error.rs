//! Helpful error output for CLI commands
//!
//! Every error shows what went wrong, the underlying cause, and where one
//! exists a suggestion for fixing it.

use fileward::{CleanerError, ConfigError};
use std::fmt;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    /// Create a new helpful error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a suggestion for fixing the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Build from a command failure, adding suggestions for known causes.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let mut helpful = Self::new(err.to_string());

        let causes: Vec<String> = err.chain().skip(1).map(|cause| cause.to_string()).collect();
        if !causes.is_empty() {
            helpful = helpful.with_context(causes.join(": "));
        }

        if let Some(cleaner) = err.downcast_ref::<CleanerError>() {
            for suggestion in suggestions_for(cleaner) {
                helpful = helpful.with_suggestion(suggestion);
            }
        } else if let Some(config) = err.downcast_ref::<ConfigError>() {
            helpful = helpful.with_suggestion(match config {
                ConfigError::NotFound(path) => format!("TRY: Create the config file: {}", path),
                _ => "TRY: Inspect the resolved settings: fileward config".to_string(),
            });
        }

        helpful
    }
}

fn suggestions_for(err: &CleanerError) -> Vec<String> {
    match err {
        CleanerError::SourceUnavailable { .. } => vec![
            "TRY: Check database.url and that the inventory view exists".to_string(),
            "TRY: Nothing was moved; rerun once the database is reachable".to_string(),
        ],
        CleanerError::DirectoryMissing { path } => vec![format!(
            "TRY: Check that the source folder exists: ls -la {}",
            path.display()
        )],
        CleanerError::FileConflict { destination, .. } => vec![format!(
            "TRY: Move or remove the existing quarantined copy: {}",
            destination.display()
        )],
        CleanerError::PassLocked { path } => vec![
            "TRY: Wait for the other pass to finish".to_string(),
            format!("TRY: Inspect the lock owner: cat {}.json", path.display()),
        ],
        CleanerError::FileDeleteFailed { .. } | CleanerError::MoveFailed { .. } => {
            vec!["TRY: Check permissions on the source and quarantine folders".to_string()]
        }
        _ => Vec::new(),
    }
}

/// Stable error code for JSON output.
pub fn error_kind(err: &anyhow::Error) -> &'static str {
    if let Some(cleaner) = err.downcast_ref::<CleanerError>() {
        cleaner.kind()
    } else if err.downcast_ref::<ConfigError>().is_some() {
        "CONFIG_ERROR"
    } else if err.downcast_ref::<fileward_db::DbError>().is_some() {
        "DATABASE_ERROR"
    } else {
        "ERROR"
    }
}

pub fn json_error(err: &anyhow::Error) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "kind": error_kind(err),
            "message": format!("{:#}", err),
        }
    })
}

/// Print `{"error": {"kind", "message"}}` on stdout.
pub fn print_json_error(err: &anyhow::Error) {
    println!("{}", json_error(err));
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::path::PathBuf;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While processing data")
            .with_suggestion("Try again");

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While processing data"));
        assert!(display.contains("Try again"));
    }

    #[test]
    fn test_kind_survives_context() {
        let err = Err::<(), _>(CleanerError::DirectoryMissing {
            path: PathBuf::from("/srv/in"),
        })
        .context("Pass failed")
        .unwrap_err();

        assert_eq!(error_kind(&err), "DIRECTORY_MISSING");
        let json = json_error(&err);
        assert_eq!(json["error"]["kind"], "DIRECTORY_MISSING");
        assert!(json["error"]["message"].as_str().unwrap().contains("/srv/in"));

        let helpful = HelpfulError::from_anyhow(&err).to_string();
        assert!(helpful.contains("ERROR: Pass failed"));
        assert!(helpful.contains("TRY:"));
    }

    #[test]
    fn test_unknown_errors_have_generic_kind() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(error_kind(&err), "ERROR");
    }
}
