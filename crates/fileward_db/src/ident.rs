//! SQL identifier guard.
//!
//! View, table and column names come from configuration and have to be spliced
//! into statements (they cannot be bound as parameters). Every such name goes
//! through [`SqlIdent::parse`] first and is emitted double-quoted.

use std::error::Error;
use std::fmt;

const MAX_IDENT_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentError {
    message: String,
}

impl IdentError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for IdentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for IdentError {}

/// A validated, optionally schema-qualified SQL identifier (`name` or `schema.name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SqlIdent {
    parts: Vec<String>,
}

impl SqlIdent {
    /// Validate a configured identifier.
    pub fn parse(raw: &str) -> Result<Self, IdentError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentError::new("Identifier is empty"));
        }

        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.len() > 2 {
            return Err(IdentError::new(format!(
                "Identifier '{}' has more than one schema qualifier",
                trimmed
            )));
        }

        for part in &parts {
            validate_part(part).map_err(|reason| {
                IdentError::new(format!("Identifier '{}' is invalid: {}", trimmed, reason))
            })?;
        }

        Ok(Self {
            parts: parts.into_iter().map(str::to_string).collect(),
        })
    }

    /// Double-quoted form for splicing into SQL.
    pub fn quoted(&self) -> String {
        self.parts
            .iter()
            .map(|part| quote_ident(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Unqualified name (last segment).
    pub fn name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for SqlIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}

impl std::str::FromStr for SqlIdent {
    type Err = IdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn validate_part(part: &str) -> Result<(), &'static str> {
    if part.is_empty() {
        return Err("empty segment");
    }
    if part.len() > MAX_IDENT_LEN {
        return Err("segment too long");
    }
    let mut chars = part.chars();
    match chars.next() {
        Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {}
        _ => return Err("must start with a letter or underscore"),
    }
    if chars.any(|ch| !(ch.is_ascii_alphanumeric() || ch == '_')) {
        return Err("only letters, digits and underscores are allowed");
    }
    Ok(())
}

fn quote_ident(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len() + 2);
    escaped.push('"');
    for ch in name.chars() {
        if ch == '"' {
            escaped.push('"');
        }
        escaped.push(ch);
    }
    escaped.push('"');
    escaped
}
