//! Row identifier parsing and formatting.
//!
//! Statement rows are keyed by short identifiers made of letters followed by
//! digits (e.g. "C17", "T40"). Identifiers are normalised to upper case so
//! `c17` and `C17` name the same row.
//!
//! # Examples
//!
//! ```ignore
//! let id = RowId::parse("c17").unwrap();
//! assert_eq!(id.as_str(), "C17");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::OnceLock;

use super::error::ConfigError;

/// A validated row identifier within one sheet.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RowId(String);

impl RowId {
    /// Parse a row identifier (e.g. "C17", "t4").
    pub fn parse(name: &str) -> Result<RowId, ConfigError> {
        let trimmed = name.trim();
        if Self::is_valid(trimmed) {
            Ok(RowId(trimmed.to_ascii_uppercase()))
        } else {
            Err(ConfigError::InvalidRowId {
                id: name.to_string(),
            })
        }
    }

    /// Whether `name` matches `[A-Za-z]+[0-9]+` exactly.
    pub fn is_valid(name: &str) -> bool {
        row_id_re().is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn row_id_re() -> &'static Regex {
    static ROW_ID_RE: OnceLock<Regex> = OnceLock::new();
    ROW_ID_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z]+[0-9]+$")
            .expect("row id regex must compile")
    })
}

impl std::str::FromStr for RowId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RowId {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RowId> for String {
    fn from(id: RowId) -> String {
        id.0
    }
}

impl Borrow<str> for RowId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
