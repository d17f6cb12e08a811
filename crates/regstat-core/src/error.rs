//! Error types for Regstat core.

use thiserror::Error;

use regstat_engine::engine::ConfigError;

/// Errors that can occur while loading definitions or editing a report.
#[derive(Error, Debug)]
pub enum RegstatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Refusing to read {path}: file too large ({size} bytes, max {max})")]
    FileTooLarge { path: String, size: u64, max: u64 },

    #[error("Unknown sheet '{0}'")]
    UnknownSheet(String),

    #[error("Sheet '{0}' is defined more than once")]
    DuplicateSheet(String),

    #[error("Sheet '{sheet}' has no row {row}")]
    UnknownRow { sheet: String, row: String },

    #[error("Row {row} of sheet '{sheet}' is {kind} and cannot be edited")]
    ReadOnlyRow {
        sheet: String,
        row: String,
        kind: &'static str,
    },

    #[error("Row {row} of sheet '{sheet}' is computed; its value is always derived")]
    ComputedRow { sheet: String, row: String },

    #[error("Rule '{0}' is defined more than once")]
    DuplicateRule(String),

    #[error("Rule '{rule}': tolerance must be a finite, non-negative number (got {tolerance})")]
    InvalidTolerance { rule: String, tolerance: f64 },

    #[error("Rule '{rule}': {message}")]
    InvalidReference { rule: String, message: String },
}

pub type Result<T> = std::result::Result<T, RegstatError>;
