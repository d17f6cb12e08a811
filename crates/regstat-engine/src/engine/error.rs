//! Error types for sheet loading and row resolution.

use thiserror::Error;

use super::row_id::RowId;

/// Problems in a formula's text, independent of any sheet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    #[error("formula is empty")]
    Empty,

    #[error("missing operand at position {position}")]
    MissingOperand { position: usize },

    #[error("'{token}' is not a row reference")]
    InvalidToken { token: String },
}

/// A sheet or rule definition that cannot be accepted.
///
/// Raised at load time; the whole definition is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid row id '{id}'")]
    InvalidRowId { id: String },

    #[error("row {row}: malformed formula '{formula}': {reason}")]
    MalformedFormula {
        row: RowId,
        formula: String,
        reason: FormulaError,
    },

    #[error("row {row}: {message}")]
    InvalidRowDefinition { row: String, message: String },

    #[error("sheet '{sheet}': duplicate row id {id}")]
    DuplicateRow { sheet: String, id: RowId },

    #[error("sheet '{sheet}': row {row} references unknown row {token}")]
    UnknownReference {
        sheet: String,
        row: RowId,
        token: String,
    },

    #[error("sheet '{sheet}': row {row} has unknown parent {parent}")]
    UnknownParent {
        sheet: String,
        row: RowId,
        parent: RowId,
    },

    #[error("sheet '{sheet}': row {row} is nested under {parent}, which is itself a child row")]
    NestedHierarchy {
        sheet: String,
        row: RowId,
        parent: RowId,
    },

    #[error("sheet '{sheet}': row {row} is rolled up into {group} but has no weight row")]
    MissingWeight {
        sheet: String,
        row: RowId,
        group: RowId,
    },

    #[error("sheet '{sheet}': circular formula {}", join_path(path))]
    CyclicFormula { sheet: String, path: Vec<RowId> },
}

/// A per-row failure during a resolution pass.
///
/// Failures are recovered locally: the row and everything that depends on it
/// land in the resolution's error map while the rest of the sheet resolves.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("row {row}: unknown reference '{token}'")]
    Reference { row: RowId, token: String },

    #[error("circular reference {}", join_path(path))]
    Cycle { path: Vec<RowId> },
}

pub(crate) fn join_path(path: &[RowId]) -> String {
    path.iter()
        .map(RowId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
