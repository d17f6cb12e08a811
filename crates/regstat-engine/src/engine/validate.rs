//! Cross-statement validation.
//!
//! A [`ValidationRule`] asserts that two values, usually from different
//! sheets, agree within a tolerance. [`run_validations`] checks a rule list
//! against resolved sheets and reports every rule, in declaration order.
//! Mismatches are ordinary results, never errors.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::RowError;
use super::format::format_number;
use super::formula::Formula;
use super::resolve::Resolution;
use super::row_id::RowId;

/// Default maximum absolute difference for two values to be equal.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Resolved sheets keyed by sheet name.
pub type ResolvedSheets = HashMap<String, Resolution>;

/// Closure deriving a value from already-resolved sheets.
pub type DeriveFn = Arc<dyn Fn(&ResolvedSheets) -> f64 + Send + Sync>;

/// Where one side of a rule gets its value.
#[derive(Clone)]
pub enum ValueRef {
    /// A single row of a sheet.
    Row {
        sheet: String,
        row: RowId,
        label: String,
    },
    /// A formula over resolved rows of one sheet, e.g. `C18+C19+C20+C21`.
    Expr {
        sheet: String,
        formula: Formula,
        label: String,
    },
    /// An arbitrary function of the resolved sheets.
    Derived { label: String, derive: DeriveFn },
}

impl ValueRef {
    /// Reference a row, labelled `sheet!row`.
    pub fn row(sheet: &str, row: RowId) -> ValueRef {
        ValueRef::Row {
            label: format!("{sheet}!{row}"),
            sheet: sheet.to_string(),
            row,
        }
    }

    /// Reference a formula over one sheet, labelled `sheet!formula`.
    pub fn expr(sheet: &str, formula: Formula) -> ValueRef {
        ValueRef::Expr {
            label: format!("{sheet}!{formula}"),
            sheet: sheet.to_string(),
            formula,
        }
    }

    pub fn derived<F>(label: &str, derive: F) -> ValueRef
    where
        F: Fn(&ResolvedSheets) -> f64 + Send + Sync + 'static,
    {
        ValueRef::Derived {
            label: label.to_string(),
            derive: Arc::new(derive),
        }
    }

    pub fn with_label(mut self, new_label: &str) -> ValueRef {
        match &mut self {
            ValueRef::Row { label, .. }
            | ValueRef::Expr { label, .. }
            | ValueRef::Derived { label, .. } => {
                *label = new_label.to_string();
            }
        }
        self
    }

    pub fn label(&self) -> &str {
        match self {
            ValueRef::Row { label, .. }
            | ValueRef::Expr { label, .. }
            | ValueRef::Derived { label, .. } => label,
        }
    }

    /// Sheet this reference reads, if known.
    pub fn sheet(&self) -> Option<&str> {
        match self {
            ValueRef::Row { sheet, .. } | ValueRef::Expr { sheet, .. } => Some(sheet.as_str()),
            ValueRef::Derived { .. } => None,
        }
    }

    /// Dereference against resolved sheets. Sheets or rows that were not
    /// supplied read as 0; rows that failed to resolve return their error.
    fn read(&self, resolved: &ResolvedSheets) -> Result<f64, RowError> {
        match self {
            ValueRef::Row { sheet, row, .. } => read_row(resolved, sheet, row),
            ValueRef::Expr { sheet, formula, .. } => {
                formula.eval(|id| read_row(resolved, sheet, id))
            }
            ValueRef::Derived { derive, .. } => Ok(derive(resolved)),
        }
    }
}

fn read_row(resolved: &ResolvedSheets, sheet: &str, row: &RowId) -> Result<f64, RowError> {
    let Some(resolution) = resolved.get(sheet) else {
        return Ok(0.0);
    };
    if let Some(err) = resolution.error(row.as_str()) {
        return Err(err.clone());
    }
    Ok(resolution.value(row.as_str()).unwrap_or(0.0))
}

impl fmt::Debug for ValueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRef::Row { sheet, row, label } => f
                .debug_struct("Row")
                .field("sheet", sheet)
                .field("row", row)
                .field("label", label)
                .finish(),
            ValueRef::Expr { sheet, formula, label } => f
                .debug_struct("Expr")
                .field("sheet", sheet)
                .field("formula", &formula.to_string())
                .field("label", label)
                .finish(),
            ValueRef::Derived { label, .. } => f
                .debug_struct("Derived")
                .field("label", label)
                .finish_non_exhaustive(),
        }
    }
}

/// A named assertion that `actual` equals `expected` within `tolerance`.
#[derive(Clone, Debug)]
pub struct ValidationRule {
    pub id: String,
    pub description: String,
    pub expected: ValueRef,
    pub actual: ValueRef,
    pub tolerance: f64,
}

impl ValidationRule {
    pub fn new(
        id: &str,
        description: &str,
        expected: ValueRef,
        actual: ValueRef,
    ) -> ValidationRule {
        ValidationRule {
            id: id.to_string(),
            description: description.to_string(),
            expected,
            actual,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> ValidationRule {
        self.tolerance = tolerance;
        self
    }

    /// Check this rule against resolved sheets.
    pub fn check(&self, resolved: &ResolvedSheets) -> ValidationResult {
        let expected = self.expected.read(resolved);
        let actual = self.actual.read(resolved);

        let (expected, actual, error) = match (expected, actual) {
            (Ok(e), Ok(a)) => {
                let error = if (e - a).abs() <= self.tolerance {
                    String::new()
                } else {
                    format!(
                        "Mismatch: {} ({}) ≠ {} ({})",
                        self.actual.label(),
                        format_number(a),
                        self.expected.label(),
                        format_number(e)
                    )
                };
                (e, a, error)
            }
            (e, a) => {
                let mut problems = Vec::new();
                if let Err(err) = &a {
                    problems.push(format!("Unresolved: {}: {}", self.actual.label(), err));
                }
                if let Err(err) = &e {
                    problems.push(format!("Unresolved: {}: {}", self.expected.label(), err));
                }
                (e.unwrap_or(0.0), a.unwrap_or(0.0), problems.join("; "))
            }
        };

        ValidationResult {
            id: self.id.clone(),
            description: self.description.clone(),
            expected,
            actual,
            passed: error.is_empty(),
            error,
        }
    }
}

/// Outcome of one rule.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationResult {
    pub id: String,
    pub description: String,
    pub expected: f64,
    pub actual: f64,
    pub passed: bool,
    /// Empty when `passed`.
    pub error: String,
}

/// Check every rule; one rule failing never stops the others.
pub fn run_validations(
    rules: &[ValidationRule],
    resolved: &ResolvedSheets,
) -> Vec<ValidationResult> {
    rules
        .iter()
        .map(|rule| {
            let result = rule.check(resolved);
            if result.passed {
                debug!(rule = %rule.id, "Validation passed");
            } else {
                warn!(rule = %rule.id, error = %result.error, "Validation failed");
            }
            result
        })
        .collect()
}
