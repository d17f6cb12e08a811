//! Statement engine API.
//!
//! This module provides the computation core for regulatory statements:
//!
//! - [`RowId`], [`Row`], [`RowKind`], [`Sheet`] - Statement definitions
//! - [`Formula`], [`evaluate`] - The `+`/`-` formula mini-language
//! - [`resolve`] - Resolve every row of a sheet from raw values
//! - [`detect_cycle`] - Circular dependency detection
//! - [`aggregate`] - Amount-weighted rate rollups
//! - [`run_validations`] - Cross-statement validation rules
//! - [`format_number`] - Format values for display

mod aggregate;
mod cycle;
mod error;
mod format;
mod formula;
mod resolve;
mod row;
mod row_id;
mod sheet;
mod validate;

pub use aggregate::{RatePoint, RateSummary, aggregate};
pub use cycle::{detect_cycle, find_any_cycle};
pub use error::{ConfigError, FormulaError, RowError};
pub use format::format_number;
pub use formula::{Formula, Op, Term, evaluate};
pub use resolve::{RawValues, Resolution, resolve};
pub use row::{Derivation, RollupStat, Row, RowKind};
pub use row_id::RowId;
pub use sheet::Sheet;
pub use validate::{
    DEFAULT_TOLERANCE, DeriveFn, ResolvedSheets, ValidationResult, ValidationRule, ValueRef,
    run_validations,
};
