//! regstat - Regulatory statements with computed rows and cross-statement checks.
//!
//! The built-in templates describe the four statements a lending institution
//! files each period (balance sheet, income statement, interest-rate structure
//! and liquid assets) and the rules that tie them together. Everything else is
//! re-exported from the engine and core crates.

pub mod templates;

pub use regstat_core::{
    RawStore, RegstatError, Report, ReportMeta, Result, ValidationReport, storage,
};
pub use regstat_engine::engine;

pub use templates::{standard_report, standard_rules, standard_sheets};
