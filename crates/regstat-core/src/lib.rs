//! regstat_core - Report sessions, statement definitions and value files.
//!
//! The engine crate knows how to resolve a single sheet and check rules; this
//! crate holds the state a reporting session needs around that: which sheets
//! make up a report, their raw values, and the rule set tying them together.

pub mod error;
pub mod report;
pub mod storage;

pub use error::{RegstatError, Result};
pub use report::{RawStore, Report, ReportMeta, ValidationReport};
