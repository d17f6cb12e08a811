//! Report session state and logic (UI-agnostic).

mod eval;
mod ops;
mod state;

pub use state::{RawStore, Report, ReportMeta, ValidationReport};
