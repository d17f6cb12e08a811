//! regstat_engine - Statement rows, formulas, resolution and validation.

pub mod engine;
