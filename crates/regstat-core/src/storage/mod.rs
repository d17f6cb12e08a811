//! Loading statement definitions, rule sets and raw value files.

mod rules;
mod schema;
mod values;

pub use rules::{load_rules, parse_rules};
pub use schema::{load_sheet, parse_sheet};
pub use values::{load_values, parse_values};

use crate::error::{RegstatError, Result};
use std::path::Path;

const MAX_DEFINITION_FILE_BYTES: u64 = 1_048_576; // 1 MiB

/// Read a definition file, refusing anything over the size cap.
fn read_definition_file(path: &Path) -> Result<String> {
    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_DEFINITION_FILE_BYTES {
        return Err(RegstatError::FileTooLarge {
            path: path.display().to_string(),
            size: meta.len(),
            max: MAX_DEFINITION_FILE_BYTES,
        });
    }
    Ok(std::fs::read_to_string(path)?)
}
