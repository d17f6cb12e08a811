//! Parser for raw value files.
//!
//! One `ROW: NUMBER` pair per line; blank lines and `#` comments are skipped.
//! Underscores may group digits (`30_000_000`).

use crate::error::{RegstatError, Result};
use regstat_engine::engine::RowId;
use std::collections::HashMap;
use std::path::Path;

/// Parse a values file.
pub fn load_values(path: &Path) -> Result<HashMap<RowId, f64>> {
    let content = super::read_definition_file(path)?;
    parse_values(&content)
}

/// Parse values from a string. Later lines overwrite earlier ones.
pub fn parse_values(content: &str) -> Result<HashMap<RowId, f64>> {
    let mut values = HashMap::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((id_str, value_str)) = line.split_once(':') else {
            return Err(RegstatError::Parse {
                line: line_num + 1,
                message: "Expected 'ROW: VALUE' format".to_string(),
            });
        };

        let id = RowId::parse(id_str).map_err(|_| RegstatError::Parse {
            line: line_num + 1,
            message: format!("Invalid row id: {}", id_str.trim()),
        })?;

        let value = parse_number(value_str.trim()).ok_or_else(|| RegstatError::Parse {
            line: line_num + 1,
            message: format!("Invalid number: {}", value_str.trim()),
        })?;

        values.insert(id, value);
    }

    Ok(values)
}

fn parse_number(text: &str) -> Option<f64> {
    if text.is_empty() || text.starts_with('_') || text.ends_with('_') {
        return None;
    }
    let n = text.replace('_', "").parse::<f64>().ok()?;
    n.is_finite().then_some(n)
}
