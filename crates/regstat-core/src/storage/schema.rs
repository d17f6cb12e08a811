//! Statement definitions in TOML.
//!
//! ```toml
//! name = "balance_sheet"
//!
//! [[rows]]
//! id = "C1"
//! label = "Cash and cash equivalents"
//! kind = "computed"
//! formula = "C2+C3+C6+C7"
//! category = "cash"
//! ```
//!
//! Loading rejects the whole sheet on the first problem, including formula
//! cycles.

use crate::error::Result;
use regstat_engine::engine::{ConfigError, RollupStat, Row, Sheet, find_any_cycle};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SheetFile {
    name: String,
    #[serde(default)]
    rows: Vec<RowEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum KindName {
    Input,
    Fetched,
    Computed,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RowEntry {
    id: String,
    #[serde(default)]
    label: String,
    kind: KindName,
    formula: Option<String>,
    rollup: Option<RollupStat>,
    group: Option<String>,
    category: Option<String>,
    parent: Option<String>,
    weight: Option<String>,
}

impl RowEntry {
    fn into_row(self) -> std::result::Result<Row, ConfigError> {
        let invalid = |message: &str| ConfigError::InvalidRowDefinition {
            row: self.id.clone(),
            message: message.to_string(),
        };

        let row = match self.kind {
            KindName::Input | KindName::Fetched => {
                if self.formula.is_some() || self.rollup.is_some() || self.group.is_some() {
                    return Err(invalid("only computed rows may have a formula, rollup or group"));
                }
                if matches!(self.kind, KindName::Input) {
                    Row::input(&self.id, &self.label)?
                } else {
                    Row::fetched(&self.id, &self.label)?
                }
            }
            KindName::Computed => match (&self.formula, self.rollup) {
                (Some(formula), None) => {
                    if self.group.is_some() {
                        return Err(invalid("group is only meaningful with a rollup"));
                    }
                    Row::computed(&self.id, &self.label, formula)?
                }
                (None, Some(stat)) => {
                    Row::rollup(&self.id, &self.label, stat, self.group.as_deref())?
                }
                (Some(_), Some(_)) => {
                    return Err(invalid(
                        "computed rows take a formula or a rollup, not both",
                    ));
                }
                (None, None) => return Err(invalid("computed rows need a formula or a rollup")),
            },
        };

        let row = match (&self.parent, &self.weight) {
            (Some(parent), weight) => row.with_parent(parent, weight.as_deref())?,
            (None, Some(_)) => return Err(invalid("weight is only meaningful on a child row")),
            (None, None) => row,
        };
        Ok(match &self.category {
            Some(category) => row.with_category(category),
            None => row,
        })
    }
}

/// Parse a sheet definition from TOML text.
pub fn parse_sheet(content: &str) -> Result<Sheet> {
    let file: SheetFile = toml::from_str(content)?;
    let rows = file
        .rows
        .into_iter()
        .map(RowEntry::into_row)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let sheet = Sheet::new(file.name, rows)?;
    if let Some(path) = find_any_cycle(&sheet) {
        return Err(ConfigError::CyclicFormula {
            sheet: sheet.name().to_string(),
            path,
        }
        .into());
    }

    debug!(sheet = sheet.name(), rows = sheet.len(), "Sheet definition loaded");
    Ok(sheet)
}

/// Load a sheet definition from a TOML file.
pub fn load_sheet(path: &Path) -> Result<Sheet> {
    let content = super::read_definition_file(path)?;
    parse_sheet(&content)
}
