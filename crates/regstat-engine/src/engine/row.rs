//! Row definitions for statement sheets.
//!
//! - [`RowKind`] - Where a row's value comes from (input, fetched, computed)
//! - [`Derivation`] - How a computed row is derived (formula or rollup)
//! - [`Row`] - One line item of a statement
//!
//! Rows carry no values. Input and fetched values live in a caller-owned raw
//! store; computed values only exist in a [`Resolution`](super::Resolution).

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::formula::Formula;
use super::row_id::RowId;

/// Statistic produced when rolling up a hierarchy group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollupStat {
    /// Amount-weighted average of the children's rates.
    WeightedRate,
    /// Smallest positive child rate.
    NominalLow,
    /// Largest positive child rate.
    NominalHigh,
    /// Plain sum of the children's weight amounts.
    TotalAmount,
}

/// How a computed row gets its value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Derivation {
    Formula(Formula),
    /// Roll up the children of `group` (rows whose parent is `group`).
    Rollup { group: RowId, stat: RollupStat },
}

/// Source of a row's value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum RowKind {
    /// User-entered value.
    Input,
    /// Value obtained from an external system; read-only for computation.
    Fetched,
    /// Derived from other rows of the same sheet.
    Computed(Derivation),
}

impl RowKind {
    pub fn is_computed(&self) -> bool {
        matches!(self, RowKind::Computed(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            RowKind::Input => "input",
            RowKind::Fetched => "fetched",
            RowKind::Computed(_) => "computed",
        }
    }
}

/// A line item in a statement.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Row {
    pub id: RowId,
    pub label: String,
    pub kind: RowKind,
    pub category: Option<String>,
    /// Parent row for a sub-row in a rate hierarchy.
    pub parent: Option<RowId>,
    /// Row holding the amount that weights this row's rate in a rollup.
    pub weight: Option<RowId>,
}

impl Row {
    fn new(id: &str, label: &str, kind: RowKind) -> Result<Row, ConfigError> {
        Ok(Row {
            id: RowId::parse(id)?,
            label: label.to_string(),
            kind,
            category: None,
            parent: None,
            weight: None,
        })
    }

    pub fn input(id: &str, label: &str) -> Result<Row, ConfigError> {
        Row::new(id, label, RowKind::Input)
    }

    pub fn fetched(id: &str, label: &str) -> Result<Row, ConfigError> {
        Row::new(id, label, RowKind::Fetched)
    }

    /// Create a computed row, parsing its formula.
    pub fn computed(id: &str, label: &str, formula: &str) -> Result<Row, ConfigError> {
        let row_id = RowId::parse(id)?;
        let parsed = Formula::parse(formula).map_err(|reason| ConfigError::MalformedFormula {
            row: row_id.clone(),
            formula: formula.to_string(),
            reason,
        })?;
        Row::new(id, label, RowKind::Computed(Derivation::Formula(parsed)))
    }

    /// Create a computed row that rolls up the children of `group`.
    /// When `group` is `None` the row rolls up its own children.
    pub fn rollup(
        id: &str,
        label: &str,
        stat: RollupStat,
        group: Option<&str>,
    ) -> Result<Row, ConfigError> {
        let row_id = RowId::parse(id)?;
        let group = match group {
            Some(g) => RowId::parse(g)?,
            None => row_id,
        };
        Row::new(id, label, RowKind::Computed(Derivation::Rollup { group, stat }))
    }

    pub fn with_category(mut self, category: &str) -> Row {
        self.category = Some(category.to_string());
        self
    }

    /// Attach this row to a rate hierarchy under `parent`, weighted by the
    /// amount held in row `weight`.
    pub fn with_parent(mut self, parent: &str, weight: Option<&str>) -> Result<Row, ConfigError> {
        self.parent = Some(RowId::parse(parent)?);
        self.weight = weight.map(RowId::parse).transpose()?;
        Ok(self)
    }

    pub fn formula(&self) -> Option<&Formula> {
        match &self.kind {
            RowKind::Computed(Derivation::Formula(f)) => Some(f),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_computed_parses_formula() {
        let row = Row::computed("C17", "Net loans", "C18+C19-C22").unwrap();
        assert!(row.kind.is_computed());
        assert_eq!(row.formula().unwrap().to_string(), "C18+C19-C22");
    }

    #[test]
    fn test_computed_rejects_malformed_formula() {
        let err = Row::computed("C1", "Cash", "C2+").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MalformedFormula { ref formula, .. } if formula == "C2+"
        ));
    }

    #[test]
    fn test_rollup_defaults_group_to_self() {
        let row = Row::rollup("T1", "Consumer", RollupStat::WeightedRate, None).unwrap();
        match row.kind {
            RowKind::Computed(Derivation::Rollup { group, stat }) => {
                assert_eq!(group.as_str(), "T1");
                assert_eq!(stat, RollupStat::WeightedRate);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_invalid_id_rejected() {
        assert!(matches!(
            Row::input("C-1", "bad"),
            Err(ConfigError::InvalidRowId { .. })
        ));
    }
}
