//! Cross-statement rule sets in TOML.
//!
//! ```toml
//! [[rules]]
//! id = "balance_equation"
//! description = "Total assets equal total liabilities and equity"
//! tolerance = 0.01
//! actual = { sheet = "balance_sheet", row = "C33", label = "Total assets" }
//! expected = { sheet = "balance_sheet", row = "C61" }
//! ```
//!
//! Each side names a sheet and exactly one of `row` or `formula`. Sheets are
//! not checked here: a rule over a sheet that is never resolved reads 0.

use crate::error::{RegstatError, Result};
use regstat_engine::engine::{DEFAULT_TOLERANCE, Formula, RowId, ValidationRule, ValueRef};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesFile {
    #[serde(default)]
    rules: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleEntry {
    id: String,
    #[serde(default)]
    description: String,
    tolerance: Option<f64>,
    expected: RefEntry,
    actual: RefEntry,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RefEntry {
    sheet: String,
    row: Option<String>,
    formula: Option<String>,
    label: Option<String>,
}

impl RefEntry {
    fn into_value_ref(self, rule: &str) -> Result<ValueRef> {
        let invalid = |message: String| RegstatError::InvalidReference {
            rule: rule.to_string(),
            message,
        };
        let value_ref = match (&self.row, &self.formula) {
            (Some(row), None) => {
                let row = RowId::parse(row).map_err(|e| invalid(e.to_string()))?;
                ValueRef::row(&self.sheet, row)
            }
            (None, Some(formula)) => {
                let parsed = Formula::parse(formula)
                    .map_err(|e| invalid(format!("malformed formula '{formula}': {e}")))?;
                ValueRef::expr(&self.sheet, parsed)
            }
            _ => {
                return Err(invalid(format!(
                    "reference into '{}' needs exactly one of row or formula",
                    self.sheet
                )));
            }
        };
        Ok(match &self.label {
            Some(label) => value_ref.with_label(label),
            None => value_ref,
        })
    }
}

/// Parse a rule set from TOML text, preserving declaration order.
pub fn parse_rules(content: &str) -> Result<Vec<ValidationRule>> {
    let file: RulesFile = toml::from_str(content)?;
    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(file.rules.len());

    for entry in file.rules {
        if !seen.insert(entry.id.clone()) {
            return Err(RegstatError::DuplicateRule(entry.id));
        }
        let tolerance = entry.tolerance.unwrap_or(DEFAULT_TOLERANCE);
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(RegstatError::InvalidTolerance {
                rule: entry.id,
                tolerance,
            });
        }
        let expected = entry.expected.into_value_ref(&entry.id)?;
        let actual = entry.actual.into_value_ref(&entry.id)?;
        rules.push(
            ValidationRule::new(&entry.id, &entry.description, expected, actual)
                .with_tolerance(tolerance),
        );
    }

    debug!(rules = rules.len(), "Rule set loaded");
    Ok(rules)
}

/// Load a rule set from a TOML file.
pub fn load_rules(path: &Path) -> Result<Vec<ValidationRule>> {
    let content = super::read_definition_file(path)?;
    parse_rules(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rules() {
        let rules = parse_rules(
            r#"
[[rules]]
id = "balance_equation"
description = "Total assets equal total liabilities and equity"
actual = { sheet = "balance_sheet", row = "C33", label = "Total assets" }
expected = { sheet = "balance_sheet", row = "C61" }

[[rules]]
id = "loan_portfolio"
tolerance = 1.0
actual = { sheet = "interest_rates", row = "T40" }
expected = { sheet = "balance_sheet", formula = "C18+C19+C20+C21" }
"#,
        )
        .unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].id, "balance_equation");
        assert_eq!(rules[0].tolerance, DEFAULT_TOLERANCE);
        assert_eq!(rules[0].actual.label(), "Total assets");
        assert_eq!(rules[0].expected.label(), "balance_sheet!C61");
        assert_eq!(rules[1].tolerance, 1.0);
        assert_eq!(rules[1].expected.label(), "balance_sheet!C18+C19+C20+C21");
        assert_eq!(rules[1].expected.sheet(), Some("balance_sheet"));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let err = parse_rules(
            r#"
[[rules]]
id = "a"
actual = { sheet = "s", row = "C1" }
expected = { sheet = "s", row = "C2" }
[[rules]]
id = "a"
actual = { sheet = "s", row = "C1" }
expected = { sheet = "s", row = "C2" }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, RegstatError::DuplicateRule(ref id) if id == "a"));
    }

    /// A single rule with the given extra fields and sides.
    fn one_rule(extra: &str, actual: &str) -> String {
        format!(
            "[[rules]]\nid = \"a\"\n{extra}\nactual = {{ {actual} }}\n\
             expected = {{ sheet = \"s\", row = \"C2\" }}\n"
        )
    }

    #[test]
    fn test_rejects_bad_tolerance_and_references() {
        let negative = parse_rules(&one_rule("tolerance = -0.5", r#"sheet = "s", row = "C1""#));
        assert!(matches!(negative, Err(RegstatError::InvalidTolerance { .. })));

        let both = parse_rules(&one_rule("", r#"sheet = "s", row = "C1", formula = "C1""#));
        assert!(matches!(both, Err(RegstatError::InvalidReference { .. })));

        let bad_row = parse_rules(&one_rule("", r#"sheet = "s", row = "total""#));
        assert!(matches!(bad_row, Err(RegstatError::InvalidReference { .. })));

        let bad_formula = parse_rules(&one_rule("", r#"sheet = "s", formula = "C1+""#));
        assert!(matches!(bad_formula, Err(RegstatError::InvalidReference { .. })));
    }
}
