//! Built-in statement templates and the standard rule set.

use regstat_core::storage::{parse_rules, parse_sheet};
use regstat_core::{Report, ReportMeta, Result};
use regstat_engine::engine::{Sheet, ValidationRule};
use tracing::debug;

pub const BALANCE_SHEET: &str = include_str!("../templates/balance_sheet.toml");
pub const INCOME_STATEMENT: &str = include_str!("../templates/income_statement.toml");
pub const INTEREST_RATES: &str = include_str!("../templates/interest_rates.toml");
pub const LIQUID_ASSETS: &str = include_str!("../templates/liquid_assets.toml");
pub const STANDARD_RULES: &str = include_str!("../templates/rules.toml");

/// Parse the four built-in statements.
pub fn standard_sheets() -> Result<Vec<Sheet>> {
    [BALANCE_SHEET, INCOME_STATEMENT, INTEREST_RATES, LIQUID_ASSETS]
        .into_iter()
        .map(parse_sheet)
        .collect()
}

pub fn standard_rules() -> Result<Vec<ValidationRule>> {
    parse_rules(STANDARD_RULES)
}

/// A report holding every built-in statement and the standard rules, with all
/// raw stores empty.
pub fn standard_report(meta: ReportMeta) -> Result<Report> {
    let mut report = Report::new(meta);
    for sheet in standard_sheets()? {
        report.add_sheet(sheet)?;
    }
    report.set_rules(standard_rules()?);
    debug!(
        institution = %report.meta.institution,
        sheets = report.sheet_names().count(),
        rules = report.rules().len(),
        "Standard report created"
    );
    Ok(report)
}
