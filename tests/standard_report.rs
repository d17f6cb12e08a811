//! End-to-end checks of the built-in statements and rule set.

use chrono::NaiveDate;
use proptest::prelude::*;
use regstat::engine::{Sheet, ValidationRule, ValueRef, resolve};
use regstat::storage::parse_values;
use regstat::{RegstatError, Report, ReportMeta, standard_report, standard_sheets};
use std::collections::HashMap;

const BALANCE_SHEET_VALUES: &str = "
# Assets
C2: 1_500_000
C3: 30_000_000
C6: 3_000_000
C7: 800_000
C9: 2_000_000
C10: 500_000
C18: 100_000_000
C19: 20_000_000
C20: 5_000_000
C21: 2_000_000
C22: 10_000_000
C23: 1_200_000
C25: 6_000_000
C26: 1_000_000
C27: 1_000_000

# Liabilities
C35: 40_000_000
C36: 50_000_000
C37: 20_000_000
C41: 20_000_000
C42: 2_000_000
C44: 500_000
C45: 1_500_000

# Equity
C50: 20_000_000
C51: 3_000_000
C52: 1_000_000
C53: 4_000_000
";

const INCOME_STATEMENT_VALUES: &str = "
R2: 30_000_000
R3: 1_000_000
R4: 500_000
R6: 8_000_000
R7: 1_500_000
R9: 2_000_000
R10: 500_000
R12: 10_000_000
R13: 5_000_000
R14: 1_000_000
R15: 3_000_000
R18: 1_500_000
";

const INTEREST_RATE_VALUES: &str = "
T10: 12
T11: 5_000_000
T12: 400
T13: 18
T14: 15_000_000
T15: 1200
T30: 20
T31: 80_000_000
T32: 150
T33: 22
T34: 27_000_000
T35: 50
";

const LIQUID_ASSET_VALUES: &str = "
L2: 1_500_000
L3: 30_000_000
L4: 4_000_000
L5: 500_000
L7: 40_000_000
L8: 2_000_000
";

fn meta() -> ReportMeta {
    ReportMeta::new("Example Microfinance", NaiveDate::from_ymd_opt(2026, 3, 31).unwrap())
}

fn filled_report() -> Report {
    let report = standard_report(meta()).unwrap();
    for (sheet, values) in [
        ("balance_sheet", BALANCE_SHEET_VALUES),
        ("income_statement", INCOME_STATEMENT_VALUES),
        ("interest_rates", INTEREST_RATE_VALUES),
        ("liquid_assets", LIQUID_ASSET_VALUES),
    ] {
        report
            .load_values(sheet, parse_values(values).unwrap())
            .unwrap();
    }
    report
}

fn balance_sheet() -> Sheet {
    standard_sheets()
        .unwrap()
        .into_iter()
        .find(|s| s.name() == "balance_sheet")
        .unwrap()
}

#[test]
fn test_cash_rollup() {
    let raw: HashMap<&str, f64> = [
        ("C2", 1_500_000.0),
        ("C3", 30_000_000.0),
        ("C6", 3_000_000.0),
        ("C7", 800_000.0),
    ]
    .into_iter()
    .collect();
    let resolution = resolve(&balance_sheet(), &raw);
    assert_eq!(resolution.value("C1"), Some(35_300_000.0));
}

#[test]
fn test_net_loans() {
    let raw: HashMap<&str, f64> = [
        ("C18", 100.0),
        ("C19", 20.0),
        ("C20", 5.0),
        ("C21", 2.0),
        ("C22", 10.0),
    ]
    .into_iter()
    .collect();
    let resolution = resolve(&balance_sheet(), &raw);
    assert_eq!(resolution.value("C17"), Some(117.0));
    assert!(resolution.is_clean());
}

#[test]
fn test_consistent_report_validates_clean() {
    let report = filled_report();
    let outcome = report.validate();
    for result in &outcome.results {
        assert!(result.passed, "{}: {}", result.id, result.error);
    }
    assert_eq!((outcome.passed, outcome.failed), (6, 0));

    let resolved = report.resolve_all();
    assert_eq!(resolved["balance_sheet"].value("C33"), Some(162_000_000.0));
    assert_eq!(resolved["balance_sheet"].value("C61"), Some(162_000_000.0));
    assert_eq!(resolved["income_statement"].value("R19"), Some(4_000_000.0));
    assert_eq!(resolved["interest_rates"].value("T40"), Some(127_000_000.0));
    assert_eq!(resolved["interest_rates"].value("T41"), Some(1_800.0));
    assert_eq!(resolved["liquid_assets"].value("L9"), Some(-6_000_000.0));
}

#[test]
fn test_rate_rollup() {
    let resolution = filled_report().resolve("interest_rates").unwrap();
    assert_eq!(resolution.value("T1"), Some(16.5));
    assert_eq!(resolution.value("T2"), Some(12.0));
    assert_eq!(resolution.value("T3"), Some(18.0));
    assert_eq!(resolution.value("T4"), Some(20_000_000.0));
    assert_eq!(resolution.value("T5"), Some(1_600.0));
    assert_eq!(resolution.value("T21"), Some(20.0));
    assert_eq!(resolution.value("T22"), Some(22.0));
}

#[test]
fn test_balance_invariant_breaks_on_single_leaf() {
    let report = filled_report();
    report
        .set_input("balance_sheet", "C45", 1_500_001.0)
        .unwrap();

    let outcome = report.validate();
    assert_eq!(outcome.failed, 1);
    let balance = outcome.result("balance_equation").unwrap();
    assert!(!balance.passed);
    assert_eq!(balance.expected, 162_000_001.0);
    assert_eq!(balance.actual, 162_000_000.0);
    assert_eq!(
        balance.error,
        "Mismatch: Total assets (162,000,000) ≠ Total liabilities and equity (162,000,001)"
    );
}

#[test]
fn test_fetched_refresh_flows_into_rules() {
    let report = filled_report();
    report
        .apply_fetched("balance_sheet", [("C18", 100_000_500.0)])
        .unwrap();

    let outcome = report.validate();
    let failed: Vec<&str> = outcome.failures().map(|r| r.id.as_str()).collect();
    // Gross loans moved but loans by rate did not; total assets moved with them.
    assert_eq!(failed, ["balance_equation", "loan_portfolio"]);
    assert_eq!(
        outcome.result("loan_portfolio").unwrap().error,
        "Mismatch: Loans by rate (127,000,000) ≠ Gross loans (127,000,500)"
    );
}

#[test]
fn test_fetched_rows_reject_manual_edits() {
    let report = filled_report();
    assert!(matches!(
        report.set_input("liquid_assets", "L3", 1.0),
        Err(RegstatError::ReadOnlyRow { .. })
    ));
    assert!(matches!(
        report.set_input("balance_sheet", "C33", 1.0),
        Err(RegstatError::ComputedRow { .. })
    ));
}

#[test]
fn test_derived_rule_over_report() {
    let mut report = filled_report();
    let mut rules = report.rules().to_vec();
    rules.push(
        ValidationRule::new(
            "liquidity_ratio",
            "Liquid assets cover at least 80% of short-term liabilities",
            ValueRef::derived("required", |sheets| {
                let l6 = sheets["liquid_assets"].value("L6").unwrap_or(0.0);
                let l1 = sheets["liquid_assets"].value("L1").unwrap_or(0.0);
                l1.max(0.8 * l6)
            }),
            ValueRef::derived("liquid", |sheets| {
                sheets["liquid_assets"].value("L1").unwrap_or(0.0)
            }),
        ),
    );
    report.set_rules(rules);
    let outcome = report.validate();
    assert!(outcome.result("liquidity_ratio").unwrap().passed);
    assert_eq!(outcome.results.len(), 7);
}

#[test]
fn test_resolved_rows_carry_no_errors() {
    let resolved = filled_report().resolve_all();
    assert_eq!(resolved.len(), 4);
    for (name, resolution) in &resolved {
        assert!(resolution.is_clean(), "{name}: {:?}", resolution.errors);
    }
}

proptest! {
    #[test]
    fn prop_matching_entries_keep_balance(delta in 0u32..10_000_000) {
        let report = filled_report();
        let delta = f64::from(delta);
        report
            .set_input("balance_sheet", "C27", 1_000_000.0 + delta)
            .unwrap();
        report
            .set_input("balance_sheet", "C45", 1_500_000.0 + delta)
            .unwrap();
        let outcome = report.validate();
        prop_assert!(outcome.all_passed());
    }
}
