use crate::error::{RegstatError, Result};
use chrono::NaiveDate;
use dashmap::DashMap;
use regstat_engine::engine::{RowId, Sheet, ValidationResult, ValidationRule};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Caller-owned store of raw input and fetched values for one sheet.
/// DashMap is internally sharded, so several editors can write at once.
pub type RawStore = Arc<DashMap<RowId, f64>>;

/// Institution and period a report is for. Carried along, never computed on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportMeta {
    pub institution: String,
    pub period_end: NaiveDate,
}

impl ReportMeta {
    pub fn new(institution: &str, period_end: NaiveDate) -> Self {
        ReportMeta {
            institution: institution.to_string(),
            period_end,
        }
    }
}

/// Outcome of validating a whole report.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationReport {
    pub meta: ReportMeta,
    pub results: Vec<ValidationResult>,
    pub passed: usize,
    pub failed: usize,
}

impl ValidationReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    pub fn result(&self, rule_id: &str) -> Option<&ValidationResult> {
        self.results.iter().find(|r| r.id == rule_id)
    }
}

/// A reporting session: statement definitions, their current raw values and
/// the cross-statement rules that tie them together.
///
/// Sheets are immutable once added. Computed values are never stored; every
/// resolve starts from the raw stores.
pub struct Report {
    pub meta: ReportMeta,
    pub(crate) sheets: Vec<Arc<Sheet>>,
    pub(crate) stores: Vec<RawStore>,
    pub(crate) index: HashMap<String, usize>,
    pub(crate) rules: Vec<ValidationRule>,
}

impl Report {
    /// Create an empty report.
    pub fn new(meta: ReportMeta) -> Self {
        Report {
            meta,
            sheets: Vec::new(),
            stores: Vec::new(),
            index: HashMap::new(),
            rules: Vec::new(),
        }
    }

    /// Add a statement with an empty raw store.
    pub fn add_sheet(&mut self, sheet: Sheet) -> Result<()> {
        let name = sheet.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegstatError::DuplicateSheet(name));
        }
        self.index.insert(name, self.sheets.len());
        self.sheets.push(Arc::new(sheet));
        self.stores.push(RawStore::default());
        Ok(())
    }

    /// Replace the rule set. Rules over sheets this report does not hold are
    /// kept; they read 0 for the missing side.
    pub fn set_rules(&mut self, rules: Vec<ValidationRule>) {
        for rule in &rules {
            for side in [&rule.expected, &rule.actual] {
                if let Some(sheet) = side.sheet()
                    && !self.index.contains_key(sheet)
                {
                    warn!(
                        rule = %rule.id,
                        sheet,
                        "Rule references a sheet missing from the report"
                    );
                }
            }
        }
        self.rules = rules;
    }

    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    pub fn sheet(&self, name: &str) -> Option<&Arc<Sheet>> {
        self.index.get(name).map(|&i| &self.sheets[i])
    }

    /// Sheet names in the order they were added.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name())
    }

    /// Shared handle to a sheet's raw store, e.g. for a background fetcher.
    pub fn raw_store(&self, name: &str) -> Result<RawStore> {
        let idx = self.sheet_index(name)?;
        Ok(self.stores[idx].clone())
    }

    pub(crate) fn sheet_index(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| RegstatError::UnknownSheet(name.to_string()))
    }
}
