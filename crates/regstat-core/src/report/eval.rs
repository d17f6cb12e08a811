use super::{Report, ValidationReport};
use crate::error::Result;
use regstat_engine::engine::{Resolution, ResolvedSheets, resolve, run_validations};
use tracing::info;

impl Report {
    /// Resolve one sheet from its current raw values.
    pub fn resolve(&self, sheet: &str) -> Result<Resolution> {
        let idx = self.sheet_index(sheet)?;
        Ok(resolve(&self.sheets[idx], &*self.stores[idx]))
    }

    /// Resolve every sheet. Each pass is independent of the others.
    pub fn resolve_all(&self) -> ResolvedSheets {
        self.sheets
            .iter()
            .zip(&self.stores)
            .map(|(sheet, store)| (sheet.name().to_string(), resolve(sheet, &**store)))
            .collect()
    }

    /// Resolve every sheet and check the rule set against the result.
    pub fn validate(&self) -> ValidationReport {
        let resolved = self.resolve_all();
        self.validate_resolved(&resolved)
    }

    /// Check the rule set against sheets resolved by the caller.
    pub fn validate_resolved(&self, resolved: &ResolvedSheets) -> ValidationReport {
        let results = run_validations(&self.rules, resolved);
        let passed = results.iter().filter(|r| r.passed).count();
        let failed = results.len() - passed;
        info!(
            institution = %self.meta.institution,
            period_end = %self.meta.period_end,
            passed,
            failed,
            "Report validated"
        );
        ValidationReport {
            meta: self.meta.clone(),
            results,
            passed,
            failed,
        }
    }
}
