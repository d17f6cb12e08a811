use super::Report;
use crate::error::{RegstatError, Result};
use regstat_engine::engine::{Row, RowId, RowKind, Sheet};
use tracing::debug;

/// Which raw rows an operation may write.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Writable {
    InputOnly,
    FetchedOnly,
    Raw,
}

impl Writable {
    fn check(self, sheet: &Sheet, row: &Row) -> Result<()> {
        let allowed = match (&row.kind, self) {
            (RowKind::Computed(_), _) => {
                return Err(RegstatError::ComputedRow {
                    sheet: sheet.name().to_string(),
                    row: row.id.to_string(),
                });
            }
            (RowKind::Input, Writable::InputOnly | Writable::Raw) => true,
            (RowKind::Fetched, Writable::FetchedOnly | Writable::Raw) => true,
            _ => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(RegstatError::ReadOnlyRow {
                sheet: sheet.name().to_string(),
                row: row.id.to_string(),
                kind: row.kind.name(),
            })
        }
    }
}

impl Report {
    fn writable_row(&self, sheet_idx: usize, row: &str, mode: Writable) -> Result<RowId> {
        let sheet = &self.sheets[sheet_idx];
        let Some(def) = sheet.get(row.trim().to_ascii_uppercase().as_str()) else {
            return Err(RegstatError::UnknownRow {
                sheet: sheet.name().to_string(),
                row: row.to_string(),
            });
        };
        mode.check(sheet, def)?;
        Ok(def.id.clone())
    }

    /// Current raw value of an input or fetched row, if one was supplied.
    pub fn raw_value(&self, sheet: &str, row: &str) -> Result<Option<f64>> {
        let idx = self.sheet_index(sheet)?;
        let id = self.writable_row(idx, row, Writable::Raw)?;
        Ok(self.stores[idx].get(&id).map(|v| *v))
    }

    /// Set the value of an input row. Returns the previous value.
    ///
    /// Fetched rows are read-only here; use [`Report::apply_fetched`].
    pub fn set_input(&self, sheet: &str, row: &str, value: f64) -> Result<Option<f64>> {
        let idx = self.sheet_index(sheet)?;
        let id = self.writable_row(idx, row, Writable::InputOnly)?;
        debug!(sheet, row = %id, value, "Input set");
        Ok(self.stores[idx].insert(id, value))
    }

    /// Remove the value of an input row so it reads as 0 again.
    pub fn clear_input(&self, sheet: &str, row: &str) -> Result<Option<f64>> {
        let idx = self.sheet_index(sheet)?;
        let id = self.writable_row(idx, row, Writable::InputOnly)?;
        Ok(self.stores[idx].remove(&id).map(|(_, v)| v))
    }

    /// Store a refresh of externally fetched figures.
    ///
    /// Every id must name a fetched row; nothing is written unless all do.
    /// Returns the number of values written.
    pub fn apply_fetched<I, K>(&self, sheet: &str, values: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        self.write_batch(sheet, values, Writable::FetchedOnly)
    }

    /// Seed input and fetched rows in bulk, e.g. from a values file.
    ///
    /// Computed rows are rejected so a derived figure never lands in the raw
    /// store. Nothing is written unless every id is acceptable.
    pub fn load_values<I, K>(&self, sheet: &str, values: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        self.write_batch(sheet, values, Writable::Raw)
    }

    fn write_batch<I, K>(&self, sheet: &str, values: I, mode: Writable) -> Result<usize>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let idx = self.sheet_index(sheet)?;
        let checked = values
            .into_iter()
            .map(|(k, v)| Ok((self.writable_row(idx, k.as_ref(), mode)?, v)))
            .collect::<Result<Vec<_>>>()?;

        let store = &self.stores[idx];
        for (id, value) in &checked {
            store.insert(id.clone(), *value);
        }
        debug!(sheet, rows = checked.len(), "Raw values written");
        Ok(checked.len())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::RegstatError;
    use crate::report::{Report, ReportMeta};
    use chrono::NaiveDate;
    use regstat_engine::engine::{Row, Sheet};

    fn report() -> Report {
        let mut report = Report::new(ReportMeta::new(
            "Test MFI",
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        ));
        let sheet = Sheet::new(
            "bs",
            vec![
                Row::computed("C1", "Cash", "C2+C3").unwrap(),
                Row::input("C2", "Cash on hand").unwrap(),
                Row::fetched("C3", "Central bank").unwrap(),
            ],
        )
        .unwrap();
        report.add_sheet(sheet).unwrap();
        report
    }

    #[test]
    fn test_set_and_clear_input() {
        let report = report();
        assert_eq!(report.set_input("bs", "C2", 10.0).unwrap(), None);
        assert_eq!(report.set_input("bs", "c2", 12.0).unwrap(), Some(10.0));
        assert_eq!(report.raw_value("bs", "C2").unwrap(), Some(12.0));
        assert_eq!(report.clear_input("bs", "C2").unwrap(), Some(12.0));
        assert_eq!(report.raw_value("bs", "C2").unwrap(), None);
    }

    #[test]
    fn test_edit_rules_by_kind() {
        let report = report();
        assert!(matches!(
            report.set_input("bs", "C3", 1.0),
            Err(RegstatError::ReadOnlyRow { kind: "fetched", .. })
        ));
        assert!(matches!(
            report.set_input("bs", "C1", 1.0),
            Err(RegstatError::ComputedRow { .. })
        ));
        assert!(matches!(
            report.set_input("bs", "C9", 1.0),
            Err(RegstatError::UnknownRow { .. })
        ));
        assert!(matches!(
            report.set_input("is", "C2", 1.0),
            Err(RegstatError::UnknownSheet(_))
        ));
    }

    #[test]
    fn test_apply_fetched_is_all_or_nothing() {
        let report = report();
        assert_eq!(report.apply_fetched("bs", [("C3", 5.0)]).unwrap(), 1);
        assert_eq!(report.raw_value("bs", "C3").unwrap(), Some(5.0));

        let err = report
            .apply_fetched("bs", [("C3", 6.0), ("C2", 1.0)])
            .unwrap_err();
        assert!(matches!(err, RegstatError::ReadOnlyRow { kind: "input", .. }));
        assert_eq!(report.raw_value("bs", "C3").unwrap(), Some(5.0));
    }

    #[test]
    fn test_load_values_rejects_computed_rows() {
        let report = report();
        let written = report
            .load_values("bs", [("C2", 1.0), ("C3", 2.0)])
            .unwrap();
        assert_eq!(written, 2);
        assert!(matches!(
            report.load_values("bs", [("C1", 3.0)]),
            Err(RegstatError::ComputedRow { .. })
        ));
    }

    #[test]
    fn test_concurrent_editors_share_store() {
        let report = report();
        std::thread::scope(|s| {
            s.spawn(|| report.set_input("bs", "C2", 7.0).unwrap());
            s.spawn(|| {
                report.apply_fetched("bs", [("C3", 8.0)]).unwrap();
            });
        });
        assert_eq!(report.raw_value("bs", "C2").unwrap(), Some(7.0));
        assert_eq!(report.raw_value("bs", "C3").unwrap(), Some(8.0));
    }
}
