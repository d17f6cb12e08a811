//! Sheet resolution.
//!
//! [`resolve`] turns a sheet plus the current raw values of its input and
//! fetched rows into the value of every row. Computed rows are evaluated on
//! demand and memoized for the rest of the pass, so a shared subtotal is
//! computed once however many rows reference it. A pass keeps an in-progress
//! mark per row; reaching a row that is still in progress is a cycle, and the
//! cycle error is recorded for every row on the cycle and every row depending
//! on it. Nothing survives between passes.

use dashmap::DashMap;
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use tracing::{debug, warn};

use super::aggregate::{RatePoint, aggregate};
use super::error::RowError;
use super::row::{Derivation, RollupStat, RowKind};
use super::row_id::RowId;
use super::sheet::Sheet;

/// Read access to raw input/fetched values keyed by row id.
///
/// Lookups use the canonical, upper-case id (`C2`, never `c2`), and the map
/// impls below match keys exactly. Build stores keyed by [`RowId`], or parse
/// keys through it, when ids come from user input.
pub trait RawValues {
    fn raw_value(&self, id: &str) -> Option<f64>;
}

impl<K, S> RawValues for HashMap<K, f64, S>
where
    K: Borrow<str> + Hash + Eq,
    S: BuildHasher,
{
    fn raw_value(&self, id: &str) -> Option<f64> {
        self.get(id).copied()
    }
}

impl<K> RawValues for BTreeMap<K, f64>
where
    K: Borrow<str> + Ord,
{
    fn raw_value(&self, id: &str) -> Option<f64> {
        self.get(id).copied()
    }
}

impl<K, S> RawValues for DashMap<K, f64, S>
where
    K: Borrow<str> + Hash + Eq,
    S: BuildHasher + Clone,
{
    fn raw_value(&self, id: &str) -> Option<f64> {
        self.get(id).map(|v| *v)
    }
}

/// Output of one resolution pass.
///
/// Rows that failed are absent from `values` and present in `errors`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    pub values: HashMap<RowId, f64>,
    pub errors: HashMap<RowId, RowError>,
}

impl Resolution {
    /// Wrap plain values, e.g. figures resolved elsewhere.
    pub fn from_values<I, K>(values: I) -> Resolution
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<RowId>,
    {
        Resolution {
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            errors: HashMap::new(),
        }
    }

    pub fn value(&self, id: &str) -> Option<f64> {
        self.values.get(id).copied()
    }

    pub fn error(&self, id: &str) -> Option<&RowError> {
        self.errors.get(id)
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Resolve every row of `sheet`.
///
/// Input and fetched rows take their value from `raw`, defaulting to 0. Raw
/// entries for computed rows are never read.
pub fn resolve<R>(sheet: &Sheet, raw: &R) -> Resolution
where
    R: RawValues + ?Sized,
{
    let mut pass = Pass {
        sheet,
        raw,
        memo: vec![None; sheet.len()],
        in_progress: vec![false; sheet.len()],
    };
    for idx in 0..sheet.len() {
        pass.resolve_from(idx);
    }

    let mut out = Resolution::default();
    for (row, slot) in sheet.rows().iter().zip(pass.memo) {
        match slot {
            Some(Ok(v)) => {
                out.values.insert(row.id.clone(), v);
            }
            Some(Err(e)) => {
                out.errors.insert(row.id.clone(), e);
            }
            None => {}
        }
    }

    if !out.errors.is_empty() {
        warn!(
            sheet = sheet.name(),
            errors = out.errors.len(),
            "Sheet resolved with row errors"
        );
    }
    debug!(
        sheet = sheet.name(),
        rows = sheet.len(),
        errors = out.errors.len(),
        "Sheet resolved"
    );
    out
}

/// A row waiting on its dependencies.
struct Frame {
    idx: usize,
    deps: Vec<usize>,
    next: usize,
}

struct Pass<'a, R: ?Sized> {
    sheet: &'a Sheet,
    raw: &'a R,
    memo: Vec<Option<Result<f64, RowError>>>,
    in_progress: Vec<bool>,
}

impl<R: RawValues + ?Sized> Pass<'_, R> {
    /// Resolve `root` and everything it reads.
    ///
    /// Depth first over an explicit frame stack, so a long chain of
    /// subtotals costs heap, not call stack. A row is evaluated once all of
    /// its dependencies are memoized or found to be in progress (a cycle).
    fn resolve_from(&mut self, root: usize) {
        if self.memo[root].is_some() {
            return;
        }
        let mut frames = vec![self.enter(root)];

        while let Some(frame) = frames.last_mut() {
            if let Some(&dep) = frame.deps.get(frame.next) {
                frame.next += 1;
                if self.memo[dep].is_none() && !self.in_progress[dep] {
                    frames.push(self.enter(dep));
                }
                continue;
            }

            let idx = frame.idx;
            let result = self.evaluate(idx, &frames);
            frames.pop();
            self.in_progress[idx] = false;
            self.memo[idx] = Some(result);
        }
    }

    fn enter(&mut self, idx: usize) -> Frame {
        self.in_progress[idx] = true;
        Frame {
            idx,
            deps: self.sheet.dependencies(idx),
            next: 0,
        }
    }

    fn evaluate(&self, idx: usize, frames: &[Frame]) -> Result<f64, RowError> {
        let row = &self.sheet.rows()[idx];
        match &row.kind {
            RowKind::Input | RowKind::Fetched => {
                Ok(self.raw.raw_value(row.id.as_str()).unwrap_or(0.0))
            }
            RowKind::Computed(Derivation::Formula(formula)) => {
                formula.eval(|id| self.read(&row.id, id, frames))
            }
            RowKind::Computed(Derivation::Rollup { group, stat }) => {
                self.rollup(&row.id, group, *stat, frames)
            }
        }
    }

    /// Value of a dependency of `owner`. Every dependency is memoized by now
    /// unless it is still on the frame stack.
    fn read(&self, owner: &RowId, id: &RowId, frames: &[Frame]) -> Result<f64, RowError> {
        let Some(idx) = self.sheet.index_of(id.as_str()) else {
            return Err(RowError::Reference {
                row: owner.clone(),
                token: id.to_string(),
            });
        };
        match &self.memo[idx] {
            Some(done) => done.clone(),
            None => Err(self.cycle_error(idx, frames)),
        }
    }

    fn rollup(
        &self,
        owner: &RowId,
        group: &RowId,
        stat: RollupStat,
        frames: &[Frame],
    ) -> Result<f64, RowError> {
        let sheet = self.sheet;
        let Some(group_idx) = sheet.index_of(group.as_str()) else {
            return Err(RowError::Reference {
                row: owner.clone(),
                token: group.to_string(),
            });
        };

        let mut points = Vec::new();
        for &child in sheet.child_indices(group_idx) {
            let child_row = &sheet.rows()[child];
            let rate = self.read(owner, &child_row.id, frames)?;
            let amount = match &child_row.weight {
                Some(w) => self.read(owner, w, frames)?,
                None => 0.0,
            };
            points.push(RatePoint::new(rate, amount));
        }

        let summary = aggregate(&points);
        Ok(match stat {
            RollupStat::WeightedRate => summary.weighted_avg_rate,
            RollupStat::NominalLow => summary.nominal_low,
            RollupStat::NominalHigh => summary.nominal_high,
            RollupStat::TotalAmount => summary.total_amount,
        })
    }

    /// Build the error for a row that is read while still in progress: the
    /// path from its frame back to itself.
    fn cycle_error(&self, idx: usize, frames: &[Frame]) -> RowError {
        let from = frames.iter().position(|f| f.idx == idx).unwrap_or(0);
        let mut path: Vec<RowId> = frames[from..]
            .iter()
            .map(|f| self.sheet.rows()[f.idx].id.clone())
            .collect();
        path.push(self.sheet.rows()[idx].id.clone());
        warn!(
            sheet = self.sheet.name(),
            row = %self.sheet.rows()[idx].id,
            "Circular reference during resolution"
        );
        RowError::Cycle { path }
    }
}
