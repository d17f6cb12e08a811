//! Amount-weighted rate rollups for the interest-rate statement.
//!
//! Rates cannot be summed like amounts, so a category row is rolled up from
//! its sub-rows: the weighted average rate, the nominal range of positive
//! rates, and the total amount outstanding.

use serde::Serialize;
use std::cmp::Ordering;

/// One child row's contribution: its rate and the amount outstanding at it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RatePoint {
    pub rate: f64,
    pub amount: f64,
}

impl RatePoint {
    pub fn new(rate: f64, amount: f64) -> RatePoint {
        RatePoint { rate, amount }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RateSummary {
    pub weighted_avg_rate: f64,
    pub nominal_low: f64,
    pub nominal_high: f64,
    pub total_amount: f64,
}

/// Roll up a set of children.
///
/// - `weighted_avg_rate` is `Σ(rate·amount) / Σ(amount)`, or 0 when the
///   amounts sum to 0.
/// - `nominal_low`/`nominal_high` span the rates strictly above 0, or are both
///   0 when there are none.
///
/// Points are sorted before reduction, so any permutation of `children`
/// produces a bit-identical summary.
pub fn aggregate(children: &[RatePoint]) -> RateSummary {
    let mut points = children.to_vec();
    points.sort_by(|a, b| match a.rate.total_cmp(&b.rate) {
        Ordering::Equal => a.amount.total_cmp(&b.amount),
        other => other,
    });

    let mut weighted_sum = 0.0;
    let mut total_amount = 0.0;
    let mut range: Option<(f64, f64)> = None;
    for p in &points {
        weighted_sum += p.rate * p.amount;
        total_amount += p.amount;
        if p.rate > 0.0 {
            range = Some(match range {
                Some((lo, hi)) => (lo.min(p.rate), hi.max(p.rate)),
                None => (p.rate, p.rate),
            });
        }
    }

    let weighted_avg_rate = if total_amount == 0.0 {
        0.0
    } else {
        weighted_sum / total_amount
    };
    let (nominal_low, nominal_high) = range.unwrap_or((0.0, 0.0));

    RateSummary {
        weighted_avg_rate,
        nominal_low,
        nominal_high,
        total_amount,
    }
}
