//! Next-period utilization target.
//!
//! Idle and barely-moved records say nothing about what the fleet can reach,
//! so only active records are sampled. The recommendation is the level the
//! best quarter of those records already hits.

use crate::aggregate::types::TargetPlan;
use crate::aggregate::utility::{mean, quantile};
use crate::metrics::DerivedRecord;

const TARGET_QUANTILE: f64 = 0.75;

/// Returns `None` when there are no active records to learn from.
pub fn plan_target(records: &[DerivedRecord]) -> Option<TargetPlan> {
    let samples: Vec<f64> = records
        .iter()
        .filter(|r| r.active)
        .map(|r| r.utilization_score)
        .collect();

    let recommended = quantile(&samples, TARGET_QUANTILE)?;
    let best = samples.iter().copied().fold(f64::MIN, f64::max);

    Some(TargetPlan {
        recommended,
        average: mean(&samples),
        best,
        sample_size: samples.len(),
    })
}
