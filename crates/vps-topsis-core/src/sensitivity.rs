use serde::{Deserialize, Serialize};

use crate::batch::rank_batch;
use crate::error::TopsisError;
use crate::types::{Alternative, Direction, Ranking};

pub const MAX_SWEEP_POINTS: usize = 1000;

/// Steps the weight of one criterion from `start` to `end` while the
/// remainder is shared equally by the other criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivitySweep {
    pub criterion: usize,
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl SensitivitySweep {
    pub fn new(criterion: usize, start: f64, end: f64, step: f64) -> Self {
        Self {
            criterion,
            start,
            end,
            step,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    /// Weight of the swept criterion at this point.
    pub weight: f64,
    pub weights: Vec<f64>,
    pub ranking: Ranking,
}

pub fn sweep_weights(
    criteria_count: usize,
    sweep: &SensitivitySweep,
) -> Result<Vec<Vec<f64>>, TopsisError> {
    if criteria_count < 2 {
        return Err(TopsisError::InvalidSweep(
            "a sweep needs at least two criteria".to_string(),
        ));
    }
    if sweep.criterion >= criteria_count {
        return Err(TopsisError::InvalidSweep(format!(
            "criterion {} out of range for {criteria_count} criteria",
            sweep.criterion
        )));
    }
    if ![sweep.start, sweep.end, sweep.step].iter().all(|v| v.is_finite()) {
        return Err(TopsisError::InvalidSweep(
            "start, end and step must be finite".to_string(),
        ));
    }
    if sweep.step <= 0.0 {
        return Err(TopsisError::InvalidSweep("step must be positive".to_string()));
    }
    if sweep.start < 0.0 || sweep.end > 1.0 || sweep.start > sweep.end {
        return Err(TopsisError::InvalidSweep(format!(
            "range [{}, {}] must satisfy 0 <= start <= end <= 1",
            sweep.start, sweep.end
        )));
    }

    // Floor so the last point never passes `end`; the epsilon keeps exact multiples.
    let span = ((sweep.end - sweep.start) / sweep.step + 1e-9).floor();
    if span >= MAX_SWEEP_POINTS as f64 {
        return Err(TopsisError::InvalidSweep(format!(
            "sweep would produce more than {MAX_SWEEP_POINTS} points"
        )));
    }
    let steps = span as usize;

    let others = (criteria_count - 1) as f64;
    let sets = (0..=steps)
        .map(|k| {
            let w = (sweep.start + k as f64 * sweep.step).min(1.0);
            let rest = (1.0 - w) / others;
            (0..criteria_count)
                .map(|j| if j == sweep.criterion { w } else { rest })
                .collect()
        })
        .collect();
    Ok(sets)
}

pub fn run_sweep(
    alternatives: &[Alternative],
    directions: &[Direction],
    sweep: &SensitivitySweep,
) -> Result<Vec<SweepPoint>, TopsisError> {
    let sets = sweep_weights(directions.len(), sweep)?;
    rank_batch(alternatives, directions, &sets)
        .into_iter()
        .map(|entry| {
            let weight = entry
                .weights
                .get(sweep.criterion)
                .copied()
                .unwrap_or_default();
            entry.outcome.map(|ranking| SweepPoint {
                weight,
                weights: entry.weights,
                ranking,
            })
        })
        .collect()
}

/// Rank of `id` at every sweep point.
pub fn rank_trace(points: &[SweepPoint], id: &str) -> Vec<Option<usize>> {
    points.iter().map(|p| p.ranking.rank_of(id)).collect()
}
