use crate::error::TopsisError;
use crate::types::{Direction, RankRequest, RankedAlternative, Ranking, TopsisBreakdown};

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Score assigned when an alternative sits at both ideal points at once
/// (`D+ + D- == 0`), e.g. a single alternative or identical rows.
pub const DEGENERATE_SCORE: f64 = 0.5;

// Absorbs float error so that sums such as 0.33 * 3 stay inside the tolerance.
const SUM_EPSILON: f64 = 1e-9;

pub fn validate(request: &RankRequest) -> Result<(), TopsisError> {
    let criteria = request.directions.len();
    if request.alternatives.is_empty() {
        return Err(TopsisError::InvalidMatrix(
            "at least one alternative is required".to_string(),
        ));
    }
    if criteria == 0 {
        return Err(TopsisError::InvalidMatrix(
            "at least one criterion is required".to_string(),
        ));
    }

    validate_weights(&request.weights, criteria)?;

    for (row, alternative) in request.alternatives.iter().enumerate() {
        if alternative.values.len() != criteria {
            return Err(TopsisError::InvalidMatrix(format!(
                "alternative {:?} (row {row}) has {} values, expected {criteria}",
                alternative.id,
                alternative.values.len()
            )));
        }
        if let Some(col) = alternative.values.iter().position(|v| !v.is_finite()) {
            return Err(TopsisError::InvalidMatrix(format!(
                "alternative {:?} (row {row}) has a non-numeric value in column {col}",
                alternative.id
            )));
        }
    }

    Ok(())
}

pub fn validate_weights(weights: &[f64], criteria: usize) -> Result<(), TopsisError> {
    if weights.len() != criteria {
        return Err(TopsisError::InvalidWeights(format!(
            "expected {criteria} weights, got {}",
            weights.len()
        )));
    }
    if let Some((idx, w)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || !(0.0..=1.0).contains(*w))
    {
        return Err(TopsisError::InvalidWeights(format!(
            "weight {idx} is {w}, expected a value in [0, 1]"
        )));
    }

    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE + SUM_EPSILON {
        return Err(TopsisError::InvalidWeights(format!(
            "weights sum to {sum:.4}, expected 1.0 ± {WEIGHT_SUM_TOLERANCE}"
        )));
    }
    Ok(())
}

/// Runs the full procedure and keeps every intermediate matrix.
pub fn breakdown(request: &RankRequest) -> Result<TopsisBreakdown, TopsisError> {
    validate(request)?;

    let decision: Vec<Vec<f64>> = request
        .alternatives
        .iter()
        .map(|a| a.values.clone())
        .collect();
    let column_norms = column_norms(&decision, request.directions.len());
    let normalized: Vec<Vec<f64>> = decision
        .iter()
        .map(|row| {
            row.iter()
                .zip(&column_norms)
                .map(|(x, norm)| if *norm == 0.0 { 0.0 } else { x / norm })
                .collect()
        })
        .collect();
    let weighted: Vec<Vec<f64>> = normalized
        .iter()
        .map(|row| {
            row.iter()
                .zip(&request.weights)
                .map(|(r, w)| r * w)
                .collect()
        })
        .collect();

    let (ideal_positive, ideal_negative) = ideal_solutions(&weighted, &request.directions);
    let d_plus: Vec<f64> = weighted
        .iter()
        .map(|row| euclidean(row, &ideal_positive))
        .collect();
    let d_minus: Vec<f64> = weighted
        .iter()
        .map(|row| euclidean(row, &ideal_negative))
        .collect();
    let scores: Vec<f64> = d_plus
        .iter()
        .zip(&d_minus)
        .map(|(dp, dn)| closeness(*dp, *dn))
        .collect();
    let ranks = positional_ranks(&scores);

    Ok(TopsisBreakdown {
        ids: request.alternatives.iter().map(|a| a.id.clone()).collect(),
        weights: request.weights.clone(),
        directions: request.directions.clone(),
        decision,
        column_norms,
        normalized,
        weighted,
        ideal_positive,
        ideal_negative,
        d_plus,
        d_minus,
        scores,
        ranks,
    })
}

pub fn rank(request: &RankRequest) -> Result<Ranking, TopsisError> {
    Ok(ranking_from_breakdown(breakdown(request)?))
}

pub fn ranking_from_breakdown(detail: TopsisBreakdown) -> Ranking {
    let mut results: Vec<RankedAlternative> = detail
        .ids
        .into_iter()
        .zip(detail.scores)
        .zip(detail.d_plus.iter().zip(&detail.d_minus))
        .zip(&detail.ranks)
        .enumerate()
        .map(|(index, (((id, score), (d_plus, d_minus)), rank))| RankedAlternative {
            id,
            index,
            score,
            rank: *rank,
            d_plus: *d_plus,
            d_minus: *d_minus,
        })
        .collect();
    results.sort_by_key(|r| r.rank);

    Ranking {
        results,
        ideal_positive: detail.ideal_positive,
        ideal_negative: detail.ideal_negative,
    }
}

/// Euclidean norm per column, folded with `hypot` so that very large or very
/// small magnitudes neither overflow nor underflow.
fn column_norms(matrix: &[Vec<f64>], criteria: usize) -> Vec<f64> {
    let mut norms = vec![0.0_f64; criteria];
    for row in matrix {
        for (norm, x) in norms.iter_mut().zip(row) {
            *norm = norm.hypot(*x);
        }
    }
    norms
}

fn ideal_solutions(weighted: &[Vec<f64>], directions: &[Direction]) -> (Vec<f64>, Vec<f64>) {
    let mut max = vec![f64::NEG_INFINITY; directions.len()];
    let mut min = vec![f64::INFINITY; directions.len()];
    for row in weighted {
        for ((hi, lo), y) in max.iter_mut().zip(min.iter_mut()).zip(row) {
            *hi = hi.max(*y);
            *lo = lo.min(*y);
        }
    }

    directions
        .iter()
        .zip(max.into_iter().zip(min))
        .map(|(direction, (hi, lo))| match direction {
            Direction::Benefit => (hi, lo),
            Direction::Cost => (lo, hi),
        })
        .unzip()
}

fn euclidean(row: &[f64], point: &[f64]) -> f64 {
    row.iter()
        .zip(point)
        .map(|(y, a)| (y - a) * (y - a))
        .sum::<f64>()
        .sqrt()
}

fn closeness(d_plus: f64, d_minus: f64) -> f64 {
    let total = d_plus + d_minus;
    if total == 0.0 {
        DEGENERATE_SCORE
    } else {
        (d_minus / total).clamp(0.0, 1.0)
    }
}

/// 1-based positions after a stable descending sort, reported in input order.
/// Equal scores keep their input order.
fn positional_ranks(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|a, b| {
        let sa = scores.get(*a).copied().unwrap_or(f64::NEG_INFINITY);
        let sb = scores.get(*b).copied().unwrap_or(f64::NEG_INFINITY);
        sb.total_cmp(&sa)
    });

    let mut ranks = vec![0_usize; scores.len()];
    for (pos, idx) in order.into_iter().enumerate() {
        if let Some(slot) = ranks.get_mut(idx) {
            *slot = pos + 1;
        }
    }
    ranks
}
