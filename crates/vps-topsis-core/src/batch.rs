use std::thread;

use crate::error::TopsisError;
use crate::topsis::rank;
use crate::types::{Alternative, Direction, RankRequest, Ranking};

/// Below this many weight sets the batch runs on the calling thread.
const PARALLEL_THRESHOLD: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub weights: Vec<f64>,
    pub outcome: Result<Ranking, TopsisError>,
}

/// Ranks the same alternatives once per weight vector.
///
/// Every outcome carries the weights it was computed with, and one invalid
/// vector does not affect the others. Output order follows `weight_sets`.
pub fn rank_batch(
    alternatives: &[Alternative],
    directions: &[Direction],
    weight_sets: &[Vec<f64>],
) -> Vec<BatchOutcome> {
    let run = |weights: &Vec<f64>| {
        let request = RankRequest {
            alternatives: alternatives.to_vec(),
            weights: weights.clone(),
            directions: directions.to_vec(),
        };
        BatchOutcome {
            weights: weights.clone(),
            outcome: rank(&request),
        }
    };

    let workers = thread::available_parallelism()
        .map(usize::from)
        .unwrap_or(1)
        .min(weight_sets.len());
    if weight_sets.len() < PARALLEL_THRESHOLD || workers <= 1 {
        return weight_sets.iter().map(run).collect();
    }

    let chunk = weight_sets.len().div_ceil(workers);
    thread::scope(|scope| {
        let handles: Vec<_> = weight_sets
            .chunks(chunk)
            .map(|part| scope.spawn(move || part.iter().map(run).collect::<Vec<_>>()))
            .collect();

        handles
            .into_iter()
            .zip(weight_sets.chunks(chunk))
            .flat_map(|(handle, part)| {
                // A panicking worker is rerun inline so every set still gets an outcome.
                handle
                    .join()
                    .unwrap_or_else(|_| part.iter().map(run).collect())
            })
            .collect()
    })
}
