//! Greedy cardinality reduction.
//!
//! Drops the smallest-weight asset and re-optimizes on the survivors until
//! the target cardinality is reached. A heuristic, not a MIQP: global
//! optimality is not claimed.

use crate::optimizer::solve_weights;
use crate::stats::{submatrix, subvector};
use tracing::debug;

/// Prune the optimizer's full-width solution down to `k_final` assets.
///
/// Each round removes the active index with the smallest current weight
/// (ties resolved to the lowest index), rebuilds μ and Σ on the survivors
/// (the ridged diagonal carries over), re-runs the optimizer, and scatters
/// the result back into a full-width vector. Returns the surviving indices
/// (ascending) and the full-width weight vector, or `None` when a re-solve
/// hits an unrecoverable singular covariance.
pub fn prune(
    mu: &[f64],
    sigma: &[Vec<f64>],
    initial_weights: &[f64],
    k_final: usize,
    w_min: f64,
    w_max: f64,
) -> Option<(Vec<usize>, Vec<f64>)> {
    let n = initial_weights.len();
    let mut active: Vec<usize> = (0..n).collect();
    let mut weights = initial_weights.to_vec();

    while active.len() > k_final {
        let mut victim = active[0];
        for &i in &active {
            if weights[i] < weights[victim] {
                victim = i;
            }
        }
        active.retain(|&i| i != victim);
        debug!(victim, remaining = active.len(), "pruned asset");

        let mu_sub = subvector(mu, &active);
        let sigma_sub = submatrix(sigma, &active);
        let sub_weights = solve_weights(&mu_sub, &sigma_sub, w_min, w_max)?;

        weights = vec![0.0; n];
        for (&i, &w) in active.iter().zip(&sub_weights) {
            weights[i] = w;
        }
    }

    Some((active, weights))
}
