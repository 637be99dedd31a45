//! Heuristic bounded-weight mean-variance optimizer.
//!
//! Weights start from the unconstrained inverse-covariance solution Σ⁻¹μ,
//! negatives are clamped away, and box bounds are enforced by an iterative
//! clamp-and-renormalize scheme with proportional redistribution from donors
//! to under-minimum assets. No true QP is solved; when `k·w_min > 1` or
//! `k·w_max < 1` the bounds are infeasible and the iteration yields a
//! best-effort vector that may violate a bound.

use crate::stats::{invert_matrix, mat_vec};
use tracing::warn;

/// Maximum clamp-and-renormalize passes in [`apply_bounds`].
const BOUND_ITERATIONS: usize = 10;

/// Tolerance for bound-satisfaction and donor-mass checks.
const EPS: f64 = 1e-9;

/// Solve for bounded portfolio weights over μ and the (ridged) covariance Σ.
///
/// On a singular covariance the diagonal is boosted by 10% of its absolute
/// value and inversion retried once; `None` means the retry failed too and
/// the caller should surface a numerical error.
pub fn solve_weights(
    mu: &[f64],
    sigma: &[Vec<f64>],
    w_min: f64,
    w_max: f64,
) -> Option<Vec<f64>> {
    let inverse = match invert_matrix(sigma) {
        Some(inverse) => inverse,
        None => {
            warn!("covariance inversion failed, retrying with boosted diagonal");
            let mut boosted = sigma.to_vec();
            for (i, row) in boosted.iter_mut().enumerate() {
                row[i] += 0.10 * row[i].abs();
            }
            invert_matrix(&boosted)?
        }
    };

    let mut weights = mat_vec(&inverse, mu);
    for weight in &mut weights {
        if *weight < 0.0 {
            *weight = 0.0;
        }
    }
    normalize(&mut weights);
    apply_bounds(&mut weights, w_min, w_max);
    Some(weights)
}

/// Enforce per-asset box bounds `[w_min, w_max]` in place.
///
/// Each pass clamps to `[0, w_max]` and renormalizes, raises every
/// under-minimum weight to `w_min`, takes the created deficit from the other
/// assets proportionally to their headroom above `w_min`, and renormalizes
/// again. Stops early once every weight sits within tolerance of the box.
pub fn apply_bounds(weights: &mut [f64], w_min: f64, w_max: f64) {
    let n = weights.len();
    for _ in 0..BOUND_ITERATIONS {
        for weight in weights.iter_mut() {
            *weight = weight.clamp(0.0, w_max);
        }
        normalize(weights);

        let needy: Vec<bool> = weights.iter().map(|&w| w < w_min).collect();
        let deficit: f64 = (0..n)
            .filter(|&i| needy[i])
            .map(|i| w_min - weights[i])
            .sum();
        for i in 0..n {
            if needy[i] {
                weights[i] = w_min;
            }
        }

        if deficit > 0.0 {
            let donor_sum: f64 = (0..n)
                .filter(|&i| !needy[i])
                .map(|i| weights[i] - w_min)
                .sum();
            if donor_sum > EPS {
                for i in (0..n).filter(|&i| !needy[i]) {
                    weights[i] -= (weights[i] - w_min) / donor_sum * deficit;
                }
            }
        }
        normalize(weights);

        if within_bounds(weights, w_min, w_max) {
            break;
        }
    }
}

fn normalize(weights: &mut [f64]) {
    let sum: f64 = weights.iter().sum();
    if sum > 0.0 {
        for weight in weights.iter_mut() {
            *weight /= sum;
        }
    }
}

fn within_bounds(weights: &[f64], w_min: f64, w_max: f64) -> bool {
    weights
        .iter()
        .all(|&w| w >= w_min - EPS && w <= w_max + EPS)
}
