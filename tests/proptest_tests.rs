//! Property-based tests using proptest for fuzzing and invariant testing.
//!
//! These tests verify that:
//! 1. Month-end derivation is order-insensitive and emits bucket maxima
//! 2. Return conversion preserves length and missing-value semantics
//! 3. Weight vectors stay finite, nonnegative, and normalized under
//!    feasible bounds
//! 4. Simulated daily returns never escape the clip

use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};

use cardinal::calendar::month_ends;
use cardinal::optimizer::{apply_bounds, solve_weights};
use cardinal::returns::to_returns;
use cardinal::simulate::{daily_returns, DAILY_CLIP};
use cardinal::stats::sharpe_monthly;

/// Strategy for arbitrary calendar days (day capped at 28 so every
/// (year, month) combination is valid).
fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2030, 1u32..13, 1u32..29)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

/// Strategy for ragged optional price series.
fn optional_prices_strategy() -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(prop::option::of(0.01..10_000.0f64), 0..60)
}

proptest! {
    #[test]
    fn prop_month_ends_sorted_and_subset(dates in prop::collection::vec(date_strategy(), 0..80)) {
        let ends = month_ends(&dates);

        // Ascending and unique.
        for pair in ends.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
        // Every output came from the input.
        for end in &ends {
            prop_assert!(dates.contains(end));
        }
        // Nothing in the input beats its bucket's emitted maximum.
        for date in &dates {
            use chrono::Datelike;
            let bucket_max = ends
                .iter()
                .find(|e| (e.year(), e.month()) == (date.year(), date.month()))
                .copied();
            prop_assert!(bucket_max.is_some_and(|max| *date <= max));
        }
    }

    #[test]
    fn prop_month_ends_permutation_invariant(dates in prop::collection::vec(date_strategy(), 0..40)) {
        let mut reversed = dates.clone();
        reversed.reverse();
        prop_assert_eq!(month_ends(&dates), month_ends(&reversed));
    }

    #[test]
    fn prop_to_returns_length_and_missing(prices in optional_prices_strategy()) {
        let returns = to_returns(&prices);
        prop_assert_eq!(returns.len(), prices.len().saturating_sub(1));

        for (i, r) in returns.iter().enumerate() {
            match (prices[i], prices[i + 1]) {
                (Some(prev), Some(curr)) if prev != 0.0 => {
                    prop_assert_eq!(*r, Some(curr / prev - 1.0));
                }
                _ => prop_assert!(r.is_none()),
            }
        }
    }

    #[test]
    fn prop_apply_bounds_normalizes_under_feasible_box(
        raw in prop::collection::vec(0.0..10.0f64, 2..12),
        min_frac in 0.01..0.99f64,
    ) {
        let n = raw.len();
        // Feasible box: n * w_min <= 1 <= n * w_max.
        let w_min = min_frac / n as f64;
        let w_max = 2.0 / n as f64;

        let mut weights = raw;
        apply_bounds(&mut weights, w_min, w_max);

        let sum: f64 = weights.iter().sum();
        prop_assert!(weights.iter().all(|w| w.is_finite() && *w >= 0.0));
        prop_assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn prop_solve_weights_finite_on_dominant_diagonal(
        mu in prop::collection::vec(-0.05..0.05f64, 2..8),
        diag_boost in 0.1..1.0f64,
    ) {
        let n = mu.len();
        // Symmetric, strictly diagonally dominant, hence invertible.
        let sigma: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| if i == j { 0.01 * n as f64 + diag_boost } else { 0.005 })
                    .collect()
            })
            .collect();

        let w_min = 0.5 / n as f64;
        let w_max = 2.0 / n as f64;
        let weights = solve_weights(&mu, &sigma, w_min, w_max).unwrap();

        let sum: f64 = weights.iter().sum();
        prop_assert!(weights.iter().all(|w| w.is_finite() && *w >= 0.0));
        prop_assert!(sum > 0.0);
    }

    #[test]
    fn prop_simulated_returns_respect_clip(
        prices_a in prop::collection::vec(0.01..1_000.0f64, 2..30),
        prices_b in prop::collection::vec(0.01..1_000.0f64, 2..30),
        weight_a in 0.0..1.0f64,
    ) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let len = prices_a.len().max(prices_b.len());
        let dates: Vec<NaiveDate> = (0..len)
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();

        let mut panel = HashMap::new();
        panel.insert(
            "A".to_string(),
            dates.iter().zip(&prices_a).map(|(&d, &p)| (d, p)).collect(),
        );
        panel.insert(
            "B".to_string(),
            dates.iter().zip(&prices_b).map(|(&d, &p)| (d, p)).collect(),
        );

        let mut weights = BTreeMap::new();
        weights.insert("A".to_string(), weight_a);
        weights.insert("B".to_string(), 1.0 - weight_a);

        let simulated = daily_returns(&panel, &weights, &dates);
        prop_assert_eq!(simulated.len(), dates.len() - 1);
        for point in simulated {
            prop_assert!(point.value.abs() <= DAILY_CLIP + 1e-12);
        }
    }

    #[test]
    fn prop_sharpe_needs_twelve_observations(
        values in prop::collection::vec(-0.2..0.2f64, 0..11),
    ) {
        let series: Vec<Option<f64>> = values.into_iter().map(Some).collect();
        prop_assert!(sharpe_monthly(&series, 0.04).is_nan());
    }
}
