//! Buy-and-hold daily simulation of a fixed-weight portfolio.
//!
//! Each day is weighted by the original portfolio weights restricted to the
//! symbols that traded on both the previous and current date, renormalized
//! over that subset (drift-free weighting). Per-asset daily returns are
//! clipped to neutralize data-error spikes; no survivorship correction beyond
//! what membership and price availability provide.

use crate::types::DailyReturn;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Per-asset, per-day return cap.
pub const DAILY_CLIP: f64 = 0.35;

/// Simulate the portfolio's daily return sequence over the forward dates.
///
/// `dates` must be the sorted distinct trading days after the rebalance date;
/// one return is emitted per adjacent date pair, stamped with the later day.
/// A day where no held symbol has prices on both sides of the pair emits 0.0.
pub fn daily_returns(
    prices: &HashMap<String, HashMap<NaiveDate, f64>>,
    weights: &BTreeMap<String, f64>,
    dates: &[NaiveDate],
) -> Vec<DailyReturn> {
    let mut out = Vec::with_capacity(dates.len().saturating_sub(1));
    for pair in dates.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);

        let mut weight_sum = 0.0;
        let mut weighted_return = 0.0;
        for (symbol, &weight) in weights {
            let Some(series) = prices.get(symbol) else {
                continue;
            };
            let (Some(&p_prev), Some(&p_curr)) = (series.get(&prev), series.get(&curr)) else {
                continue;
            };
            if p_prev == 0.0 {
                continue;
            }
            let r = (p_curr / p_prev - 1.0).clamp(-DAILY_CLIP, DAILY_CLIP);
            weight_sum += weight;
            weighted_return += weight * r;
        }

        let value = if weight_sum > 0.0 {
            weighted_return / weight_sum
        } else {
            0.0
        };
        out.push(DailyReturn::new(curr, value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn series(points: &[(NaiveDate, f64)]) -> HashMap<NaiveDate, f64> {
        points.iter().copied().collect()
    }

    #[test]
    fn test_single_symbol_returns() {
        let mut prices = HashMap::new();
        prices.insert(
            "A".to_string(),
            series(&[(d(1), 100.0), (d(2), 102.0), (d(3), 99.96)]),
        );
        let mut weights = BTreeMap::new();
        weights.insert("A".to_string(), 1.0);

        let returns = daily_returns(&prices, &weights, &[d(1), d(2), d(3)]);
        assert_eq!(returns.len(), 2);
        assert_eq!(returns[0].date, d(2));
        assert!((returns[0].value - 0.02).abs() < 1e-12);
        assert!((returns[1].value - (-0.02)).abs() < 1e-9);
    }

    #[test]
    fn test_spike_clipped_to_cap() {
        // Raw return 0.8; the single-symbol portfolio return must be exactly
        // the 0.35 cap.
        let mut prices = HashMap::new();
        prices.insert("A".to_string(), series(&[(d(1), 100.0), (d(2), 180.0)]));
        let mut weights = BTreeMap::new();
        weights.insert("A".to_string(), 1.0);

        let returns = daily_returns(&prices, &weights, &[d(1), d(2)]);
        assert_eq!(returns.len(), 1);
        assert_eq!(returns[0].value, DAILY_CLIP);
    }

    #[test]
    fn test_crash_clipped_to_negative_cap() {
        let mut prices = HashMap::new();
        prices.insert("A".to_string(), series(&[(d(1), 100.0), (d(2), 10.0)]));
        let mut weights = BTreeMap::new();
        weights.insert("A".to_string(), 1.0);

        let returns = daily_returns(&prices, &weights, &[d(1), d(2)]);
        assert_eq!(returns[0].value, -DAILY_CLIP);
    }

    #[test]
    fn test_missing_symbol_renormalizes_daily() {
        // B never trades forward; A carries the whole portfolio each day.
        let mut prices = HashMap::new();
        prices.insert("A".to_string(), series(&[(d(1), 100.0), (d(2), 101.0)]));
        prices.insert("B".to_string(), HashMap::new());
        let mut weights = BTreeMap::new();
        weights.insert("A".to_string(), 0.5);
        weights.insert("B".to_string(), 0.5);

        let returns = daily_returns(&prices, &weights, &[d(1), d(2)]);
        assert!((returns[0].value - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_partial_overlap_weights_qualifying_subset() {
        let mut prices = HashMap::new();
        prices.insert("A".to_string(), series(&[(d(1), 100.0), (d(2), 110.0)]));
        // B trades on both days too; C only on the first.
        prices.insert("B".to_string(), series(&[(d(1), 50.0), (d(2), 50.0)]));
        prices.insert("C".to_string(), series(&[(d(1), 10.0)]));
        let mut weights = BTreeMap::new();
        weights.insert("A".to_string(), 0.25);
        weights.insert("B".to_string(), 0.25);
        weights.insert("C".to_string(), 0.5);

        let returns = daily_returns(&prices, &weights, &[d(1), d(2)]);
        // Qualifying weight mass is 0.5, split evenly: 0.5*0.10 + 0.5*0.0.
        assert!((returns[0].value - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_no_qualifying_symbol_emits_zero() {
        let mut prices = HashMap::new();
        prices.insert("A".to_string(), series(&[(d(1), 100.0)]));
        let mut weights = BTreeMap::new();
        weights.insert("A".to_string(), 1.0);

        let returns = daily_returns(&prices, &weights, &[d(1), d(2)]);
        assert_eq!(returns.len(), 1);
        assert_eq!(returns[0].value, 0.0);
    }

    #[test]
    fn test_zero_previous_price_skipped() {
        let mut prices = HashMap::new();
        prices.insert("A".to_string(), series(&[(d(1), 0.0), (d(2), 5.0)]));
        let mut weights = BTreeMap::new();
        weights.insert("A".to_string(), 1.0);

        let returns = daily_returns(&prices, &weights, &[d(1), d(2)]);
        assert_eq!(returns[0].value, 0.0);
    }

    #[test]
    fn test_fewer_than_two_dates_is_empty() {
        let prices = HashMap::new();
        let weights = BTreeMap::new();
        assert!(daily_returns(&prices, &weights, &[]).is_empty());
        assert!(daily_returns(&prices, &weights, &[d(1)]).is_empty());
    }
}
