//! Price-to-return conversion with explicit missing values.

use chrono::NaiveDate;
use std::collections::HashMap;

/// Convert a series of optional prices to simple returns.
///
/// The output has length `max(0, n - 1)`. Position `i` holds
/// `prices[i+1] / prices[i] - 1` when both prices are present and
/// `prices[i] != 0`; otherwise `None`. No smoothing, no forward fill.
pub fn to_returns(prices: &[Option<f64>]) -> Vec<Option<f64>> {
    if prices.len() < 2 {
        return Vec::new();
    }
    prices
        .windows(2)
        .map(|w| match (w[0], w[1]) {
            (Some(prev), Some(curr)) if prev != 0.0 => Some(curr / prev - 1.0),
            _ => None,
        })
        .collect()
}

/// Sample a symbol's price at each grid date.
///
/// A slot is `Some` only when the symbol traded exactly on the grid date; a
/// missing month stays `None` rather than being filled from a neighbor.
pub fn month_end_prices(
    prices_by_date: &HashMap<NaiveDate, f64>,
    grid: &[NaiveDate],
) -> Vec<Option<f64>> {
    grid.iter()
        .map(|date| prices_by_date.get(date).copied())
        .collect()
}

/// Monthly return series for a symbol, aligned to `grid[1..]`.
pub fn monthly_returns(
    prices_by_date: &HashMap<NaiveDate, f64>,
    grid: &[NaiveDate],
) -> Vec<Option<f64>> {
    to_returns(&month_end_prices(prices_by_date, grid))
}
