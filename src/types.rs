//! Core data types for the selection engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single adjusted-close observation, keyed uniquely by (symbol, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub symbol: String,
    pub date: NaiveDate,
    /// Adjusted close. Positive; converted to f64 at the source boundary.
    pub price_adj: f64,
}

impl PriceRecord {
    pub fn new(symbol: impl Into<String>, date: NaiveDate, price_adj: f64) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            price_adj,
        }
    }
}

/// One index-membership interval for a symbol.
///
/// A symbol may carry several open or closed intervals; eligibility on a day
/// is the union over its records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub symbol: String,
    pub start_date: NaiveDate,
    /// `None` means the membership is still open.
    pub end_date: Option<NaiveDate>,
}

impl MembershipRecord {
    pub fn new(
        symbol: impl Into<String>,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            start_date,
            end_date,
        }
    }

    /// Whether this interval covers the given day.
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start_date <= day && self.end_date.is_none_or(|end| day <= end)
    }
}

/// One point of the simulated daily return sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyReturn {
    pub date: NaiveDate,
    pub value: f64,
}

impl DailyReturn {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Output of one engine invocation: the constructed portfolio and its
/// buy-and-hold simulation from the rebalance date to the window end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// The single day the portfolio was constructed on (a month-end within
    /// the requested window).
    pub rebalance_date: NaiveDate,
    /// Selected symbols, ordered by descending weight (ties lexicographic).
    pub symbols: Vec<String>,
    /// Final weight per selected symbol.
    pub weights: BTreeMap<String, f64>,
    /// Portfolio returns for dates strictly after the rebalance date, up to
    /// the window end.
    pub daily_returns: Vec<DailyReturn>,
}

impl SelectionResult {
    /// Sum of the final weights.
    pub fn weight_sum(&self) -> f64 {
        self.weights.values().sum()
    }
}
