//! Trading-calendar helpers.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Derive month-end trading days from an irregular set of dates.
///
/// Dates are bucketed by (year, month) and the maximum date of each bucket is
/// emitted, sorted ascending. Input may contain duplicates and gaps; empty
/// input yields an empty vector.
pub fn month_ends(dates: &[NaiveDate]) -> Vec<NaiveDate> {
    let mut by_month: BTreeMap<(i32, u32), NaiveDate> = BTreeMap::new();
    for &date in dates {
        by_month
            .entry((date.year(), date.month()))
            .and_modify(|max| {
                if date > *max {
                    *max = date;
                }
            })
            .or_insert(date);
    }
    by_month.into_values().collect()
}
