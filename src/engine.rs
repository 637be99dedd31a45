//! Selection and backtest orchestration.
//!
//! One invocation covers one evaluation window: pick the rebalance date,
//! filter the universe by membership, assemble the lookback panel, optimize
//! and prune the weights, then simulate daily forward returns. Data scarcity
//! at any step returns `Ok(None)`; only configuration mistakes, hard
//! numerical failures, data-source faults, and cancellation are errors.

use crate::calendar::month_ends;
use crate::config::{MeanEstimator, SelectionConfig};
use crate::data::DataSource;
use crate::error::{EngineError, Result};
use crate::optimizer::solve_weights;
use crate::panel::{self, ReturnPanel};
use crate::pruner::prune;
use crate::returns::monthly_returns;
use crate::stats::{covariance, mean_vector, sharpe_monthly};
use crate::types::{PriceRecord, SelectionResult};
use chrono::{Days, Months, NaiveDate};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Shared flag for aborting a running invocation between steps.
///
/// Cancellation is cooperative: the engine checks the token before each
/// data-source read and aborts with [`EngineError::Cancelled`], leaving no
/// partial state behind.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// The selection and backtest engine.
///
/// Holds only configuration; every invocation owns its buffers and shares no
/// mutable state, so independent windows may run concurrently.
pub struct SelectionEngine {
    config: SelectionConfig,
}

impl SelectionEngine {
    /// Create an engine, rejecting invalid configurations before any I/O.
    pub fn new(config: SelectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: SelectionConfig::default(),
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Select and backtest one window; `Ok(None)` signals data scarcity.
    pub fn select(
        &self,
        source: &dyn DataSource,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<SelectionResult>> {
        self.select_with_cancel(source, start, end, &CancelToken::new())
    }

    /// [`select`](Self::select) with cooperative cancellation.
    pub fn select_with_cancel(
        &self,
        source: &dyn DataSource,
        start: NaiveDate,
        end: NaiveDate,
        cancel: &CancelToken,
    ) -> Result<Option<SelectionResult>> {
        let cfg = &self.config;

        cancel.ensure_active()?;
        let all_days = source.distinct_dates(start, end)?;
        if all_days.is_empty() {
            info!(%start, %end, "no trading days in window, skipping");
            return Ok(None);
        }

        let ends = month_ends(&all_days);
        let Some(t0) = pick_rebalance_date(&all_days, &ends, cfg.lookback_months) else {
            info!(%start, %end, "no month-end with lookback history, skipping");
            return Ok(None);
        };
        debug!(%t0, "rebalance date selected");

        cancel.ensure_active()?;
        let eligible = source.memberships_active_at(t0)?;
        if eligible.is_empty() {
            info!(%t0, "no eligible membership, skipping");
            return Ok(None);
        }

        cancel.ensure_active()?;
        let lookback_start = t0
            .checked_sub_months(Months::new(cfg.lookback_months))
            .ok_or_else(|| EngineError::Data(format!("lookback underflow before {t0}")))?;
        let rows = source.prices(&eligible, lookback_start, t0)?;

        let (prices_by_symbol, lookback_days) = index_prices(rows);
        let grid = month_ends(&lookback_days);
        if grid.len() < 2 {
            info!(%t0, "lookback grid too short, skipping");
            return Ok(None);
        }

        // Rank by Sharpe over the monthly grid; symbols with too few present
        // observations or an undefined Sharpe drop out here.
        let min_returns = cfg.min_months.saturating_sub(1);
        let empty = HashMap::new();
        let mut ranked: Vec<(String, Vec<Option<f64>>, f64)> = Vec::new();
        for symbol in &eligible {
            let series = prices_by_symbol.get(symbol).unwrap_or(&empty);
            let monthly = monthly_returns(series, &grid);
            if monthly.iter().flatten().count() < min_returns {
                continue;
            }
            let sharpe = sharpe_monthly(&monthly, cfg.risk_free_rate);
            if !sharpe.is_finite() {
                continue;
            }
            ranked.push((symbol.clone(), monthly, sharpe));
        }
        ranked.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(cfg.top_n);
        if ranked.len() < cfg.k_final {
            info!(
                %t0,
                ranked = ranked.len(),
                k_final = cfg.k_final,
                "too few symbols with valid Sharpe, skipping"
            );
            return Ok(None);
        }

        let columns: Vec<Vec<Option<f64>>> = ranked.iter().map(|(_, m, _)| m.clone()).collect();
        let Some(panel) = panel::assemble(&columns) else {
            info!(%t0, "panel assembly left no usable data, skipping");
            return Ok(None);
        };
        let min_rows = panel::MIN_ROWS.max(min_returns);
        if panel.rows() < min_rows || panel.cols() < cfg.k_final {
            info!(
                %t0,
                rows = panel.rows(),
                cols = panel.cols(),
                "panel below size thresholds, skipping"
            );
            return Ok(None);
        }

        let weight_map = self.optimize(&panel, &ranked, t0)?;

        cancel.ensure_active()?;
        let fwd_start = t0
            .checked_add_days(Days::new(1))
            .ok_or_else(|| EngineError::Data(format!("forward overflow after {t0}")))?;
        let selected: Vec<String> = weight_map.keys().cloned().collect();
        let fwd_rows = source.prices(&selected, fwd_start, end)?;
        let (fwd_prices, fwd_days) = index_prices(fwd_rows);
        if fwd_days.is_empty() {
            info!(%t0, "no forward trading days, skipping");
            return Ok(None);
        }

        let daily_returns = crate::simulate::daily_returns(&fwd_prices, &weight_map, &fwd_days);

        let mut symbols: Vec<String> = selected;
        symbols.sort_by(|a, b| {
            weight_map[b]
                .total_cmp(&weight_map[a])
                .then_with(|| a.cmp(b))
        });

        info!(
            %t0,
            symbols = symbols.len(),
            days = daily_returns.len(),
            "selection complete"
        );

        Ok(Some(SelectionResult {
            rebalance_date: t0,
            symbols,
            weights: weight_map,
            daily_returns,
        }))
    }

    /// Evaluate independent windows in parallel.
    ///
    /// Results are returned in input order; each window carries its own
    /// outcome, so one scarce window never hides another's result.
    pub fn select_windows(
        &self,
        source: &dyn DataSource,
        windows: &[(NaiveDate, NaiveDate)],
        cancel: &CancelToken,
    ) -> Vec<Result<Option<SelectionResult>>> {
        windows
            .par_iter()
            .map(|&(start, end)| self.select_with_cancel(source, start, end, cancel))
            .collect()
    }

    /// Run the optimizer and pruner over the assembled panel and map the
    /// surviving weights back to symbols.
    fn optimize(
        &self,
        panel: &ReturnPanel,
        ranked: &[(String, Vec<Option<f64>>, f64)],
        t0: NaiveDate,
    ) -> Result<BTreeMap<String, f64>> {
        let cfg = &self.config;
        let mu = match cfg.mean_estimator {
            MeanEstimator::Demeaned => mean_vector(&panel.matrix),
            MeanEstimator::Raw => panel.raw_means.clone(),
        };
        let sigma = covariance(&panel.matrix, cfg.ridge);

        let numerical = || EngineError::Numerical {
            period: t0,
            assets: panel.cols(),
            rows: panel.rows(),
        };

        let weights =
            solve_weights(&mu, &sigma, cfg.w_min, cfg.w_max).ok_or_else(numerical)?;
        let (active, pruned) = prune(&mu, &sigma, &weights, cfg.k_final, cfg.w_min, cfg.w_max)
            .ok_or_else(numerical)?;

        let mut weight_map = BTreeMap::new();
        for &i in &active {
            let symbol = &ranked[panel.kept_cols[i]].0;
            weight_map.insert(symbol.clone(), pruned[i]);
        }
        Ok(weight_map)
    }
}

/// First month-end with at least one trading day inside its lookback span.
fn pick_rebalance_date(
    all_days: &[NaiveDate],
    ends: &[NaiveDate],
    lookback_months: u32,
) -> Option<NaiveDate> {
    ends.iter().copied().find(|&end| {
        let Some(from) = end.checked_sub_months(Months::new(lookback_months)) else {
            return false;
        };
        all_days.iter().any(|&day| day >= from && day < end)
    })
}

/// Index raw price rows per symbol and collect the sorted distinct dates.
#[allow(clippy::type_complexity)]
fn index_prices(
    rows: Vec<PriceRecord>,
) -> (HashMap<String, HashMap<NaiveDate, f64>>, Vec<NaiveDate>) {
    let mut by_symbol: HashMap<String, HashMap<NaiveDate, f64>> = HashMap::new();
    let mut days = BTreeSet::new();
    for row in rows {
        days.insert(row.date);
        by_symbol
            .entry(row.symbol)
            .or_default()
            .insert(row.date, row.price_adj);
    }
    (by_symbol, days.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryDataSource;
    use crate::types::MembershipRecord;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn small_config() -> SelectionConfig {
        SelectionConfig {
            lookback_months: 24,
            min_months: 24,
            top_n: 10,
            k_final: 2,
            w_min: 0.4,
            w_max: 0.6,
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_config_rejected_before_io() {
        let config = SelectionConfig {
            k_final: 0,
            ..Default::default()
        };
        assert!(matches!(
            SelectionEngine::new(config),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_empty_window_is_absent() {
        let engine = SelectionEngine::new(small_config()).unwrap();
        let source = MemoryDataSource::new();
        let result = engine
            .select(&source, d(2024, 1, 1), d(2024, 12, 31))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_no_membership_is_absent() {
        let engine = SelectionEngine::new(small_config()).unwrap();
        let mut source = MemoryDataSource::new();
        // Prices but no membership records at all.
        for i in 0..30i64 {
            source.add_price(crate::types::PriceRecord::new(
                "A",
                d(2024, 1, 1) + chrono::Duration::days(i),
                100.0 + i as f64,
            ));
        }
        let result = engine
            .select(&source, d(2024, 1, 1), d(2024, 3, 31))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_cancellation_propagates() {
        let engine = SelectionEngine::new(small_config()).unwrap();
        let mut source = MemoryDataSource::new();
        source.add_membership(MembershipRecord::new("A", d(2000, 1, 1), None));
        let token = CancelToken::new();
        token.cancel();
        let result = engine.select_with_cancel(&source, d(2024, 1, 1), d(2024, 12, 31), &token);
        assert!(matches!(result, Err(EngineError::Cancelled)));
    }

    #[test]
    fn test_pick_rebalance_date_needs_lookback_day() {
        // One trading day before the first month-end qualifies it.
        let days = vec![d(2024, 1, 15), d(2024, 1, 31), d(2024, 2, 29)];
        let ends = month_ends(&days);
        assert_eq!(pick_rebalance_date(&days, &ends, 12), Some(d(2024, 1, 31)));

        // A lone month-end day has nothing strictly before it in range, so
        // the next month-end wins.
        let days = vec![d(2024, 1, 31), d(2024, 2, 29)];
        let ends = month_ends(&days);
        assert_eq!(pick_rebalance_date(&days, &ends, 12), Some(d(2024, 2, 29)));
    }

    #[test]
    fn test_pick_rebalance_date_none_when_no_history() {
        let days = vec![d(2024, 1, 31)];
        let ends = month_ends(&days);
        assert_eq!(pick_rebalance_date(&days, &ends, 12), None);
    }
}
