//! Performance metrics over a simulated daily return sequence.

use crate::stats::PPY;
use crate::types::DailyReturn;
use serde::{Deserialize, Serialize};

/// Summary metrics for one backtested window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PerformanceSummary {
    /// Compounded total return over the sequence, as a percentage.
    pub total_return_pct: f64,
    /// Compound annual growth rate over 252-day years, as a percentage.
    pub cagr_pct: f64,
    /// Annualized volatility of daily returns, as a percentage.
    pub volatility_annual_pct: f64,
    /// Annualized Sharpe ratio of daily excess returns.
    pub sharpe_ratio: f64,
    /// Maximum peak-to-trough drawdown of the compounded curve, as a
    /// positive percentage.
    pub max_drawdown_pct: f64,
    /// Number of daily observations.
    pub observations: usize,
}

impl PerformanceSummary {
    /// Compute the summary from a daily return sequence.
    ///
    /// An empty sequence yields the zeroed default.
    pub fn from_daily(returns: &[DailyReturn], risk_free_rate: f64) -> Self {
        if returns.is_empty() {
            return Self::default();
        }

        let n = returns.len();
        let values: Vec<f64> = returns.iter().map(|r| r.value).collect();

        let total_growth = values.iter().fold(1.0, |acc, r| acc * (1.0 + r));
        let total_return = total_growth - 1.0;

        let years = n as f64 / PPY;
        let cagr = if total_growth > 0.0 {
            total_growth.powf(1.0 / years) - 1.0
        } else {
            -1.0
        };

        let mean = values.iter().sum::<f64>() / n as f64;
        let variance = values.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
            / (n - 1).max(1) as f64;
        let volatility_annual = variance.sqrt() * PPY.sqrt();

        let daily_rf = (1.0 + risk_free_rate).powf(1.0 / PPY) - 1.0;
        let excess: Vec<f64> = values.iter().map(|r| r - daily_rf).collect();
        let excess_mean = excess.iter().sum::<f64>() / n as f64;
        let excess_variance = excess.iter().map(|e| (e - excess_mean).powi(2)).sum::<f64>()
            / (n - 1).max(1) as f64;
        let excess_std = excess_variance.sqrt();
        let sharpe_ratio = if excess_std > 0.0 {
            excess_mean / excess_std * PPY.sqrt()
        } else {
            0.0
        };

        let mut peak = 1.0;
        let mut max_drawdown = 0.0_f64;
        let mut equity = 1.0;
        for r in &values {
            equity *= 1.0 + r;
            if equity > peak {
                peak = equity;
            }
            max_drawdown = max_drawdown.max((peak - equity) / peak);
        }

        Self {
            total_return_pct: total_return * 100.0,
            cagr_pct: cagr * 100.0,
            volatility_annual_pct: volatility_annual * 100.0,
            sharpe_ratio,
            max_drawdown_pct: max_drawdown * 100.0,
            observations: n,
        }
    }
}
