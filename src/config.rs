//! Configuration for the selection engine.
//!
//! Supports TOML files for reproducible runs; every field has a default so a
//! partial file (or an empty one) is valid. Validation runs before any I/O.

use crate::error::{EngineError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// How the optimizer's mean vector is estimated from the panel.
///
/// The panel demeans columns before μ and Σ are computed, so under
/// `Demeaned` μ is numerically close to zero and the bound iteration shapes
/// near-equal weights. `Raw` uses the pre-demean column means instead, which
/// lets the cross-sectional return ranking drive the weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MeanEstimator {
    /// Column means of the demeaned panel (historical behavior).
    #[default]
    Demeaned,
    /// Pre-demean column means.
    Raw,
}

/// Parameters of one selection/backtest invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Length of the historical window for monthly returns, in months.
    #[serde(default = "default_lookback_months")]
    pub lookback_months: u32,
    /// Minimum monthly price observations for a symbol to be considered.
    #[serde(default = "default_min_months")]
    pub min_months: usize,
    /// Pre-screen size: symbols kept after the Sharpe ranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Target portfolio cardinality.
    #[serde(default = "default_k_final")]
    pub k_final: usize,
    /// Annual risk-free rate used in the Sharpe ranking.
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    /// Minimum per-asset weight.
    #[serde(default = "default_w_min")]
    pub w_min: f64,
    /// Maximum per-asset weight.
    #[serde(default = "default_w_max")]
    pub w_max: f64,
    /// Minimum additive diagonal regularizer for the covariance matrix; the
    /// effective value is `max(ridge, 0.05 * |median diagonal|)`.
    #[serde(default = "default_ridge")]
    pub ridge: f64,
    /// Mean-vector estimation mode.
    #[serde(default)]
    pub mean_estimator: MeanEstimator,
}

fn default_lookback_months() -> u32 {
    36
}
fn default_min_months() -> usize {
    24
}
fn default_top_n() -> usize {
    100
}
fn default_k_final() -> usize {
    45
}
fn default_risk_free_rate() -> f64 {
    0.04
}
fn default_w_min() -> f64 {
    0.005
}
fn default_w_max() -> f64 {
    0.03
}
fn default_ridge() -> f64 {
    0.1
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            lookback_months: default_lookback_months(),
            min_months: default_min_months(),
            top_n: default_top_n(),
            k_final: default_k_final(),
            risk_free_rate: default_risk_free_rate(),
            w_min: default_w_min(),
            w_max: default_w_max(),
            ridge: default_ridge(),
            mean_estimator: MeanEstimator::default(),
        }
    }
}

impl SelectionConfig {
    /// Reject configurations the engine cannot run with. Called before any
    /// data-source I/O.
    pub fn validate(&self) -> Result<()> {
        if self.k_final == 0 {
            return Err(EngineError::Config("k_final must be positive".to_string()));
        }
        if self.lookback_months == 0 {
            return Err(EngineError::Config(
                "lookback_months must be positive".to_string(),
            ));
        }
        if self.w_min > self.w_max {
            return Err(EngineError::Config(format!(
                "w_min ({}) exceeds w_max ({})",
                self.w_min, self.w_max
            )));
        }
        if self.top_n < self.k_final {
            return Err(EngineError::Config(format!(
                "top_n ({}) is smaller than k_final ({})",
                self.top_n, self.k_final
            )));
        }
        Ok(())
    }
}

/// Evaluation window settings in the file format (YYYY-MM-DD strings).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WindowSettings {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl WindowSettings {
    /// Parse both bounds; `None` when either is absent.
    pub fn parse(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => {
                let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")?;
                let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")?;
                if start > end {
                    return Err(EngineError::Config(format!(
                        "window start {start} is after end {end}"
                    )));
                }
                Ok(Some((start, end)))
            }
            _ => Ok(None),
        }
    }
}

/// Complete engine configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineFileConfig {
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub window: WindowSettings,
}

impl EngineFileConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.selection.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
