//! Error types for the selection engine.

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for the selection engine.
///
/// Data scarcity is deliberately *not* an error: every scarcity guard in the
/// orchestrator returns `Ok(None)` and logs the cause. The variants here cover
/// configuration mistakes, hard numerical failures, data-source faults, and
/// cancellation.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Covariance inversion failed twice (rebalance {period}, {assets} assets, {rows} rows)")]
    Numerical {
        period: NaiveDate,
        assets: usize,
        rows: usize,
    },

    #[error("Data error: {0}")]
    Data(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cancelled")]
    Cancelled,
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
