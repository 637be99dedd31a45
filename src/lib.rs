//! Cardinal - long-only portfolio selection and buy-and-hold backtesting
//! over a time-varying index universe.
//!
//! # Overview
//!
//! For one evaluation window, cardinal picks a single rebalance date, ranks
//! the symbols eligible on that day by historical risk-adjusted return,
//! builds a bounded-weight mean-variance portfolio, prunes it to a target
//! cardinality, and simulates buy-and-hold daily returns to the window end:
//!
//! - **Membership-aware universe**: eligibility follows index-membership
//!   intervals, so delisted and late-joining symbols are handled faithfully
//! - **Coverage-tolerant statistics**: ragged monthly return series are
//!   compacted into a dense panel with explicit missing-value thresholds
//! - **Regularized optimization**: ridge-stabilized covariance, heuristic
//!   box-bounded weights, greedy cardinality pruning
//! - **Drift-free simulation**: fixed target weights, renormalized daily over
//!   the symbols that actually traded, with per-asset return clipping
//!
//! # Quick Start
//!
//! ```no_run
//! use cardinal::config::SelectionConfig;
//! use cardinal::data::MemoryDataSource;
//! use cardinal::engine::SelectionEngine;
//! use chrono::NaiveDate;
//!
//! let mut source = MemoryDataSource::new();
//! source.load_prices_csv("data/prices.csv").unwrap();
//! source.load_memberships_csv("data/membership.csv").unwrap();
//!
//! let engine = SelectionEngine::new(SelectionConfig::default()).unwrap();
//! let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
//!
//! match engine.select(&source, start, end).unwrap() {
//!     Some(result) => {
//!         println!("rebalanced {} symbols on {}", result.symbols.len(), result.rebalance_date);
//!     }
//!     None => println!("not enough data in this window"),
//! }
//! ```
//!
//! # Modules
//!
//! - [`types`]: core value types (prices, memberships, results)
//! - [`data`]: the `DataSource` contract and the in-memory/CSV implementation
//! - [`calendar`]: month-end derivation from irregular trading days
//! - [`returns`]: price-to-return conversion with explicit missing values
//! - [`panel`]: coverage-tolerant return panel assembly
//! - [`stats`]: Sharpe, mean vector, ridge covariance, matrix inversion
//! - [`optimizer`]: heuristic bounded-weight solver
//! - [`pruner`]: greedy cardinality reduction
//! - [`simulate`]: daily buy-and-hold simulation
//! - [`engine`]: the orchestrator tying the steps together
//! - [`analytics`]: performance metrics over the daily return sequence
//! - [`config`]: TOML-backed configuration
//! - [`export`]: CSV/JSON result export

pub mod analytics;
pub mod calendar;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod export;
pub mod optimizer;
pub mod panel;
pub mod pruner;
pub mod returns;
pub mod simulate;
pub mod stats;
pub mod types;

// Re-exports for convenience
pub use analytics::PerformanceSummary;
pub use config::{EngineFileConfig, MeanEstimator, SelectionConfig, WindowSettings};
pub use data::{DataSource, MemoryDataSource};
pub use engine::{CancelToken, SelectionEngine};
pub use error::{EngineError, Result};
pub use types::{DailyReturn, MembershipRecord, PriceRecord, SelectionResult};
