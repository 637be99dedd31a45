//! Coverage-tolerant return panel assembly.
//!
//! Ragged per-symbol monthly return series are compacted into a dense T×N
//! matrix: columns below the coverage threshold are dropped first, then rows,
//! then each kept column is demeaned over its present values and the holes are
//! zero-filled. Demeaning before imputation makes the zero fill equivalent to
//! substituting the column mean, which keeps covariance magnitudes intact
//! under missing-at-random data.

use tracing::debug;

/// Minimum fraction of present values for a column (symbol) to be kept.
pub const COL_COVERAGE: f64 = 0.85;
/// Minimum fraction of present values for a row (month) to be kept.
pub const ROW_COVERAGE: f64 = 0.80;
/// Minimum number of rows the assembled panel must retain.
pub const MIN_ROWS: usize = 24;

/// Dense demeaned return panel plus the indices that survived filtering.
///
/// `kept_rows` and `kept_cols` reference the pre-filter grid and symbol list.
/// `raw_means[j]` is the mean of kept column j's present values before
/// demeaning, kept around for the raw mean-estimator mode.
#[derive(Debug, Clone)]
pub struct ReturnPanel {
    /// T rows (months) by N columns (symbols), demeaned and zero-imputed.
    pub matrix: Vec<Vec<f64>>,
    pub kept_rows: Vec<usize>,
    pub kept_cols: Vec<usize>,
    pub raw_means: Vec<f64>,
}

impl ReturnPanel {
    pub fn rows(&self) -> usize {
        self.matrix.len()
    }

    pub fn cols(&self) -> usize {
        self.matrix.first().map_or(0, Vec::len)
    }
}

/// Assemble a dense panel from one ragged column per symbol.
///
/// Every column must have the same length (the lookback grid size). Returns
/// `None` when nothing survives filtering; size guards against `MIN_ROWS` and
/// the portfolio cardinality are the orchestrator's job.
pub fn assemble(columns: &[Vec<Option<f64>>]) -> Option<ReturnPanel> {
    let total_rows = columns.first().map_or(0, Vec::len);
    if total_rows == 0 {
        return None;
    }

    // Column filter: coverage over the full grid.
    let kept_cols: Vec<usize> = (0..columns.len())
        .filter(|&j| {
            let present = columns[j].iter().flatten().count();
            present as f64 / total_rows as f64 >= COL_COVERAGE
        })
        .collect();
    if kept_cols.is_empty() {
        debug!("panel: no column met the {COL_COVERAGE} coverage threshold");
        return None;
    }

    // Row filter: coverage over the surviving columns only.
    let kept_rows: Vec<usize> = (0..total_rows)
        .filter(|&i| {
            let present = kept_cols
                .iter()
                .filter(|&&j| columns[j][i].is_some())
                .count();
            present as f64 / kept_cols.len() as f64 >= ROW_COVERAGE
        })
        .collect();
    if kept_rows.is_empty() {
        debug!("panel: no row met the {ROW_COVERAGE} coverage threshold");
        return None;
    }

    // Demean each kept column over its present values, then zero-fill holes.
    let mut matrix = vec![vec![0.0; kept_cols.len()]; kept_rows.len()];
    let mut raw_means = Vec::with_capacity(kept_cols.len());
    for (out_j, &j) in kept_cols.iter().enumerate() {
        let present: Vec<f64> = kept_rows.iter().filter_map(|&i| columns[j][i]).collect();
        let mean = if present.is_empty() {
            0.0
        } else {
            present.iter().sum::<f64>() / present.len() as f64
        };
        raw_means.push(mean);

        for (out_i, &i) in kept_rows.iter().enumerate() {
            matrix[out_i][out_j] = match columns[j][i] {
                Some(value) => value - mean,
                None => 0.0,
            };
        }
    }

    debug!(
        rows = kept_rows.len(),
        cols = kept_cols.len(),
        "panel assembled"
    );

    Some(ReturnPanel {
        matrix,
        kept_rows,
        kept_cols,
        raw_means,
    })
}
