//! Return statistics: Sharpe ratio, mean vector, ridge covariance, and the
//! small dense linear algebra the optimizer needs.

/// Periods per year for daily data.
pub const PPY: f64 = 252.0;
/// Periods per year for monthly data.
pub const PPM: f64 = 12.0;

/// Minimum number of present observations for a valid monthly Sharpe.
const MIN_SHARPE_OBS: usize = 12;

/// Annualized monthly Sharpe ratio over a ragged return series.
///
/// Absent months are skipped. Requires at least 12 present observations and a
/// strictly positive sample standard deviation of the excess returns;
/// otherwise returns NaN so callers can rank on validity.
pub fn sharpe_monthly(returns: &[Option<f64>], rf_annual: f64) -> f64 {
    let present: Vec<f64> = returns.iter().flatten().copied().collect();
    if present.len() < MIN_SHARPE_OBS {
        return f64::NAN;
    }

    let rf_monthly = (1.0 + rf_annual).powf(1.0 / PPM) - 1.0;
    let excess: Vec<f64> = present.iter().map(|r| r - rf_monthly).collect();

    let n = excess.len();
    let mean = excess.iter().sum::<f64>() / n as f64;
    let variance =
        excess.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / (n - 1).max(1) as f64;
    let std = variance.sqrt();
    if std <= 0.0 {
        return f64::NAN;
    }

    mean / std * PPM.sqrt()
}

/// Column means of a T×N matrix.
pub fn mean_vector(matrix: &[Vec<f64>]) -> Vec<f64> {
    let rows = matrix.len();
    let cols = matrix.first().map_or(0, Vec::len);
    if rows == 0 {
        return vec![0.0; cols];
    }
    let mut means = vec![0.0; cols];
    for row in matrix {
        for (j, value) in row.iter().enumerate() {
            means[j] += value;
        }
    }
    for mean in &mut means {
        *mean /= rows as f64;
    }
    means
}

/// Sample covariance of an already-demeaned T×N matrix, with a ridge term.
///
/// Computes `RᵀR / max(1, T - 1)` and adds `max(ridge, 0.05 * |median
/// diagonal|)` to every diagonal entry to keep the matrix invertible and
/// reasonably conditioned.
pub fn covariance(matrix: &[Vec<f64>], ridge: f64) -> Vec<Vec<f64>> {
    let rows = matrix.len();
    let cols = matrix.first().map_or(0, Vec::len);
    let divisor = rows.saturating_sub(1).max(1) as f64;

    let mut sigma = vec![vec![0.0; cols]; cols];
    for row in matrix {
        for i in 0..cols {
            for j in i..cols {
                sigma[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..cols {
        for j in i..cols {
            sigma[i][j] /= divisor;
            sigma[j][i] = sigma[i][j];
        }
    }

    let lambda = ridge.max(0.05 * median_diagonal(&sigma).abs());
    for (i, row) in sigma.iter_mut().enumerate() {
        row[i] += lambda;
    }
    sigma
}

fn median_diagonal(sigma: &[Vec<f64>]) -> f64 {
    let mut diag: Vec<f64> = sigma.iter().enumerate().map(|(i, row)| row[i]).collect();
    if diag.is_empty() {
        return 0.0;
    }
    diag.sort_by(|a, b| a.total_cmp(b));
    diag[diag.len() / 2]
}

/// Select the sub-matrix of rows and columns named by `indices`.
pub fn submatrix(matrix: &[Vec<f64>], indices: &[usize]) -> Vec<Vec<f64>> {
    indices
        .iter()
        .map(|&i| indices.iter().map(|&j| matrix[i][j]).collect())
        .collect()
}

/// Select the entries of `vector` named by `indices`.
pub fn subvector(vector: &[f64], indices: &[usize]) -> Vec<f64> {
    indices.iter().map(|&i| vector[i]).collect()
}

/// Dense matrix-vector product.
pub fn mat_vec(matrix: &[Vec<f64>], vector: &[f64]) -> Vec<f64> {
    matrix
        .iter()
        .map(|row| row.iter().zip(vector).map(|(a, b)| a * b).sum())
        .collect()
}

/// Invert a square matrix by Gauss-Jordan elimination with partial pivoting.
///
/// Returns `None` when a pivot falls below 1e-10 (singular or nearly so).
/// Intended for the small dense covariance matrices this engine works with.
#[allow(clippy::needless_range_loop)]
pub fn invert_matrix(matrix: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = matrix.len();

    // Augmented matrix [A | I].
    let mut aug = vec![vec![0.0; 2 * n]; n];
    for i in 0..n {
        for j in 0..n {
            aug[i][j] = matrix[i][j];
        }
        aug[i][n + i] = 1.0;
    }

    // Forward elimination with partial pivoting.
    for col in 0..n {
        let mut max_row = col;
        for row in (col + 1)..n {
            if aug[row][col].abs() > aug[max_row][col].abs() {
                max_row = row;
            }
        }
        if max_row != col {
            aug.swap(col, max_row);
        }

        if aug[col][col].abs() < 1e-10 {
            return None;
        }

        for row in (col + 1)..n {
            let factor = aug[row][col] / aug[col][col];
            for j in col..(2 * n) {
                aug[row][j] -= factor * aug[col][j];
            }
        }
    }

    // Back substitution.
    for col in (0..n).rev() {
        let pivot = aug[col][col];
        for j in 0..(2 * n) {
            aug[col][j] /= pivot;
        }
        for row in 0..col {
            let factor = aug[row][col];
            for j in 0..(2 * n) {
                aug[row][j] -= factor * aug[col][j];
            }
        }
    }

    let mut inverse = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            inverse[i][j] = aug[i][n + j];
        }
    }
    Some(inverse)
}
