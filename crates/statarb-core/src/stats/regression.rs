use serde::{Deserialize, Serialize};

use crate::error::StatArbError;
use crate::StatArbResult;

use super::descriptive::mean;

/// Simple linear regression y = intercept + slope * x.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OlsFit {
    pub intercept: f64,
    pub slope: f64,
    /// y[i] - (intercept + slope * x[i])
    pub residuals: Vec<f64>,
}

/// Multiple regression fitted through the normal equations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeastSquaresFit {
    /// One coefficient per design column, in column order.
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    /// Sum of squared residuals
    pub ssr: f64,
    pub nobs: usize,
}

impl LeastSquaresFit {
    /// t-statistic of coefficient `i`. NaN when its standard error is zero.
    pub fn t_value(&self, i: usize) -> f64 {
        let se = self.std_errors[i];
        if se == 0.0 {
            f64::NAN
        } else {
            self.coefficients[i] / se
        }
    }

    /// Gaussian log-likelihood of the fit.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion: -2 llf + 2k.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.coefficients.len() as f64
    }
}

/// Regress `y` on `x` with an intercept.
pub fn ols_with_intercept(y: &[f64], x: &[f64]) -> StatArbResult<OlsFit> {
    if y.len() != x.len() {
        return Err(StatArbError::InvalidInput {
            field: "x".into(),
            reason: format!("length {} does not match y length {}", x.len(), y.len()),
        });
    }
    if y.len() < 2 {
        return Err(StatArbError::InsufficientData(
            "OLS needs at least 2 observations".into(),
        ));
    }

    let mean_x = mean(x);
    let mean_y = mean(y);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        sxy += dx * (yi - mean_y);
        sxx += dx * dx;
    }
    if sxx == 0.0 {
        return Err(StatArbError::DivisionByZero {
            context: "OLS slope: regressor has zero variance".into(),
        });
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let residuals = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| yi - (intercept + slope * xi))
        .collect();

    Ok(OlsFit {
        intercept,
        slope,
        residuals,
    })
}

/// Slope of `y` on `x` with no intercept: Σxy / Σx². None when Σx² = 0.
pub fn ols_through_origin(y: &[f64], x: &[f64]) -> Option<f64> {
    let sxx: f64 = x.iter().map(|v| v * v).sum();
    if sxx == 0.0 || y.len() != x.len() {
        return None;
    }
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    Some(sxy / sxx)
}

/// Ordinary least squares for a design matrix given row by row.
///
/// Solves (X'X) b = X'y by inverting X'X with Gauss-Jordan elimination and
/// takes standard errors from the diagonal of s² (X'X)^-1, s² = SSR / (n - k).
pub fn least_squares(design: &[Vec<f64>], y: &[f64]) -> StatArbResult<LeastSquaresFit> {
    let n = design.len();
    if n != y.len() {
        return Err(StatArbError::InvalidInput {
            field: "design".into(),
            reason: format!("{} rows for {} observations", n, y.len()),
        });
    }
    let k = design.first().map(|r| r.len()).unwrap_or(0);
    if k == 0 {
        return Err(StatArbError::InvalidInput {
            field: "design".into(),
            reason: "Design matrix has no columns".into(),
        });
    }
    if design.iter().any(|r| r.len() != k) {
        return Err(StatArbError::InvalidInput {
            field: "design".into(),
            reason: "Rows have differing column counts".into(),
        });
    }
    if n <= k {
        return Err(StatArbError::InsufficientData(format!(
            "{} observations for {} regressors",
            n, k
        )));
    }

    // X'X and X'y
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, yi) in design.iter().zip(y) {
        for i in 0..k {
            xty[i] += row[i] * yi;
            for j in i..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }

    let inv = mat_inverse(&xtx, k)?;

    let coefficients: Vec<f64> = (0..k)
        .map(|i| (0..k).map(|j| inv[i][j] * xty[j]).sum())
        .collect();

    let ssr: f64 = design
        .iter()
        .zip(y)
        .map(|(row, yi)| {
            let fitted: f64 = row.iter().zip(&coefficients).map(|(a, b)| a * b).sum();
            (yi - fitted) * (yi - fitted)
        })
        .sum();

    let sigma2 = ssr / (n - k) as f64;
    let std_errors = (0..k).map(|i| (sigma2 * inv[i][i]).max(0.0).sqrt()).collect();

    Ok(LeastSquaresFit {
        coefficients,
        std_errors,
        ssr,
        nobs: n,
    })
}

/// Gauss-Jordan inverse with partial pivoting.
fn mat_inverse(mat: &[Vec<f64>], n: usize) -> StatArbResult<Vec<Vec<f64>>> {
    let scale = mat
        .iter()
        .flat_map(|r| r.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let tolerance = if scale > 0.0 { scale * 1e-13 } else { 0.0 };

    // Build augmented matrix [mat | I]
    let mut aug: Vec<Vec<f64>> = Vec::with_capacity(n);
    for (i, src) in mat.iter().enumerate().take(n) {
        let mut row = Vec::with_capacity(2 * n);
        row.extend_from_slice(&src[..n]);
        row.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
        aug.push(row);
    }

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[col][col].abs();
        for (row, r) in aug.iter().enumerate().skip(col + 1) {
            let val = r[col].abs();
            if val > max_val {
                max_val = val;
                max_row = row;
            }
        }
        if max_val <= tolerance || !max_val.is_finite() {
            return Err(StatArbError::DivisionByZero {
                context: "least squares: design matrix is singular".into(),
            });
        }
        if max_row != col {
            aug.swap(max_row, col);
        }

        let pivot = aug[col][col];
        for v in aug[col].iter_mut() {
            *v /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..(2 * n) {
                let val = aug[col][j] * factor;
                aug[row][j] -= val;
            }
        }
    }

    Ok(aug.into_iter().map(|row| row[n..].to_vec()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ols_with_intercept_exact_line() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [5.0, 7.0, 9.0, 11.0];
        let fit = ols_with_intercept(&y, &x).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 3.0).abs() < 1e-12);
        assert!(fit.residuals.iter().all(|r| r.abs() < 1e-12));
    }

    #[test]
    fn test_ols_with_intercept_errors() {
        assert!(ols_with_intercept(&[1.0, 2.0], &[1.0]).is_err());
        assert!(ols_with_intercept(&[1.0], &[1.0]).is_err());
        assert!(matches!(
            ols_with_intercept(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]),
            Err(StatArbError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_ols_through_origin() {
        assert_eq!(ols_through_origin(&[2.0, 4.0, 6.0], &[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(ols_through_origin(&[1.0, 2.0], &[0.0, 0.0]), None);
    }

    #[test]
    fn test_least_squares_recovers_coefficients() {
        // y = 1 + 2*a - 3*b, exact
        let rows: Vec<(f64, f64)> = vec![
            (0.0, 1.0),
            (1.0, 0.0),
            (2.0, 3.0),
            (5.0, 1.0),
            (3.0, 4.0),
            (7.0, 2.0),
        ];
        let design: Vec<Vec<f64>> = rows.iter().map(|(a, b)| vec![1.0, *a, *b]).collect();
        let y: Vec<f64> = rows.iter().map(|(a, b)| 1.0 + 2.0 * a - 3.0 * b).collect();

        let fit = least_squares(&design, &y).unwrap();
        assert!((fit.coefficients[0] - 1.0).abs() < 1e-9);
        assert!((fit.coefficients[1] - 2.0).abs() < 1e-9);
        assert!((fit.coefficients[2] + 3.0).abs() < 1e-9);
        assert!(fit.ssr < 1e-12);
    }

    #[test]
    fn test_least_squares_matches_simple_ols() {
        let x = [1.0, 2.0, 4.0, 3.0, 6.0, 5.0];
        let y = [1.5, 2.9, 6.2, 4.1, 8.8, 7.7];
        let design: Vec<Vec<f64>> = x.iter().map(|v| vec![1.0, *v]).collect();
        let multi = least_squares(&design, &y).unwrap();
        let simple = ols_with_intercept(&y, &x).unwrap();
        assert!((multi.coefficients[0] - simple.intercept).abs() < 1e-9);
        assert!((multi.coefficients[1] - simple.slope).abs() < 1e-9);
        assert!(multi.std_errors.iter().all(|se| *se > 0.0));
    }

    #[test]
    fn test_least_squares_singular() {
        // second column duplicates the first
        let design = vec![
            vec![1.0, 1.0],
            vec![2.0, 2.0],
            vec![3.0, 3.0],
        ];
        assert!(matches!(
            least_squares(&design, &[1.0, 2.0, 3.0]),
            Err(StatArbError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_least_squares_needs_more_rows_than_columns() {
        let design = vec![vec![1.0, 2.0], vec![1.0, 3.0]];
        assert!(matches!(
            least_squares(&design, &[1.0, 2.0]),
            Err(StatArbError::InsufficientData(_))
        ));
    }
}
