//! Augmented Dickey-Fuller unit-root test (constant, no trend).
//!
//! Lag order is picked by AIC over 0..=max_lag on a common sample, then the
//! chosen lag is refitted on every available observation. p-values use the
//! MacKinnon (1994) response surface; critical values use the MacKinnon (2010)
//! finite-sample surfaces.

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;
use tracing::debug;

use crate::error::StatArbError;
use crate::StatArbResult;

use super::regression::least_squares;

// MacKinnon (1994), constant term, one variable.
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

// MacKinnon (2010), constant term, one variable: b0 + b1/n + b2/n² + b3/n³.
const CRIT_1PCT: [f64; 4] = [-3.43035, -6.5393, -16.786, -79.433];
const CRIT_5PCT: [f64; 4] = [-2.86154, -2.8903, -4.234, -40.04];
const CRIT_10PCT: [f64; 4] = [-2.56677, -1.5384, -2.809, 0.0];

/// Test statistic thresholds at the usual significance levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    pub one_pct: f64,
    pub five_pct: f64,
    pub ten_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdfResult {
    /// t-value of the lagged level coefficient
    pub statistic: f64,
    pub pvalue: f64,
    pub used_lag: usize,
    /// Observations in the final regression
    pub nobs: usize,
    pub critical_values: CriticalValues,
}

/// Run the ADF test on `series` with lag order chosen by AIC up to `max_lag`.
pub fn adf_test(series: &[f64], max_lag: usize) -> StatArbResult<AdfResult> {
    if series.iter().any(|v| !v.is_finite()) {
        return Err(StatArbError::InvalidInput {
            field: "series".into(),
            reason: "ADF input must be finite".into(),
        });
    }
    let (lo, hi) = series
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if series.is_empty() || lo == hi {
        return Err(StatArbError::InvalidInput {
            field: "series".into(),
            reason: "ADF input is constant".into(),
        });
    }
    let limit = series.len() as i64 / 2 - 2;
    if limit < max_lag as i64 {
        return Err(StatArbError::InsufficientData(format!(
            "max_lag {} needs at least {} observations, got {}",
            max_lag,
            2 * (max_lag + 2),
            series.len()
        )));
    }

    let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

    let best_lag = if max_lag == 0 {
        0
    } else {
        let common = diffs.len() - max_lag;
        let mut best: Option<(f64, usize)> = None;
        for lag in 0..=max_lag {
            let (design, y) = adf_design(series, &diffs, lag, common);
            let fit = least_squares(&design, &y)?;
            let aic = fit.aic();
            debug!(lag, aic, "ADF candidate lag");
            // strict comparison keeps the smallest lag on ties
            if best.map_or(true, |(b, _)| aic < b) {
                best = Some((aic, lag));
            }
        }
        best.map(|(_, lag)| lag).unwrap_or(0)
    };

    let nobs = diffs.len() - best_lag;
    let (design, y) = adf_design(series, &diffs, best_lag, nobs);
    let fit = least_squares(&design, &y)?;
    let statistic = fit.t_value(0);

    Ok(AdfResult {
        statistic,
        pvalue: mackinnon_pvalue(statistic),
        used_lag: best_lag,
        nobs,
        critical_values: mackinnon_critical_values(nobs),
    })
}

/// Rows for Δy_t on [y_{t-1}, Δy_{t-1}..Δy_{t-lag}, 1] over the last `nobs` diffs.
fn adf_design(series: &[f64], diffs: &[f64], lag: usize, nobs: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let start = diffs.len() - nobs;
    let mut design = Vec::with_capacity(nobs);
    let mut y = Vec::with_capacity(nobs);
    for t in start..diffs.len() {
        let mut row = Vec::with_capacity(lag + 2);
        // diffs[t] = series[t + 1] - series[t], so the lagged level is series[t]
        row.push(series[t]);
        row.extend((1..=lag).map(|i| diffs[t - i]));
        row.push(1.0);
        design.push(row);
        y.push(diffs[t]);
    }
    (design, y)
}

/// Approximate p-value of an ADF statistic (constant term, one variable).
pub fn mackinnon_pvalue(statistic: f64) -> f64 {
    if statistic.is_nan() {
        return f64::NAN;
    }
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }
    let value = if statistic <= TAU_STAR {
        polyval(&TAU_SMALL_P, statistic)
    } else {
        polyval(&TAU_LARGE_P, statistic)
    };
    normal_cdf(value)
}

/// Finite-sample critical values for a regression on `nobs` observations.
pub fn mackinnon_critical_values(nobs: usize) -> CriticalValues {
    let inv = 1.0 / nobs as f64;
    CriticalValues {
        one_pct: polyval(&CRIT_1PCT, inv),
        five_pct: polyval(&CRIT_5PCT, inv),
        ten_pct: polyval(&CRIT_10PCT, inv),
    }
}

/// c0 + c1 x + c2 x² + ...
fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_pvalue_reference_points() {
        assert!((mackinnon_pvalue(-2.86) - 0.050).abs() < 0.002);
        assert!((mackinnon_pvalue(-1.0) - 0.753).abs() < 0.005);
        assert_eq!(mackinnon_pvalue(3.0), 1.0);
        assert_eq!(mackinnon_pvalue(-20.0), 0.0);
    }

    #[test]
    fn test_pvalue_is_monotonic() {
        let mut prev = 0.0;
        let mut stat = -18.0;
        while stat < 2.7 {
            let p = mackinnon_pvalue(stat);
            assert!(p >= prev - 1e-9, "p-value fell at {}", stat);
            prev = p;
            stat += 0.05;
        }
    }

    #[test]
    fn test_critical_values_approach_asymptotic() {
        let cv = mackinnon_critical_values(100_000);
        assert!((cv.one_pct + 3.430).abs() < 1e-3);
        assert!((cv.five_pct + 2.862).abs() < 1e-3);
        assert!((cv.ten_pct + 2.567).abs() < 1e-3);

        let small = mackinnon_critical_values(50);
        assert!(small.one_pct < cv.one_pct);
        assert!(small.one_pct < small.five_pct && small.five_pct < small.ten_pct);
    }

    #[test]
    fn test_white_noise_is_stationary() {
        let mut rng = StdRng::seed_from_u64(7);
        let series: Vec<f64> = (0..250).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let result = adf_test(&series, 1).unwrap();
        assert!(result.statistic < -5.0);
        assert!(result.pvalue < 0.01);
        assert!(result.used_lag <= 1);
        assert_eq!(result.nobs, 249 - result.used_lag);
    }

    #[test]
    fn test_drifting_walk_is_not_stationary() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut level = 100.0;
        let series: Vec<f64> = (0..250)
            .map(|_| {
                level += 1.0 + rng.gen_range(-0.5..0.5);
                level
            })
            .collect();
        let result = adf_test(&series, 1).unwrap();
        assert!(result.pvalue > 0.05, "pvalue {}", result.pvalue);
    }

    #[test]
    fn test_constant_series_rejected() {
        assert!(matches!(
            adf_test(&[5.0; 20], 1),
            Err(StatArbError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_short_series_rejected() {
        // 5 / 2 - 2 = 0 < 1
        assert!(matches!(
            adf_test(&[1.0, 2.0, 1.5, 2.5, 1.0], 1),
            Err(StatArbError::InsufficientData(_))
        ));
    }
}
