use serde::{Deserialize, Serialize};

use crate::stats::{adf_test, ols_with_intercept, CriticalValues};
use crate::StatArbResult;

/// Maximum ADF lag used on the regression residuals.
pub const COINTEGRATION_MAX_LAG: usize = 1;

/// Engle-Granger two-step result for y regressed on x.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CointegrationTest {
    /// ADF statistic of the residuals (more negative = stronger mean reversion)
    pub statistic: f64,
    pub pvalue: f64,
    pub critical_values: CriticalValues,
    pub used_lag: usize,
    /// OLS slope of y on x
    pub hedge_ratio: f64,
    pub intercept: f64,
}

/// Regress `y` on `x` with an intercept and test the residuals for a unit root.
pub fn cointegration_test(x: &[f64], y: &[f64]) -> StatArbResult<CointegrationTest> {
    let fit = ols_with_intercept(y, x)?;
    let adf = adf_test(&fit.residuals, COINTEGRATION_MAX_LAG)?;

    Ok(CointegrationTest {
        statistic: adf.statistic,
        pvalue: adf.pvalue,
        critical_values: adf.critical_values,
        used_lag: adf.used_lag,
        hedge_ratio: fit.slope,
        intercept: fit.intercept,
    })
}

/// spread[t] = price2[t] - hedge_ratio * price1[t]
pub fn compute_spread(price1: &[f64], price2: &[f64], hedge_ratio: f64) -> Vec<f64> {
    price1
        .iter()
        .zip(price2)
        .map(|(p1, p2)| p2 - hedge_ratio * p1)
        .collect()
}
