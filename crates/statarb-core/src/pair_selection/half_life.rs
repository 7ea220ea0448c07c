use serde::{Deserialize, Serialize};

use crate::stats::{mean, ols_through_origin, sample_std};

/// Summary of a spread series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadStatistics {
    pub mean: f64,
    /// Sample standard deviation
    pub std: f64,
    /// Extremes of (spread - mean) / std over the full sample; 0 when std is 0
    pub min_zscore: f64,
    pub max_zscore: f64,
    pub half_life: f64,
}

/// Mean-reversion half-life in periods.
///
/// Regresses Δs_t on s_{t-1} with no intercept to get θ, then returns
/// -ln(2) / θ. Infinite when θ >= 0, when fewer than 2 finite lag/diff pairs
/// exist, or when the lagged values are all zero.
pub fn half_life(spread: &[f64]) -> f64 {
    let (lags, diffs): (Vec<f64>, Vec<f64>) = spread
        .windows(2)
        .map(|w| (w[0], w[1] - w[0]))
        .filter(|(lag, diff)| lag.is_finite() && diff.is_finite())
        .unzip();

    if lags.len() < 2 {
        return f64::INFINITY;
    }

    match ols_through_origin(&diffs, &lags) {
        Some(theta) if theta < 0.0 => -std::f64::consts::LN_2 / theta,
        _ => f64::INFINITY,
    }
}

pub fn spread_statistics(spread: &[f64]) -> SpreadStatistics {
    let m = mean(spread);
    let std = sample_std(spread);

    let (min_zscore, max_zscore) = if std > 0.0 {
        spread
            .iter()
            .map(|s| (s - m) / std)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), z| {
                (lo.min(z), hi.max(z))
            })
    } else {
        (0.0, 0.0)
    };

    SpreadStatistics {
        mean: m,
        std,
        min_zscore,
        max_zscore,
        half_life: half_life(spread),
    }
}
