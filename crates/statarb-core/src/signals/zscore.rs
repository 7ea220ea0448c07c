use crate::stats::{mean, sample_std};

/// Standardised spread.
///
/// `lookback = None` uses expanding mean/std over all history to date,
/// `Some(w)` a trailing window of `w` observations. Undefined periods (window
/// not yet full, fewer than 2 points, zero std) are NaN.
pub fn zscore(spread: &[f64], lookback: Option<usize>) -> Vec<f64> {
    match lookback {
        None => expanding(spread),
        Some(window) => rolling(spread, window),
    }
}

fn standardise(value: f64, m: f64, std: f64) -> f64 {
    if std > 0.0 && std.is_finite() {
        (value - m) / std
    } else {
        f64::NAN
    }
}

fn rolling(spread: &[f64], window: usize) -> Vec<f64> {
    if window < 2 {
        return vec![f64::NAN; spread.len()];
    }
    (0..spread.len())
        .map(|t| {
            if t + 1 < window {
                return f64::NAN;
            }
            let slice = &spread[t + 1 - window..=t];
            standardise(spread[t], mean(slice), sample_std(slice))
        })
        .collect()
}

/// Welford running mean/variance.
fn expanding(spread: &[f64]) -> Vec<f64> {
    let mut count = 0.0;
    let mut m = 0.0;
    let mut m2 = 0.0;
    spread
        .iter()
        .map(|&x| {
            count += 1.0;
            let delta = x - m;
            m += delta / count;
            m2 += delta * (x - m);
            if count < 2.0 {
                return f64::NAN;
            }
            let std = (m2 / (count - 1.0)).max(0.0).sqrt();
            standardise(x, m, std)
        })
        .collect()
}
