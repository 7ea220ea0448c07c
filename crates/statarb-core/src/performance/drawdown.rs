use serde::{Deserialize, Serialize};

use crate::error::StatArbError;
use crate::StatArbResult;

/// Deepest peak-to-trough decline of an equity curve, by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownInfo {
    /// Fraction of the peak, <= 0
    pub max_drawdown: f64,
    pub peak_index: usize,
    pub trough_index: usize,
    /// First index at or after the trough back at the peak value
    pub recovery_index: Option<usize>,
    pub peak_value: f64,
    pub trough_value: f64,
}

/// Maximum drawdown of `values`.
///
/// The trough is the first occurrence of the most negative drawdown. The peak
/// is the last index up to the trough whose value equals the running maximum
/// there. Recovery is the first index from the trough on that regains the
/// peak value; a curve that never falls recovers at index 0.
pub fn max_drawdown(values: &[f64]) -> StatArbResult<DrawdownInfo> {
    if values.is_empty() {
        return Err(StatArbError::InsufficientData(
            "Drawdown needs at least one value".into(),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(StatArbError::InvalidInput {
            field: "values".into(),
            reason: "Equity values must be finite".into(),
        });
    }

    let mut running_max = f64::NEG_INFINITY;
    let mut maxima = Vec::with_capacity(values.len());
    let mut drawdowns = Vec::with_capacity(values.len());
    for v in values {
        running_max = running_max.max(*v);
        if running_max <= 0.0 {
            return Err(StatArbError::DivisionByZero {
                context: "drawdown: running maximum is not positive".into(),
            });
        }
        maxima.push(running_max);
        drawdowns.push((v - running_max) / running_max);
    }

    let (trough_index, max_drawdown) = drawdowns
        .iter()
        .copied()
        .enumerate()
        .fold((0, 0.0), |(bi, bd), (i, d)| if d < bd { (i, d) } else { (bi, bd) });

    let peak_value = maxima[trough_index];
    let peak_index = (0..=trough_index)
        .rev()
        .find(|&i| values[i] == peak_value)
        .unwrap_or(0);

    // with no drawdown the trough itself is at the peak, so recovery is immediate
    let recovery_index = (trough_index..values.len()).find(|&i| values[i] >= peak_value);

    Ok(DrawdownInfo {
        max_drawdown,
        peak_index,
        trough_index,
        recovery_index,
        peak_value,
        trough_value: values[trough_index],
    })
}
