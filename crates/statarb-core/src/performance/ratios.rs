//! Return-series ratios. Degenerate inputs map to 0 or +inf, never errors.

use crate::stats::{mean, sample_std};

/// mean * periods_per_year
pub fn annual_return(returns: &[f64], periods_per_year: f64) -> f64 {
    mean(returns) * periods_per_year
}

/// sample std * sqrt(periods_per_year)
pub fn annual_volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    sample_std(returns) * periods_per_year.sqrt()
}

/// Annualised Sharpe ratio: sqrt(ppy) * mean(r - rf/ppy) / std(r).
///
/// 0 for fewer than 2 returns or zero volatility.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    let std = sample_std(returns);
    if returns.len() < 2 || std == 0.0 {
        return 0.0;
    }
    let rf = risk_free_rate / periods_per_year;
    let excess = mean(returns) - rf;
    periods_per_year.sqrt() * excess / std
}

/// Annualised Sortino ratio, using the std of negative excess returns.
///
/// Without a usable downside deviation (fewer than 2 losing periods or zero
/// spread among them) the ratio is +inf when the mean excess return is
/// positive and 0 otherwise.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let rf = risk_free_rate / periods_per_year;
    let excess: Vec<f64> = returns.iter().map(|r| r - rf).collect();
    let mean_excess = mean(&excess);
    let downside: Vec<f64> = excess.iter().copied().filter(|r| *r < 0.0).collect();
    let downside_std = sample_std(&downside);

    if downside.len() < 2 || downside_std == 0.0 {
        return if mean_excess > 0.0 { f64::INFINITY } else { 0.0 };
    }
    periods_per_year.sqrt() * mean_excess / downside_std
}

/// Annualised mean return over |max drawdown|.
pub fn calmar_ratio(returns: &[f64], max_drawdown: f64, periods_per_year: f64) -> f64 {
    let annual = annual_return(returns, periods_per_year);
    let dd = max_drawdown.abs();
    if dd == 0.0 {
        return if annual > 0.0 { f64::INFINITY } else { 0.0 };
    }
    annual / dd
}

/// Fraction of strictly positive returns.
pub fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64
}

/// Gross profit over gross loss.
pub fn profit_factor(returns: &[f64]) -> f64 {
    let gains: f64 = returns.iter().filter(|r| **r > 0.0).sum();
    let losses: f64 = returns.iter().filter(|r| **r < 0.0).sum::<f64>().abs();
    if losses == 0.0 {
        return if gains > 0.0 { f64::INFINITY } else { 0.0 };
    }
    gains / losses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharpe() {
        let r = [0.01, -0.005, 0.02, 0.0, 0.015];
        let expected = 252f64.sqrt() * mean(&r) / sample_std(&r);
        assert!((sharpe_ratio(&r, 0.0, 252.0) - expected).abs() < 1e-12);

        // risk-free lowers the numerator only
        let with_rf = 252f64.sqrt() * (mean(&r) - 0.0252 / 252.0) / sample_std(&r);
        assert!((sharpe_ratio(&r, 0.0252, 252.0) - with_rf).abs() < 1e-12);
    }

    #[test]
    fn test_sharpe_degenerate() {
        assert_eq!(sharpe_ratio(&[], 0.0, 252.0), 0.0);
        assert_eq!(sharpe_ratio(&[0.01], 0.0, 252.0), 0.0);
        assert_eq!(sharpe_ratio(&[0.01, 0.01, 0.01], 0.0, 252.0), 0.0);
    }

    #[test]
    fn test_sortino() {
        let r = [0.02, -0.01, 0.03, -0.02, 0.01];
        let downside = [-0.01, -0.02];
        let expected = 252f64.sqrt() * mean(&r) / sample_std(&downside);
        assert!((sortino_ratio(&r, 0.0, 252.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_sortino_without_losses() {
        assert_eq!(sortino_ratio(&[0.01, 0.02], 0.0, 252.0), f64::INFINITY);
        assert_eq!(sortino_ratio(&[0.0, 0.0], 0.0, 252.0), 0.0);
        assert_eq!(sortino_ratio(&[], 0.0, 252.0), 0.0);
        // a single loss has no sample deviation
        assert_eq!(sortino_ratio(&[0.05, -0.01], 0.0, 252.0), f64::INFINITY);
    }

    #[test]
    fn test_calmar() {
        let r = [0.001, 0.002];
        assert!((calmar_ratio(&r, -0.1, 252.0) - 0.0015 * 252.0 / 0.1).abs() < 1e-12);
        assert_eq!(calmar_ratio(&r, 0.0, 252.0), f64::INFINITY);
        assert_eq!(calmar_ratio(&[-0.001], 0.0, 252.0), 0.0);
    }

    #[test]
    fn test_win_rate_and_profit_factor() {
        let r = [0.02, -0.01, 0.0, 0.03, -0.02];
        assert!((win_rate(&r) - 0.4).abs() < 1e-12);
        assert!((profit_factor(&r) - 0.05 / 0.03).abs() < 1e-12);
        assert_eq!(win_rate(&[]), 0.0);
        assert_eq!(profit_factor(&[0.01]), f64::INFINITY);
        assert_eq!(profit_factor(&[0.0]), 0.0);
    }
}
