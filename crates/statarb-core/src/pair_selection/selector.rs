//! Pair scans over a price table.
//!
//! Every unordered pair of symbols is tested in table order: Pearson
//! correlation first, then the Engle-Granger test on the survivors. A scan is
//! parameterised by a [`SelectionLevel`]; [`PairSelector::select_best_pair`]
//! walks the strict level and then the configured fallback levels until one
//! of them yields a candidate.

use chrono::NaiveDate;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::StatArbError;
use crate::stats::{pearson_correlation, CriticalValues};
use crate::types::PriceTable;
use crate::StatArbResult;

use super::cointegration::{cointegration_test, compute_spread};
use super::half_life::spread_statistics;

/// Tested pairs reported when a strict scan accepts nothing.
const DIAGNOSTIC_PAIRS: usize = 5;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// One step of the fallback cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackLevel {
    pub name: String,
    pub min_correlation: f64,
    pub max_pvalue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Strict cointegration acceptance: p-value must be below this
    #[serde(default = "default_pvalue_threshold")]
    pub pvalue_threshold: f64,

    /// Minimum |correlation| for the strict scan
    #[serde(default = "default_min_correlation")]
    pub min_correlation: f64,

    /// Try the fallback levels when the strict scan finds nothing
    #[serde(default = "default_use_fallback")]
    pub use_fallback: bool,

    /// Upper bound on the half-life (periods) for correlation-based candidates
    #[serde(default = "default_max_half_life")]
    pub max_half_life: f64,

    /// Fallback levels, tried in order
    #[serde(default = "default_fallback_levels")]
    pub fallback_levels: Vec<FallbackLevel>,
}

fn default_pvalue_threshold() -> f64 {
    0.05
}
fn default_min_correlation() -> f64 {
    0.7
}
fn default_use_fallback() -> bool {
    true
}
fn default_max_half_life() -> f64 {
    252.0 // roughly one trading year
}
fn default_fallback_levels() -> Vec<FallbackLevel> {
    vec![
        FallbackLevel {
            name: "lenient".into(),
            min_correlation: 0.7,
            max_pvalue: 0.20,
        },
        FallbackLevel {
            name: "more lenient".into(),
            min_correlation: 0.6,
            max_pvalue: 0.30,
        },
    ]
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            pvalue_threshold: default_pvalue_threshold(),
            min_correlation: default_min_correlation(),
            use_fallback: default_use_fallback(),
            max_half_life: default_max_half_life(),
            fallback_levels: default_fallback_levels(),
        }
    }
}

fn check_unit_interval(field: &str, value: f64) -> StatArbResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(StatArbError::InvalidInput {
            field: field.into(),
            reason: format!("must be between 0 and 1, got {}", value),
        });
    }
    Ok(())
}

impl SelectorConfig {
    pub fn validate(&self) -> StatArbResult<()> {
        check_unit_interval("pvalue_threshold", self.pvalue_threshold)?;
        check_unit_interval("min_correlation", self.min_correlation)?;
        if self.max_half_life.is_nan() || self.max_half_life <= 0.0 {
            return Err(StatArbError::InvalidInput {
                field: "max_half_life".into(),
                reason: "must be positive".into(),
            });
        }
        for level in &self.fallback_levels {
            check_unit_interval(
                &format!("fallback_levels.{}.min_correlation", level.name),
                level.min_correlation,
            )?;
            check_unit_interval(
                &format!("fallback_levels.{}.max_pvalue", level.name),
                level.max_pvalue,
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

/// How accepted candidates are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ranking {
    /// Ascending cointegration p-value
    PValue,
    /// Descending |correlation|, then ascending p-value
    Correlation,
}

/// Acceptance rules for one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionLevel {
    pub name: String,
    pub min_correlation: f64,
    /// Candidates need a p-value strictly below this
    pub max_pvalue: f64,
    /// When set, candidates need 0 < half_life < bound
    pub max_half_life: Option<f64>,
    pub ranking: Ranking,
}

impl SelectionLevel {
    pub fn strict(min_correlation: f64, pvalue_threshold: f64) -> Self {
        Self {
            name: "strict".into(),
            min_correlation,
            max_pvalue: pvalue_threshold,
            max_half_life: None,
            ranking: Ranking::PValue,
        }
    }

    pub fn correlation_based(
        name: impl Into<String>,
        min_correlation: f64,
        max_pvalue: f64,
        max_half_life: f64,
    ) -> Self {
        Self {
            name: name.into(),
            min_correlation,
            max_pvalue,
            max_half_life: Some(max_half_life),
            ranking: Ranking::Correlation,
        }
    }

    fn accepts(&self, candidate: &PairCandidate) -> bool {
        // NaN p-values never pass
        let significant = candidate.cointegration_pvalue < self.max_pvalue;
        if !significant {
            return false;
        }
        match self.max_half_life {
            Some(bound) => candidate.half_life > 0.0 && candidate.half_life < bound,
            None => true,
        }
    }

    fn describe(&self) -> String {
        format!(
            "{} (min_correlation {}, max_pvalue {})",
            self.name, self.min_correlation, self.max_pvalue
        )
    }
}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// A tested pair together with its hedge ratio, spread and spread statistics.
///
/// `spread[t] = price2[t] - hedge_ratio * price1[t]`, aligned to `index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCandidate {
    pub symbol1: String,
    pub symbol2: String,
    /// Pearson correlation of the two price series
    pub correlation: f64,
    /// Engle-Granger ADF statistic
    pub cointegration_score: f64,
    pub cointegration_pvalue: f64,
    pub critical_values: CriticalValues,
    /// OLS slope of symbol2 on symbol1
    pub hedge_ratio: f64,
    pub intercept: f64,
    pub index: Vec<NaiveDate>,
    pub spread: Vec<f64>,
    pub spread_mean: f64,
    pub spread_std: f64,
    pub min_zscore: f64,
    pub max_zscore: f64,
    /// Periods; infinite when the spread does not mean-revert
    pub half_life: f64,
    /// Name of the level that accepted the pair
    pub selection_level: String,
}

impl PairCandidate {
    pub fn label(&self) -> String {
        format!("{}-{}", self.symbol1, self.symbol2)
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PairSelector {
    config: SelectorConfig,
}

impl PairSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Pairs whose cointegration p-value is below `pvalue_threshold`, best first.
    pub fn find_cointegrated_pairs(
        &self,
        prices: &PriceTable,
        min_correlation: f64,
    ) -> Vec<PairCandidate> {
        let level = SelectionLevel::strict(min_correlation, self.config.pvalue_threshold);
        self.scan(prices, &level)
    }

    /// Lenient scan: looser p-value bound plus a half-life sanity filter.
    pub fn find_correlation_based_pairs(
        &self,
        prices: &PriceTable,
        min_correlation: f64,
        max_pvalue: f64,
    ) -> Vec<PairCandidate> {
        let level = SelectionLevel::correlation_based(
            "correlation-based",
            min_correlation,
            max_pvalue,
            self.config.max_half_life,
        );
        self.scan(prices, &level)
    }

    /// Strict scan first, then each fallback level in order. Returns the
    /// top-ranked candidate of the first level that accepts anything.
    pub fn select_best_pair(
        &self,
        prices: &PriceTable,
        min_correlation: f64,
        use_fallback: bool,
    ) -> StatArbResult<PairCandidate> {
        if prices.symbols().len() < 2 {
            return Err(StatArbError::InvalidInput {
                field: "prices".into(),
                reason: "Pair selection needs at least two symbols".into(),
            });
        }

        let mut attempted = Vec::new();
        for level in self.levels(min_correlation, use_fallback) {
            attempted.push(level.describe());
            if let Some(best) = self.scan(prices, &level).into_iter().next() {
                info!(
                    pair = best.label(),
                    level = %level.name,
                    pvalue = format!("{:.4}", best.cointegration_pvalue),
                    correlation = format!("{:.3}", best.correlation),
                    half_life = format!("{:.2}", best.half_life),
                    "Selected best pair"
                );
                return Ok(best);
            }
            info!(level = %level.name, "No pairs accepted at this level");
        }

        Err(StatArbError::NoSuitablePair {
            attempted: attempted.join("; "),
        })
    }

    /// Shorthand for [`PairSelector::select_best_pair`] with the configured
    /// correlation floor and fallback switch.
    pub fn select(&self, prices: &PriceTable) -> StatArbResult<PairCandidate> {
        self.select_best_pair(prices, self.config.min_correlation, self.config.use_fallback)
    }

    /// The cascade for one selection: strict level, then fallbacks if enabled.
    pub fn levels(&self, min_correlation: f64, use_fallback: bool) -> Vec<SelectionLevel> {
        let mut levels = vec![SelectionLevel::strict(
            min_correlation,
            self.config.pvalue_threshold,
        )];
        if use_fallback {
            levels.extend(self.config.fallback_levels.iter().map(|f| {
                SelectionLevel::correlation_based(
                    f.name.clone(),
                    f.min_correlation,
                    f.max_pvalue,
                    self.config.max_half_life,
                )
            }));
        }
        levels
    }

    /// Run one level over every unordered pair and rank the accepted ones.
    pub fn scan(&self, prices: &PriceTable, level: &SelectionLevel) -> Vec<PairCandidate> {
        let n = prices.symbols().len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();

        info!(
            level = %level.name,
            pairs = pairs.len(),
            min_corr = level.min_correlation,
            max_pvalue = level.max_pvalue,
            "Scanning pairs"
        );

        #[cfg(feature = "parallel")]
        let tested: Vec<Option<PairCandidate>> = pairs
            .par_iter()
            .map(|&(i, j)| test_pair(prices, i, j, level))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let tested: Vec<Option<PairCandidate>> = pairs
            .iter()
            .map(|&(i, j)| test_pair(prices, i, j, level))
            .collect();

        let tested: Vec<PairCandidate> = tested.into_iter().flatten().collect();

        let mut accepted: Vec<PairCandidate> = tested
            .iter()
            .filter(|c| {
                let ok = level.accepts(c);
                if !ok {
                    debug!(
                        pair = c.label(),
                        pvalue = c.cointegration_pvalue,
                        half_life = c.half_life,
                        "Rejected"
                    );
                }
                ok
            })
            .cloned()
            .collect();

        // stable sorts keep scan order on ties
        match level.ranking {
            Ranking::PValue => accepted.sort_by(|a, b| {
                a.cointegration_pvalue.total_cmp(&b.cointegration_pvalue)
            }),
            Ranking::Correlation => accepted.sort_by(|a, b| {
                b.correlation
                    .abs()
                    .total_cmp(&a.correlation.abs())
                    .then(a.cointegration_pvalue.total_cmp(&b.cointegration_pvalue))
            }),
        }

        for c in &accepted {
            info!(
                pair = c.label(),
                pvalue = format!("{:.4}", c.cointegration_pvalue),
                correlation = format!("{:.3}", c.correlation),
                half_life = format!("{:.1}", c.half_life),
                "Candidate pair found"
            );
        }

        if accepted.is_empty() && level.ranking == Ranking::PValue {
            log_diagnostics(tested);
        }

        info!(level = %level.name, accepted = accepted.len(), "Scan complete");
        accepted
    }
}

/// Correlation gate plus cointegration test for one pair. None when the pair
/// is filtered out or its test fails.
fn test_pair(
    prices: &PriceTable,
    i: usize,
    j: usize,
    level: &SelectionLevel,
) -> Option<PairCandidate> {
    let symbol1 = &prices.symbols()[i];
    let symbol2 = &prices.symbols()[j];
    let pair = format!("{}-{}", symbol1, symbol2);
    let p1 = prices.column(symbol1)?;
    let p2 = prices.column(symbol2)?;

    let Some(correlation) = pearson_correlation(p1, p2) else {
        debug!(pair = %pair, "Correlation undefined");
        return None;
    };
    if correlation.abs() < level.min_correlation {
        debug!(pair = %pair, corr = correlation, "Correlation too low");
        return None;
    }

    let test = match cointegration_test(p1, p2) {
        Ok(t) => t,
        Err(e) => {
            warn!(pair = %pair, error = %e, "Cointegration test failed, skipping pair");
            return None;
        }
    };

    let spread = compute_spread(p1, p2, test.hedge_ratio);
    let stats = spread_statistics(&spread);

    Some(PairCandidate {
        symbol1: symbol1.clone(),
        symbol2: symbol2.clone(),
        correlation,
        cointegration_score: test.statistic,
        cointegration_pvalue: test.pvalue,
        critical_values: test.critical_values,
        hedge_ratio: test.hedge_ratio,
        intercept: test.intercept,
        index: prices.index().to_vec(),
        spread,
        spread_mean: stats.mean,
        spread_std: stats.std,
        min_zscore: stats.min_zscore,
        max_zscore: stats.max_zscore,
        half_life: stats.half_life,
        selection_level: level.name.clone(),
    })
}

fn log_diagnostics(mut tested: Vec<PairCandidate>) {
    if tested.is_empty() {
        info!("No pairs passed the correlation filter");
        return;
    }
    tested.sort_by(|a, b| a.cointegration_pvalue.total_cmp(&b.cointegration_pvalue));
    for c in tested.iter().take(DIAGNOSTIC_PAIRS) {
        info!(
            pair = c.label(),
            correlation = format!("{:.3}", c.correlation),
            pvalue = format!("{:.4}", c.cointegration_pvalue),
            "Closest tested pair"
        );
    }
}
