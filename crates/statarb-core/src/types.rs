use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::StatArbError;
use crate::StatArbResult;

/// Monetary amounts (capital, final value, cost drag in currency).
pub type Money = Decimal;

/// Rates expressed as decimals (0.001 = 0.1%). Never as percentages.
pub type Rate = f64;

/// One symbol's close prices, aligned to the owning table's index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub prices: Vec<f64>,
}

/// Wire form of a [`PriceTable`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTableData {
    pub index: Vec<NaiveDate>,
    pub series: Vec<PriceSeries>,
}

/// Aligned close prices for a universe of symbols.
///
/// Every column has exactly one finite, strictly positive price per
/// timestamp, and the index is strictly increasing. Symbol order is kept as
/// given; pair scans walk symbols in this order, so the earlier symbol of a
/// pair is always `symbol1` (the regressor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PriceTableData", into = "PriceTableData")]
pub struct PriceTable {
    index: Vec<NaiveDate>,
    symbols: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl PriceTable {
    /// Build a table from already-aligned, gap-free series.
    pub fn new(index: Vec<NaiveDate>, series: Vec<PriceSeries>) -> StatArbResult<Self> {
        if series.is_empty() {
            return Err(StatArbError::InvalidInput {
                field: "series".into(),
                reason: "At least one symbol is required".into(),
            });
        }
        if index.windows(2).any(|w| w[1] <= w[0]) {
            return Err(StatArbError::InvalidInput {
                field: "index".into(),
                reason: "Timestamps must be strictly increasing".into(),
            });
        }

        let mut symbols: Vec<String> = Vec::with_capacity(series.len());
        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(series.len());
        for s in series {
            if symbols.contains(&s.symbol) {
                return Err(StatArbError::InvalidInput {
                    field: "series".into(),
                    reason: format!("Duplicate symbol '{}'", s.symbol),
                });
            }
            if s.prices.len() != index.len() {
                return Err(StatArbError::InvalidInput {
                    field: format!("series.{}", s.symbol),
                    reason: format!(
                        "{} prices for {} timestamps; columns must be aligned to the index",
                        s.prices.len(),
                        index.len()
                    ),
                });
            }
            if let Some(bad) = s.prices.iter().find(|p| !p.is_finite() || **p <= 0.0) {
                return Err(StatArbError::InvalidInput {
                    field: format!("series.{}", s.symbol),
                    reason: format!("Prices must be finite and positive, got {}", bad),
                });
            }
            symbols.push(s.symbol);
            columns.push(s.prices);
        }

        Ok(Self {
            index,
            symbols,
            columns,
        })
    }

    /// Build a table from raw columns with gaps, dropping every row where any
    /// symbol is missing or non-finite.
    pub fn from_observations(
        index: Vec<NaiveDate>,
        observations: Vec<(String, Vec<Option<f64>>)>,
    ) -> StatArbResult<Self> {
        for (symbol, values) in &observations {
            if values.len() != index.len() {
                return Err(StatArbError::InvalidInput {
                    field: format!("observations.{}", symbol),
                    reason: format!(
                        "{} observations for {} timestamps",
                        values.len(),
                        index.len()
                    ),
                });
            }
        }

        let keep: Vec<bool> = (0..index.len())
            .map(|row| {
                observations
                    .iter()
                    .all(|(_, values)| matches!(values[row], Some(v) if v.is_finite()))
            })
            .collect();

        let kept_index: Vec<NaiveDate> = index
            .iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(d, _)| *d)
            .collect();

        let series = observations
            .into_iter()
            .map(|(symbol, values)| PriceSeries {
                symbol,
                prices: values
                    .into_iter()
                    .zip(&keep)
                    .filter(|(_, k)| **k)
                    .filter_map(|(v, _)| v)
                    .collect(),
            })
            .collect();

        Self::new(kept_index, series)
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Number of timestamps.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|i| self.columns[i].as_slice())
    }

    /// Like [`PriceTable::column`] but an unknown symbol is an error.
    pub fn require_column(&self, symbol: &str) -> StatArbResult<&[f64]> {
        self.column(symbol)
            .ok_or_else(|| StatArbError::UnknownSymbol(symbol.to_string()))
    }

    /// Simple (percentage) returns, one per period t >= 1.
    pub fn simple_returns(&self, symbol: &str) -> StatArbResult<Vec<f64>> {
        let prices = self.require_column(symbol)?;
        Ok(prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect())
    }
}

impl TryFrom<PriceTableData> for PriceTable {
    type Error = StatArbError;

    fn try_from(data: PriceTableData) -> Result<Self, Self::Error> {
        PriceTable::new(data.index, data.series)
    }
}

impl From<PriceTable> for PriceTableData {
    fn from(table: PriceTable) -> Self {
        PriceTableData {
            index: table.index,
            series: table
                .symbols
                .into_iter()
                .zip(table.columns)
                .map(|(symbol, prices)| PriceSeries { symbol, prices })
                .collect(),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}
