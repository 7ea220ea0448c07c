use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::StatArbError;
use crate::types::{Money, PriceTable};
use crate::StatArbResult;

use super::generator::{Position, SignalTable};

/// Share holdings for both legs at one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    pub timestamp: NaiveDate,
    pub position: Position,
    /// Negative for a short leg
    pub symbol1_shares: Decimal,
    pub symbol2_shares: Decimal,
}

/// Equal-dollar sizing: half of `capital` per leg whenever a position is held.
///
/// Long spread buys symbol2 and sells symbol1; short spread does the opposite.
pub fn position_sizes(
    signals: &SignalTable,
    prices: &PriceTable,
    symbol1: &str,
    symbol2: &str,
    capital: Money,
) -> StatArbResult<Vec<PositionSize>> {
    let p1 = prices.require_column(symbol1)?;
    let p2 = prices.require_column(symbol2)?;
    if signals.timestamps() != prices.index() {
        return Err(StatArbError::InvalidInput {
            field: "signals".into(),
            reason: "Signal timestamps must match the price index".into(),
        });
    }

    let leg_capital = capital / Decimal::TWO;

    signals
        .records
        .iter()
        .zip(p1.iter().zip(p2))
        .map(|(record, (price1, price2))| {
            let (symbol1_shares, symbol2_shares) = match record.position {
                Position::Flat => (Decimal::ZERO, Decimal::ZERO),
                Position::Long => (
                    -shares(leg_capital, *price1, symbol1)?,
                    shares(leg_capital, *price2, symbol2)?,
                ),
                Position::Short => (
                    shares(leg_capital, *price1, symbol1)?,
                    -shares(leg_capital, *price2, symbol2)?,
                ),
            };
            Ok(PositionSize {
                timestamp: record.timestamp,
                position: record.position,
                symbol1_shares,
                symbol2_shares,
            })
        })
        .collect()
}

fn shares(leg_capital: Money, price: f64, symbol: &str) -> StatArbResult<Decimal> {
    let price = Decimal::try_from(price).map_err(|e| StatArbError::InvalidInput {
        field: format!("prices.{}", symbol),
        reason: e.to_string(),
    })?;
    leg_capital
        .checked_div(price)
        .ok_or_else(|| StatArbError::DivisionByZero {
            context: format!("position size for {}", symbol),
        })
}
