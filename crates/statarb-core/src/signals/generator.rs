use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::StatArbError;
use crate::StatArbResult;

use super::zscore::zscore;

// ---------------------------------------------------------------------------
// Position state machine
// ---------------------------------------------------------------------------

/// Exposure to the spread. Serialises as -1 / 0 / +1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Position {
    /// Short the spread: sell symbol2, buy symbol1
    Short,
    #[default]
    Flat,
    /// Long the spread: buy symbol2, sell symbol1
    Long,
}

impl Position {
    pub fn as_i8(self) -> i8 {
        match self {
            Position::Short => -1,
            Position::Flat => 0,
            Position::Long => 1,
        }
    }

    pub fn is_flat(self) -> bool {
        self == Position::Flat
    }
}

impl From<Position> for i8 {
    fn from(p: Position) -> i8 {
        p.as_i8()
    }
}

impl TryFrom<i8> for Position {
    type Error = StatArbError;

    fn try_from(v: i8) -> Result<Self, Self::Error> {
        match v {
            -1 => Ok(Position::Short),
            0 => Ok(Position::Flat),
            1 => Ok(Position::Long),
            other => Err(StatArbError::InvalidInput {
                field: "position".into(),
                reason: format!("expected -1, 0 or 1, got {}", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    MeanReversion,
}

/// What happened on one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Hold,
    Enter(Position),
    Exit(ExitReason),
}

/// Machine state carried from one period to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalState {
    pub position: Position,
}

impl SignalState {
    /// Advance by one period. Comparisons are strict; a NaN z-score holds.
    pub fn step(self, z: f64, config: &SignalConfig) -> (SignalState, Transition) {
        if z.is_nan() {
            return (self, Transition::Hold);
        }
        let flat = SignalState {
            position: Position::Flat,
        };
        match self.position {
            Position::Flat => {
                if z < -config.entry_threshold {
                    let next = SignalState {
                        position: Position::Long,
                    };
                    (next, Transition::Enter(Position::Long))
                } else if z > config.entry_threshold {
                    let next = SignalState {
                        position: Position::Short,
                    };
                    (next, Transition::Enter(Position::Short))
                } else {
                    (self, Transition::Hold)
                }
            }
            Position::Long => {
                if z < -config.stop_loss {
                    (flat, Transition::Exit(ExitReason::StopLoss))
                } else if z > -config.exit_threshold {
                    (flat, Transition::Exit(ExitReason::MeanReversion))
                } else {
                    (self, Transition::Hold)
                }
            }
            Position::Short => {
                if z > config.stop_loss {
                    (flat, Transition::Exit(ExitReason::StopLoss))
                } else if z < config.exit_threshold {
                    (flat, Transition::Exit(ExitReason::MeanReversion))
                } else {
                    (self, Transition::Hold)
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// |z| beyond which a position is opened
    #[serde(default = "default_entry_threshold")]
    pub entry_threshold: f64,

    /// Positions close once z is back inside this band
    #[serde(default = "default_exit_threshold")]
    pub exit_threshold: f64,

    /// |z| beyond which an open position is stopped out
    #[serde(default = "default_stop_loss")]
    pub stop_loss: f64,

    /// Rolling window for the z-score; null for expanding statistics
    #[serde(default = "default_lookback_window")]
    pub lookback_window: Option<usize>,
}

fn default_entry_threshold() -> f64 {
    2.0
}
fn default_exit_threshold() -> f64 {
    0.5
}
fn default_stop_loss() -> f64 {
    3.0
}
fn default_lookback_window() -> Option<usize> {
    Some(60)
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            entry_threshold: default_entry_threshold(),
            exit_threshold: default_exit_threshold(),
            stop_loss: default_stop_loss(),
            lookback_window: default_lookback_window(),
        }
    }
}

impl SignalConfig {
    /// Reject unusable thresholds; return warnings for suspicious ones.
    pub fn validate(&self) -> StatArbResult<Vec<String>> {
        if !(self.entry_threshold.is_finite() && self.entry_threshold > 0.0) {
            return Err(StatArbError::InvalidInput {
                field: "entry_threshold".into(),
                reason: "Entry threshold must be positive".into(),
            });
        }
        if !(self.exit_threshold.is_finite() && self.exit_threshold >= 0.0) {
            return Err(StatArbError::InvalidInput {
                field: "exit_threshold".into(),
                reason: "Exit threshold must be non-negative".into(),
            });
        }
        if self.stop_loss.is_nan() {
            return Err(StatArbError::InvalidInput {
                field: "stop_loss".into(),
                reason: "Stop loss must be a number".into(),
            });
        }
        if let Some(w) = self.lookback_window {
            if w < 2 {
                return Err(StatArbError::InvalidInput {
                    field: "lookback_window".into(),
                    reason: format!("Window must hold at least 2 observations, got {}", w),
                });
            }
        }

        let mut warnings = Vec::new();
        if self.stop_loss <= self.entry_threshold {
            warnings.push(format!(
                "stop_loss {} does not exceed entry_threshold {}; positions may be stopped out on entry",
                self.stop_loss, self.entry_threshold
            ));
        }
        if self.exit_threshold >= self.entry_threshold {
            warnings.push(format!(
                "exit_threshold {} is not below entry_threshold {}; positions close on the next defined z-score",
                self.exit_threshold, self.entry_threshold
            ));
        }
        for w in &warnings {
            warn!(warning = %w, "Signal configuration");
        }
        Ok(warnings)
    }
}

// ---------------------------------------------------------------------------
// Signal table
// ---------------------------------------------------------------------------

/// State of the strategy at one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub timestamp: NaiveDate,
    pub spread: f64,
    /// NaN (null in JSON) while undefined
    pub zscore: f64,
    /// Position held after this period's decision
    pub position: Position,
    /// +1 long entry, -1 short entry, 0 otherwise
    pub entry_signal: i8,
    /// 1 when a position is closed this period
    pub exit_signal: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_reason: Option<ExitReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalTable {
    pub hedge_ratio: f64,
    pub lookback_window: Option<usize>,
    pub records: Vec<SignalRecord>,
}

impl SignalTable {
    pub fn timestamps(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.timestamp).collect()
    }

    pub fn positions(&self) -> Vec<Position> {
        self.records.iter().map(|r| r.position).collect()
    }

    pub fn entry_count(&self) -> usize {
        self.records.iter().filter(|r| r.entry_signal != 0).count()
    }

    pub fn exit_count(&self) -> usize {
        self.records.iter().filter(|r| r.exit_signal != 0).count()
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SignalGenerator {
    config: SignalConfig,
}

impl SignalGenerator {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Standardise `spread` with the configured window.
    pub fn calculate_zscore(&self, spread: &[f64]) -> Vec<f64> {
        zscore(spread, self.config.lookback_window)
    }

    /// Run the state machine over `spread`, one record per timestamp.
    pub fn generate_signals(
        &self,
        timestamps: &[NaiveDate],
        spread: &[f64],
        hedge_ratio: f64,
    ) -> StatArbResult<SignalTable> {
        if timestamps.len() != spread.len() {
            return Err(StatArbError::InvalidInput {
                field: "spread".into(),
                reason: format!(
                    "{} spread values for {} timestamps",
                    spread.len(),
                    timestamps.len()
                ),
            });
        }

        let z = self.calculate_zscore(spread);

        let records: Vec<SignalRecord> = timestamps
            .iter()
            .zip(spread)
            .zip(&z)
            .scan(SignalState::default(), |state, ((ts, s), z)| {
                let (next, transition) = state.step(*z, &self.config);
                *state = next;
                let (entry_signal, exit_signal, exit_reason) = match transition {
                    Transition::Enter(p) => (p.as_i8(), 0, None),
                    Transition::Exit(reason) => (0, 1, Some(reason)),
                    Transition::Hold => (0, 0, None),
                };
                Some(SignalRecord {
                    timestamp: *ts,
                    spread: *s,
                    zscore: *z,
                    position: next.position,
                    entry_signal,
                    exit_signal,
                    exit_reason,
                })
            })
            .collect();

        let table = SignalTable {
            hedge_ratio,
            lookback_window: self.config.lookback_window,
            records,
        };

        info!(
            periods = table.records.len(),
            entries = table.entry_count(),
            exits = table.exit_count(),
            "Signals generated"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        (0..n)
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect()
    }

    fn run(z: &[f64]) -> Vec<(Position, i8, u8)> {
        let config = SignalConfig::default();
        let mut state = SignalState::default();
        z.iter()
            .map(|z| {
                let (next, t) = state.step(*z, &config);
                state = next;
                match t {
                    Transition::Enter(p) => (next.position, p.as_i8(), 0),
                    Transition::Exit(_) => (next.position, 0, 1),
                    Transition::Hold => (next.position, 0, 0),
                }
            })
            .collect()
    }

    #[test]
    fn test_long_round_trip() {
        let out = run(&[0.0, -2.5, -1.5, -0.4]);
        assert_eq!(
            out,
            vec![
                (Position::Flat, 0, 0),
                (Position::Long, 1, 0),
                (Position::Long, 0, 0),
                (Position::Flat, 0, 1),
            ]
        );
    }

    #[test]
    fn test_short_stop_loss() {
        let config = SignalConfig::default();
        let (s, t) = SignalState::default().step(2.2, &config);
        assert_eq!(t, Transition::Enter(Position::Short));
        let (s, t) = s.step(3.1, &config);
        assert_eq!(t, Transition::Exit(ExitReason::StopLoss));
        assert_eq!(s.position, Position::Flat);
    }

    #[test]
    fn test_thresholds_are_strict() {
        // exactly at entry does not enter
        assert_eq!(run(&[2.0, -2.0]), vec![(Position::Flat, 0, 0); 2]);
        // exactly at -exit keeps the long
        let out = run(&[-2.1, -0.5]);
        assert_eq!(out[1], (Position::Long, 0, 0));
    }

    #[test]
    fn test_nan_holds_state() {
        let out = run(&[-2.1, f64::NAN, f64::NAN]);
        assert!(out.iter().all(|(p, _, _)| *p == Position::Long));
        assert_eq!(run(&[f64::NAN]), vec![(Position::Flat, 0, 0)]);
    }

    #[test]
    fn test_no_direct_flip() {
        // from long, a z far above +entry only exits
        let out = run(&[-2.5, 2.5, 2.5]);
        assert_eq!(out[1], (Position::Flat, 0, 1));
        assert_eq!(out[2], (Position::Short, -1, 0));
    }

    #[test]
    fn test_generate_signals_expanding() {
        let generator = SignalGenerator::new(SignalConfig {
            entry_threshold: 1.5,
            lookback_window: None,
            ..Default::default()
        });
        let spread = [1.0, -1.0, 1.0, -1.0, 5.0];
        let table = generator.generate_signals(&dates(5), &spread, 1.0).unwrap();
        let entries: Vec<i8> = table.records.iter().map(|r| r.entry_signal).collect();
        assert_eq!(entries, vec![0, 0, 0, 0, -1]);
        assert_eq!(table.records[4].position, Position::Short);
        assert!(table.records[0].zscore.is_nan());
    }

    #[test]
    fn test_generate_signals_length_mismatch() {
        let generator = SignalGenerator::default();
        assert!(generator.generate_signals(&dates(3), &[1.0, 2.0], 1.0).is_err());
    }

    #[test]
    fn test_position_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Position::Short).unwrap(), "-1");
        assert_eq!(serde_json::from_str::<Position>("1").unwrap(), Position::Long);
        assert!(serde_json::from_str::<Position>("2").is_err());
    }

    #[test]
    fn test_validate_warns_on_tight_stop() {
        let config = SignalConfig {
            stop_loss: 1.5,
            ..Default::default()
        };
        let warnings = config.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("stop_loss"));

        assert!(SignalConfig::default().validate().unwrap().is_empty());
        let bad = SignalConfig {
            lookback_window: Some(1),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_config_null_lookback_means_expanding() {
        let config: SignalConfig = serde_json::from_str(r#"{"lookback_window": null}"#).unwrap();
        assert_eq!(config.lookback_window, None);
        let config: SignalConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.lookback_window, Some(60));
    }
}
