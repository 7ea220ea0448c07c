//! Z-score signals: standardisation of the spread and the position state machine.

pub mod generator;
pub mod sizing;
pub mod zscore;

pub use generator::{
    ExitReason, Position, SignalConfig, SignalGenerator, SignalRecord, SignalState, SignalTable,
    Transition,
};
pub use sizing::{position_sizes, PositionSize};
pub use zscore::zscore;
