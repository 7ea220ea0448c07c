use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatArbError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("No suitable pair found after trying {attempted}. Try symbols from the same sector, a lower correlation threshold, or a longer history")]
    NoSuitablePair { attempted: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for StatArbError {
    fn from(e: serde_json::Error) -> Self {
        StatArbError::SerializationError(e.to_string())
    }
}
