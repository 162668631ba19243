use thiserror::Error;

/// Validation and contract errors exposed by `tickgate-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },
    #[error("window start {start} is after end {end}")]
    InvalidWindow { start: String, end: String },

    #[error("invalid tier '{value}', expected one of free, pro, premium")]
    InvalidTier { value: String },
    #[error("unknown indicator '{value}'")]
    UnknownIndicator { value: String },
    #[error("parameter '{name}' must be a positive integer, got {value}")]
    InvalidPeriod { name: &'static str, value: f64 },
    #[error("parameter '{name}' must be finite and non-negative, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("candle high must be >= low")]
    InvalidCandleRange,
    #[error("candle open/close must be within high/low range")]
    InvalidCandleBounds,

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
