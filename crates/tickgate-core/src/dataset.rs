//! Backing-source contract for the market-data cache.

use std::fmt::{Display, Formatter};

use crate::{Candle, Symbol};

/// Raw `(symbol, candle)` row from the bulk read, before grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleRow {
    pub symbol: Symbol,
    pub candle: Candle,
}

/// Failure of the one-shot bulk read. The cache treats any failure as a
/// degraded state; it does not retry per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetError {
    message: String,
}

impl DatasetError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for DatasetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DatasetError {}

/// Bulk reader for the whole dataset. Called at most once per cache load;
/// format-agnostic as long as rows can be grouped into per-symbol series.
pub trait DatasetSource: Send + Sync {
    fn load_all(&self) -> Result<Vec<CandleRow>, DatasetError>;
}
