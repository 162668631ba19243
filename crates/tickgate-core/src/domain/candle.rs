use serde::{Deserialize, Serialize};

use crate::{TradingDate, ValidationError};

/// One daily OHLC row of the shared dataset. Immutable after load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: TradingDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<u64>,
}

impl Candle {
    pub fn new(
        date: TradingDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<u64>,
    ) -> Result<Self, ValidationError> {
        validate_finite("open", open)?;
        validate_finite("high", high)?;
        validate_finite("low", low)?;
        validate_finite("close", close)?;
        validate_non_negative("low", low)?;

        if high < low {
            return Err(ValidationError::InvalidCandleRange);
        }
        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidCandleBounds);
        }

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// One point of a computed indicator series. `value` is absent where the
/// indicator is mathematically undefined (warm-up), which is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: TradingDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl SeriesPoint {
    pub const fn new(date: TradingDate, value: Option<f64>) -> Self {
        Self { date, value }
    }
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(())
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
