//! Closed indicator registry and dispatch.
//!
//! Indicator names are resolved to [`IndicatorId`] before authorization, so an
//! unregistered name never reaches the computation layer.

mod bollinger;
mod macd;
mod moving_average;
mod rsi;

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Candle, SeriesPoint, ValidationError};

/// Registered indicator algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorId {
    Sma,
    Ema,
    Rsi,
    Macd,
    Bollinger,
}

impl IndicatorId {
    pub const ALL: [Self; 5] = [Self::Sma, Self::Ema, Self::Rsi, Self::Macd, Self::Bollinger];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sma => "sma",
            Self::Ema => "ema",
            Self::Rsi => "rsi",
            Self::Macd => "macd",
            Self::Bollinger => "bollinger",
        }
    }
}

impl Display for IndicatorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sma" => Ok(Self::Sma),
            "ema" => Ok(Self::Ema),
            "rsi" => Ok(Self::Rsi),
            "macd" => Ok(Self::Macd),
            "bollinger" => Ok(Self::Bollinger),
            other => Err(ValidationError::UnknownIndicator {
                value: other.to_owned(),
            }),
        }
    }
}

/// Normalized numeric parameters with the registry's documented defaults.
/// Keys the target indicator does not read are accepted and ignored, matching
/// a shared parameter surface across all indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub period: usize,
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    pub std_dev: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            period: 20,
            fast: 12,
            slow: 26,
            signal: 9,
            std_dev: 2.0,
        }
    }
}

impl IndicatorParams {
    /// Overlay named numeric parameters onto the defaults. RSI keeps its own
    /// default period of 14 unless the caller overrides it.
    pub fn from_map(
        indicator: IndicatorId,
        params: &HashMap<String, f64>,
    ) -> Result<Self, ValidationError> {
        let mut normalized = Self::default();
        if indicator == IndicatorId::Rsi {
            normalized.period = 14;
        }

        if let Some(&value) = params.get("period") {
            normalized.period = to_period("period", value)?;
        }
        if let Some(&value) = params.get("fast") {
            normalized.fast = to_period("fast", value)?;
        }
        if let Some(&value) = params.get("slow") {
            normalized.slow = to_period("slow", value)?;
        }
        if let Some(&value) = params.get("signal") {
            normalized.signal = to_period("signal", value)?;
        }
        if let Some(&value) = params.get("std_dev") {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidParameter {
                    name: "std_dev",
                    value,
                });
            }
            normalized.std_dev = value;
        }

        Ok(normalized)
    }
}

fn to_period(name: &'static str, value: f64) -> Result<usize, ValidationError> {
    if !value.is_finite() || value < 1.0 || value.fract() != 0.0 {
        return Err(ValidationError::InvalidPeriod { name, value });
    }
    Ok(value as usize)
}

/// Run one registered algorithm over an already-sliced candle series and
/// normalize the output for presentation: non-finite values become absent and
/// defined values are rounded to two decimal places.
///
/// An empty output means the indicator produced no defined points over a valid
/// slice; it is not a lookup failure.
pub fn compute_series(
    indicator: IndicatorId,
    candles: &[Candle],
    params: &IndicatorParams,
) -> Vec<SeriesPoint> {
    let closes: Vec<f64> = candles.iter().map(|candle| candle.close).collect();

    let values = match indicator {
        IndicatorId::Sma => moving_average::sma(&closes, params.period),
        IndicatorId::Ema => moving_average::ema(&closes, params.period),
        IndicatorId::Rsi => rsi::rsi(&closes, params.period),
        IndicatorId::Macd => macd::macd_line(&closes, params.fast, params.slow),
        IndicatorId::Bollinger => bollinger::bollinger_middle(&closes, params.period),
    };

    values
        .into_iter()
        .zip(candles)
        .map(|(value, candle)| SeriesPoint::new(candle.date, normalize(value)))
        .collect()
}

fn normalize(value: Option<f64>) -> Option<f64> {
    let value = value?;
    if !value.is_finite() {
        return None;
    }
    Some((value * 100.0).round() / 100.0)
}
