//! MACD line: fast EMA minus slow EMA. Signal and histogram are not part of
//! the response contract.

use super::moving_average::ema;

/// MACD line over close prices. The first `slow - 1` slots are undefined.
/// A series shorter than `slow` produces an empty (still valid) output.
pub fn macd_line(closes: &[f64], fast: usize, slow: usize) -> Vec<Option<f64>> {
    if closes.len() < slow.max(1) {
        return Vec::new();
    }

    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);

    fast_ema
        .into_iter()
        .zip(slow_ema)
        .map(|(fast_value, slow_value)| match (fast_value, slow_value) {
            (Some(fast_value), Some(slow_value)) => Some(fast_value - slow_value),
            _ => None,
        })
        .collect()
}
