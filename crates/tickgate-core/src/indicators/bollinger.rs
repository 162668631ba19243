//! Bollinger middle band. The response contract returns only the middle band
//! (a simple moving average); the band half-width is validated but does not
//! change the returned line.

use super::moving_average::sma;

pub fn bollinger_middle(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    sma(closes, period)
}
