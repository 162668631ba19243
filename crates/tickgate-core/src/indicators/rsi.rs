//! Relative strength index with Wilder smoothing.

/// RSI over close prices. The first `period` slots are undefined: one close is
/// consumed by differencing and `period` differences seed the first average.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut output = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return output;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for index in 1..=period {
        let change = closes[index] - closes[index - 1];
        if change >= 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let mut avg_gain = gains / period as f64;
    let mut avg_loss = losses / period as f64;
    output[period] = Some(rsi_value(avg_gain, avg_loss));

    for index in (period + 1)..closes.len() {
        let change = closes[index] - closes[index - 1];
        let (gain, loss) = if change >= 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        };

        // Wilder smoothing: previous average re-weighted by (period - 1) / period.
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
        output[index] = Some(rsi_value(avg_gain, avg_loss));
    }

    output
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}
