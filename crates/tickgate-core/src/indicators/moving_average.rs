//! Simple and exponential moving averages over close prices.

/// Rolling mean. The first `period - 1` slots are undefined.
pub fn sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut output = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return output;
    }

    let mut sum: f64 = closes[..period].iter().sum();
    output[period - 1] = Some(sum / period as f64);
    for index in period..closes.len() {
        sum += closes[index] - closes[index - period];
        output[index] = Some(sum / period as f64);
    }

    output
}

/// SMA-seeded exponential moving average with `alpha = 2 / (period + 1)`.
/// The first `period - 1` slots are undefined; the value at `period - 1` is the
/// simple mean of the first `period` closes.
pub fn ema(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut output = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return output;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed: f64 = closes[..period].iter().sum::<f64>() / period as f64;
    let mut current = seed;
    output[period - 1] = Some(current);

    for index in period..closes.len() {
        current = alpha * closes[index] + (1.0 - alpha) * current;
        output[index] = Some(current);
    }

    output
}
