//! Exponential averages.
//!
//! Both the standard EMA (alpha = 2/(period+1)) and Wilder smoothing
//! (alpha = 1/period) share one recursion:
//! avg[t] = alpha * x[t] + (1 - alpha) * avg[t-1],
//! seeded with the simple mean of the first `period` consecutive finite values.
//! A NaN after the seed leaves every later value NaN.

/// Exponential recursion with an SMA seed. See the module docs.
pub fn seeded_average(values: &[f64], period: usize, alpha: f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 {
        return out;
    }

    // Index just past the first run of `period` non-NaN values.
    let mut run = 0;
    let Some(seed_end) = values.iter().position(|v| {
        run = if v.is_nan() { 0 } else { run + 1 };
        run == period
    }) else {
        return out;
    };

    let seed = values[seed_end + 1 - period..=seed_end].iter().sum::<f64>() / period as f64;
    out[seed_end] = seed;

    let mut avg = seed;
    for (slot, &x) in out[seed_end + 1..].iter_mut().zip(&values[seed_end + 1..]) {
        if x.is_nan() {
            break;
        }
        avg += alpha * (x - avg);
        *slot = avg;
    }
    out
}

/// EMA with alpha = 2/(period+1). Lookback: period - 1 for a NaN-free series.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    seeded_average(values, period, 2.0 / (period as f64 + 1.0))
}
