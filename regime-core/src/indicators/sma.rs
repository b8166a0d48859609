//! Simple averages over a slice.
//!
//! Used for the Bollinger middle band and the volatility and volume baselines.

/// Arithmetic mean of a slice; `None` when empty or when any value is NaN.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() || values.iter().any(|v| v.is_nan()) {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_values() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(mean(&[1000.0; 20]), Some(1000.0));
    }

    #[test]
    fn mean_empty_and_nan() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, f64::NAN]), None);
    }
}
