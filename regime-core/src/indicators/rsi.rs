//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 → RSI = 100 (flat windows included); avg_gain == 0 → RSI = 0.

use crate::domain::PricePoint;

use super::atr::wilder_smooth;
use super::Indicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<f64> {
        // Close-to-close moves; index 0 has none.
        let mut gains = vec![f64::NAN; points.len()];
        let mut losses = vec![f64::NAN; points.len()];
        for (i, w) in points.windows(2).enumerate() {
            let change = w[1].close - w[0].close;
            if change.is_nan() {
                continue;
            }
            gains[i + 1] = change.max(0.0);
            losses[i + 1] = (-change).max(0.0);
        }

        let avg_gain = wilder_smooth(&gains, self.period);
        let avg_loss = wilder_smooth(&losses, self.period);
        avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(&g, &l)| if g.is_nan() || l.is_nan() { f64::NAN } else { compute_rsi(g, l) })
            .collect()
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        (100.0 - 100.0 / (1.0 + avg_gain / avg_loss)).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_points};

    #[test]
    fn rsi_all_gains() {
        let points = make_points(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let result = Rsi::new(3).compute(&points);
        assert_approx(result[3], 100.0, 1e-6);
    }

    #[test]
    fn rsi_all_losses() {
        let points = make_points(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        let result = Rsi::new(3).compute(&points);
        assert_approx(result[3], 0.0, 1e-6);
    }

    #[test]
    fn rsi_flat_window_is_100() {
        let points = make_points(&[100.0; 6]);
        let result = Rsi::new(3).compute(&points);
        assert_approx(result[5], 100.0, 1e-9);
    }

    #[test]
    fn rsi_mixed_seed() {
        // Changes: +0.34, -0.25, -0.48 → avg_gain = 0.34/3, avg_loss = 0.73/3
        // RSI[3] = 100 - 100/(1 + 0.34/0.73) ≈ 31.776
        let points = make_points(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        let result = Rsi::new(3).compute(&points);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert_approx(result[3], 100.0 - 100.0 / (1.0 + 0.34 / 0.73), 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let points = make_points(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        let result = Rsi::new(3).compute(&points);
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "RSI out of bounds at {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
        let points = make_points(&[1.0, 2.0, 3.0, 2.0, 1.0]);
        let result = Rsi::new(4).compute(&points);
        assert!(result[3].is_nan());
        assert!(!result[4].is_nan());
    }
}
