//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR uses Wilder smoothing (EMA with alpha = 1/period).
//! Lookback: period (TR[0] has no previous close and is excluded from the seed).

use crate::domain::PricePoint;

use super::ema::seeded_average;
use super::Indicator;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True range per point; the first point has no previous close, so its
/// true range is just high - low.
pub fn true_range(points: &[PricePoint]) -> Vec<f64> {
    let prev_closes = std::iter::once(None).chain(points.iter().map(|p| Some(p.close)));
    points
        .iter()
        .zip(prev_closes)
        .map(|(p, prev_close)| match prev_close {
            Some(c) => (p.high - p.low).max((p.high - c).abs()).max((p.low - c).abs()),
            None => p.high - p.low,
        })
        .collect()
}

/// Wilder smoothing (alpha = 1/period), seeded on the first run of `period`
/// finite values.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    seeded_average(values, period, 1.0 / period.max(1) as f64)
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<f64> {
        let mut tr = true_range(points);
        if let Some(first) = tr.first_mut() {
            *first = f64::NAN;
        }
        wilder_smooth(&tr, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_points, DEFAULT_EPSILON};

    #[test]
    fn true_range_basic() {
        let points = make_ohlc_points(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 10
            (102.0, 108.0, 100.0, 106.0), // TR = max(8, 6, 2) = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = max(9, 1, 8) = 9
        ]);
        let tr = true_range(&points);
        assert_approx(tr[0], 10.0, DEFAULT_EPSILON);
        assert_approx(tr[1], 8.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let points = make_ohlc_points(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0), // TR = max(7, 15, 8) = 15
        ]);
        let tr = true_range(&points);
        assert_approx(tr[1], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_3() {
        let points = make_ohlc_points(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 10 (excluded)
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = 9
            (99.0, 103.0, 97.0, 101.0),   // TR = 6
            (101.0, 106.0, 100.0, 105.0), // TR = 6
        ]);
        let result = Atr::new(3).compute(&points);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        // Seed ATR[3] = mean(8, 9, 6); ATR[4] = 6/3 + (2/3)(23/3) = 64/9
        assert_approx(result[3], 23.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result[4], 64.0 / 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn wilder_smooth_skips_leading_nan() {
        let result = wilder_smooth(&[f64::NAN, 2.0, 4.0, 6.0], 2);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 3.0, DEFAULT_EPSILON);
        assert_approx(result[3], 4.5, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_lookback() {
        assert_eq!(Atr::new(14).lookback(), 14);
    }
}
