//! ADX: Average Directional Index (Wilder), with +DI and -DI.
//!
//! Steps:
//! 1. Compute +DM and -DM from consecutive points
//! 2. Smooth +DM, -DM, and TR using Wilder smoothing (alpha = 1/period)
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR)
//! 4. -DI = 100 * smoothed(-DM) / smoothed(TR)
//! 5. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 6. ADX = Wilder-smoothed DX
//!
//! A zero smoothed true range (perfectly flat window) yields +DI = -DI = DX = 0.
//! Lookback: period for the DI lines, 2 * period - 1 for ADX.

use crate::domain::PricePoint;
use crate::indicators::atr::{true_range, wilder_smooth};

use super::Indicator;

/// Which output line of the directional movement system to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionalLine {
    Adx,
    PlusDi,
    MinusDi,
}

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    line: DirectionalLine,
    name: String,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        Self::with_line(period, DirectionalLine::Adx)
    }

    pub fn plus_di(period: usize) -> Self {
        Self::with_line(period, DirectionalLine::PlusDi)
    }

    pub fn minus_di(period: usize) -> Self {
        Self::with_line(period, DirectionalLine::MinusDi)
    }

    fn with_line(period: usize, line: DirectionalLine) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        let prefix = match line {
            DirectionalLine::Adx => "adx",
            DirectionalLine::PlusDi => "plus_di",
            DirectionalLine::MinusDi => "minus_di",
        };
        Self {
            period,
            line,
            name: format!("{prefix}_{period}"),
        }
    }
}

/// The three directional movement lines, aligned with the input window.
#[derive(Debug, Clone)]
pub struct DirectionalSeries {
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
    pub adx: Vec<f64>,
}

/// Compute +DI, -DI and ADX over a window.
pub fn directional_series(points: &[PricePoint], period: usize) -> DirectionalSeries {
    let n = points.len();
    let mut plus_dm = vec![f64::NAN; n];
    let mut minus_dm = vec![f64::NAN; n];

    for i in 1..n {
        let up_move = points[i].high - points[i - 1].high;
        let down_move = points[i - 1].low - points[i].low;

        plus_dm[i] = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        minus_dm[i] = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };
    }

    // TR[0] has no previous close; keep the TR seed aligned with the DM seed.
    let mut tr = true_range(points);
    if let Some(first) = tr.first_mut() {
        *first = f64::NAN;
    }

    let smooth_tr = wilder_smooth(&tr, period);
    let smooth_plus_dm = wilder_smooth(&plus_dm, period);
    let smooth_minus_dm = wilder_smooth(&minus_dm, period);

    let mut plus_di = vec![f64::NAN; n];
    let mut minus_di = vec![f64::NAN; n];
    let mut dx = vec![f64::NAN; n];
    for i in 0..n {
        if smooth_tr[i].is_nan() || smooth_plus_dm[i].is_nan() || smooth_minus_dm[i].is_nan() {
            continue;
        }

        if smooth_tr[i] == 0.0 {
            plus_di[i] = 0.0;
            minus_di[i] = 0.0;
            dx[i] = 0.0;
            continue;
        }

        let pdi = 100.0 * smooth_plus_dm[i] / smooth_tr[i];
        let mdi = 100.0 * smooth_minus_dm[i] / smooth_tr[i];
        let di_sum = pdi + mdi;

        plus_di[i] = pdi;
        minus_di[i] = mdi;
        dx[i] = if di_sum == 0.0 {
            0.0
        } else {
            100.0 * (pdi - mdi).abs() / di_sum
        };
    }

    DirectionalSeries {
        plus_di,
        minus_di,
        adx: wilder_smooth(&dx, period),
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            DirectionalLine::Adx => 2 * self.period - 1,
            DirectionalLine::PlusDi | DirectionalLine::MinusDi => self.period,
        }
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<f64> {
        if points.len() < 2 {
            return vec![f64::NAN; points.len()];
        }
        let series = directional_series(points, self.period);
        match self.line {
            DirectionalLine::Adx => series.adx,
            DirectionalLine::PlusDi => series.plus_di,
            DirectionalLine::MinusDi => series.minus_di,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_points;

    fn trending(n: usize, step: f64) -> Vec<PricePoint> {
        let data: Vec<_> = (0..n)
            .map(|i| {
                let base = 100.0 + i as f64 * step;
                (base - 1.0, base + 3.0, base - 3.0, base + 2.0)
            })
            .collect();
        make_ohlc_points(&data)
    }

    #[test]
    fn adx_bounds() {
        let points = make_ohlc_points(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
            (99.0, 103.0, 97.0, 101.0),
            (101.0, 106.0, 100.0, 105.0),
            (105.0, 110.0, 103.0, 108.0),
            (108.0, 112.0, 106.0, 110.0),
            (110.0, 111.0, 104.0, 105.0),
            (105.0, 109.0, 103.0, 107.0),
            (107.0, 113.0, 105.0, 112.0),
        ]);
        let result = Adx::new(3).compute(&points);

        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "ADX out of bounds at {i}: {v}");
            }
        }
    }

    #[test]
    fn uptrend_has_plus_di_dominant() {
        let points = trending(20, 5.0);
        let series = directional_series(&points, 5);
        let last = points.len() - 1;
        assert!(series.plus_di[last] > series.minus_di[last]);
        assert!(series.adx[last] > 25.0, "ADX {} should be elevated", series.adx[last]);
    }

    #[test]
    fn downtrend_has_minus_di_dominant() {
        let points = trending(20, -5.0);
        let series = directional_series(&points, 5);
        let last = points.len() - 1;
        assert!(series.minus_di[last] > series.plus_di[last]);
    }

    #[test]
    fn flat_window_is_zero_not_nan() {
        let points = make_ohlc_points(&[(100.0, 100.0, 100.0, 100.0); 10]);
        let series = directional_series(&points, 3);
        assert_eq!(series.plus_di[9], 0.0);
        assert_eq!(series.minus_di[9], 0.0);
        assert_eq!(series.adx[9], 0.0);
    }

    #[test]
    fn adx_lookback_matches_first_valid_index() {
        let points = trending(8, 1.0);
        let adx = Adx::new(3);
        assert_eq!(adx.lookback(), 5);
        let result = adx.compute(&points);
        assert!(result[4].is_nan());
        assert!(!result[5].is_nan());

        let plus = Adx::plus_di(3);
        assert_eq!(plus.lookback(), 3);
        let result = plus.compute(&points);
        assert!(result[2].is_nan());
        assert!(!result[3].is_nan());
    }

    #[test]
    fn adx_too_few_points() {
        let points = make_ohlc_points(&[(100.0, 105.0, 95.0, 102.0)]);
        let result = Adx::new(3).compute(&points);
        assert!(result.iter().all(|v| v.is_nan()));
    }
}
