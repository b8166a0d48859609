//! On-Balance Volume (OBV).
//!
//! OBV[0] = 0; OBV[t] = OBV[t-1] + volume[t] if close rises, - volume[t] if it
//! falls, unchanged if flat. A zero-volume point carries the total forward.
//! Lookback: 0.

use crate::domain::PricePoint;

use super::Indicator;

#[derive(Debug, Clone, Default)]
pub struct Obv;

impl Obv {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Obv {
    fn name(&self) -> &str {
        "obv"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<f64> {
        let mut result = Vec::with_capacity(points.len());
        let mut total = 0.0;
        if !points.is_empty() {
            result.push(total);
        }
        for w in points.windows(2) {
            let (prev, curr) = (&w[0], &w[1]);
            if curr.volume > 0.0 {
                if curr.close > prev.close {
                    total += curr.volume;
                } else if curr.close < prev.close {
                    total -= curr.volume;
                }
            }
            result.push(total);
        }
        result
    }
}
