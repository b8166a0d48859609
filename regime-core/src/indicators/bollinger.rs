//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! Four lines (separate Indicator instances):
//! - Middle: SMA(close, period)
//! - Upper: middle + mult * stddev(close, period)
//! - Lower: middle - mult * stddev(close, period)
//! - Width: upper - lower
//!
//! Uses population stddev (divide by N).
//! Lookback: period - 1.

use crate::domain::PricePoint;

use super::sma::mean;
use super::Indicator;

/// Which line of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
    Width,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        let label = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
            BollingerBand::Width => "width",
        };
        Self {
            period,
            multiplier,
            band,
            name: format!("bollinger_{label}_{period}_{multiplier}"),
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Upper)
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Middle)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Lower)
    }

    pub fn width(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Width)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<f64> {
        let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
        let mut out = vec![f64::NAN; closes.len()];
        if closes.len() < self.period {
            return out;
        }

        let p = self.period as f64;
        for (slot, window) in out[self.period - 1..]
            .iter_mut()
            .zip(closes.windows(self.period))
        {
            let Some(mid) = mean(window) else {
                continue;
            };
            let std = (window.iter().map(|c| (c - mid).powi(2)).sum::<f64>() / p).sqrt();
            let offset = self.multiplier * std;
            *slot = match self.band {
                BollingerBand::Upper => mid + offset,
                BollingerBand::Middle => mid,
                BollingerBand::Lower => mid - offset,
                BollingerBand::Width => 2.0 * offset,
            };
        }
        out
    }
}
