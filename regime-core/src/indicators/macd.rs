//! MACD: Moving Average Convergence Divergence.
//!
//! MACD line = EMA(close, fast) - EMA(close, slow)
//! Signal line = EMA(MACD line, signal)
//! Histogram = MACD line - signal line
//!
//! Lookback: slow - 1 for the MACD line, slow + signal - 2 for signal and histogram.

use crate::domain::PricePoint;
use crate::indicators::ema::ema_of_series;

use super::Indicator;

/// Which MACD output line to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(slow > fast, "MACD slow period must exceed fast period");
        let label = match line {
            MacdLine::Macd => "macd",
            MacdLine::Signal => "macd_signal",
            MacdLine::Histogram => "macd_histogram",
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name: format!("{label}_{fast}_{slow}_{signal}"),
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            MacdLine::Macd => self.slow - 1,
            MacdLine::Signal | MacdLine::Histogram => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<f64> {
        let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);

        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        if self.line == MacdLine::Macd {
            return macd;
        }

        // The seed skips the MACD warmup, so the signal starts signal - 1 points later.
        let signal = ema_of_series(&macd, self.signal);

        match self.line {
            MacdLine::Signal => signal,
            _ => macd.iter().zip(&signal).map(|(m, s)| m - s).collect(),
        }
    }
}
