// MACD (Moving Average Convergence Divergence)
// MACD line   = EMA(short) - EMA(long)
// Signal line = EMA(signal) of the MACD line

use serde::Serialize;

use super::{IndicatorError, EMA};

pub const DEFAULT_SHORT: usize = 12;
pub const DEFAULT_LONG: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub struct MACD {
    short: usize,
    long: usize,
    signal: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

impl MacdSeries {
    pub fn histogram(&self) -> Vec<f64> {
        self.macd
            .iter()
            .zip(&self.signal)
            .map(|(m, s)| m - s)
            .collect()
    }

    /// Sign change of the histogram on the last bar:
    /// `Some(true)` for a bullish cross, `Some(false)` for a bearish one.
    pub fn latest_crossover(&self) -> Option<bool> {
        let hist = self.histogram();
        match hist.as_slice() {
            [.., prev, last] if *prev <= 0.0 && *last > 0.0 => Some(true),
            [.., prev, last] if *prev >= 0.0 && *last < 0.0 => Some(false),
            _ => None,
        }
    }
}

impl Default for MACD {
    fn default() -> Self {
        Self::new(DEFAULT_SHORT, DEFAULT_LONG, DEFAULT_SIGNAL)
    }
}

impl MACD {
    pub fn new(short: usize, long: usize, signal: usize) -> Self {
        Self {
            short,
            long,
            signal,
        }
    }

    pub fn calculate(&self, prices: &[f64]) -> Result<MacdSeries, IndicatorError> {
        if self.short == 0 || self.long == 0 || self.signal == 0 {
            return Err(IndicatorError::InvalidPeriod);
        }
        if prices.is_empty() {
            return Err(IndicatorError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let short_ema = EMA::new(self.short).calculate(prices);
        let long_ema = EMA::new(self.long).calculate(prices);

        let macd: Vec<f64> = short_ema
            .iter()
            .zip(&long_ema)
            .map(|(s, l)| s - l)
            .collect();
        let signal = EMA::new(self.signal).calculate(&macd);

        Ok(MacdSeries { macd, signal })
    }
}
