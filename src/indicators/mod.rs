// Technical indicators
// Pure calculations over chronological price data, no I/O

pub mod macd;
pub mod mfi;
pub mod moving_averages;
pub mod rsi;

pub use macd::{MACD, MacdSeries};
pub use mfi::MFI;
pub use moving_averages::{EMA, SMA};
pub use rsi::RSI;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("not enough price data: need at least {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("price data is missing the `{0}` field")]
    MissingField(&'static str),

    #[error("indicator period must be at least 1")]
    InvalidPeriod,
}

/// Last non-NaN value of an indicator series.
pub(crate) fn last_defined(values: &[f64]) -> Option<f64> {
    values.last().copied().filter(|v| !v.is_nan())
}

/// Neutral reading used when a window saw no movement at all.
pub const NEUTRAL_READING: f64 = 50.0;

/// Oscillator formula shared by RSI and MFI: 100 - 100 / (1 + up / down).
///
/// `down == 0` saturates at 100, and a window with neither up nor down
/// movement reads as [`NEUTRAL_READING`].
pub(crate) fn oscillator(up: f64, down: f64) -> f64 {
    if down == 0.0 {
        if up == 0.0 {
            NEUTRAL_READING
        } else {
            100.0
        }
    } else {
        100.0 - (100.0 / (1.0 + up / down))
    }
}
