use super::{last_defined, oscillator, IndicatorError, SMA};

pub const DEFAULT_PERIOD: usize = 14;

/// Relative Strength Index (RSI)
/// Compares the trailing mean gain with the trailing mean loss over `period`
/// price changes. Readings run from 0 to 100:
/// - Below 30: Oversold
/// - Above 70: Overbought
///
/// Means are simple rolling averages (not Wilder smoothing). A window with
/// no losses reads 100, a window with no movement at all reads 50.
pub struct RSI {
    period: usize,
}

impl Default for RSI {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD)
    }
}

impl RSI {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Minimum number of prices needed for one reading
    pub fn required_points(&self) -> usize {
        self.period.saturating_add(1)
    }

    /// Full RSI series, same length as `prices`.
    /// The first `period` slots are NaN (warmup), as is everything when the
    /// series is too short.
    pub fn calculate(&self, prices: &[f64]) -> Vec<f64> {
        let mut result = vec![f64::NAN; prices.len()];

        if self.period == 0 || prices.len() < self.required_points() {
            return result;
        }

        let (gains, losses): (Vec<f64>, Vec<f64>) = prices
            .windows(2)
            .map(|pair| {
                let change = pair[1] - pair[0];
                (change.max(0.0), (-change).max(0.0))
            })
            .unzip();

        let sma = SMA::new(self.period);
        let avg_gains = sma.calculate(&gains);
        let avg_losses = sma.calculate(&losses);

        // Difference i describes the move into price i + 1
        for i in (self.period - 1)..gains.len() {
            result[i + 1] = oscillator(avg_gains[i], avg_losses[i]);
        }

        result
    }

    /// Most recent RSI reading
    pub fn latest(&self, prices: &[f64]) -> Result<f64, IndicatorError> {
        if self.period == 0 {
            return Err(IndicatorError::InvalidPeriod);
        }
        if prices.len() < self.required_points() {
            return Err(IndicatorError::InsufficientData {
                required: self.required_points(),
                available: prices.len(),
            });
        }

        last_defined(&self.calculate(prices)).ok_or(IndicatorError::InsufficientData {
            required: self.required_points(),
            available: prices.len(),
        })
    }
}
