/// Simple Moving Average (SMA)
/// Trailing arithmetic mean of the last N values
pub struct SMA {
    period: usize,
}

impl SMA {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Rolling mean over `values`, same length as the input.
    /// The first (period - 1) slots stay NaN while the window fills.
    pub fn calculate(&self, values: &[f64]) -> Vec<f64> {
        let mut result = vec![f64::NAN; values.len()];

        if self.period == 0 || values.len() < self.period {
            return result;
        }

        // Each window is summed from scratch so an all-zero window is exactly 0.0
        for (i, window) in values.windows(self.period).enumerate() {
            let sum: f64 = window.iter().sum();
            result[i + self.period - 1] = sum / self.period as f64;
        }

        result
    }
}

/// Exponential Moving Average (EMA)
/// Seeded with the first value, so every slot is defined:
/// ema[0] = x[0], ema[i] = x[i] * k + ema[i-1] * (1 - k)
pub struct EMA {
    span: usize,
}

impl EMA {
    pub fn new(span: usize) -> Self {
        Self { span }
    }

    /// k = 2 / (span + 1)
    fn smoothing_factor(&self) -> f64 {
        2.0 / (self.span as f64 + 1.0)
    }

    pub fn calculate(&self, values: &[f64]) -> Vec<f64> {
        let k = self.smoothing_factor();
        let mut result = Vec::with_capacity(values.len());

        let mut iter = values.iter();
        if let Some(&first) = iter.next() {
            result.push(first);
            let mut prev = first;
            for &value in iter {
                prev = value * k + prev * (1.0 - k);
                result.push(prev);
            }
        }

        result
    }
}
