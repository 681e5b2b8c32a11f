use super::{last_defined, oscillator, IndicatorError};
use crate::models::PriceBar;

pub const DEFAULT_WINDOW: usize = 14;

/// Money Flow Index (MFI)
/// Volume-weighted RSI: typical price (high + low + close) / 3 times volume
/// gives the money flow of a bar. Flow counts as positive when the typical
/// price rose against the previous bar, negative when it fell, and is left
/// out when unchanged.
pub struct MFI {
    window: usize,
}

impl Default for MFI {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

fn typical_price(bar: &PriceBar) -> Result<(f64, f64), IndicatorError> {
    let high = bar.high.ok_or(IndicatorError::MissingField("high"))?;
    let low = bar.low.ok_or(IndicatorError::MissingField("low"))?;
    let volume = bar.volume.ok_or(IndicatorError::MissingField("volume"))?;
    Ok(((high + low + bar.close) / 3.0, volume))
}

impl MFI {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Full MFI series, same length as `bars`, NaN during warmup.
    /// Every bar must carry high, low and volume.
    pub fn calculate(&self, bars: &[PriceBar]) -> Result<Vec<f64>, IndicatorError> {
        if self.window == 0 {
            return Err(IndicatorError::InvalidPeriod);
        }

        let typical: Vec<(f64, f64)> = bars.iter().map(typical_price).collect::<Result<_, _>>()?;
        let mut result = vec![f64::NAN; bars.len()];

        if bars.len() < self.window.saturating_add(1) {
            return Ok(result);
        }

        let (positive, negative): (Vec<f64>, Vec<f64>) = typical
            .windows(2)
            .map(|pair| {
                let (prev_tp, _) = pair[0];
                let (tp, volume) = pair[1];
                let flow = tp * volume;
                if tp > prev_tp {
                    (flow, 0.0)
                } else if tp < prev_tp {
                    (0.0, flow)
                } else {
                    (0.0, 0.0)
                }
            })
            .unzip();

        for end in self.window..=positive.len() {
            let pos: f64 = positive[end - self.window..end].iter().sum();
            let neg: f64 = negative[end - self.window..end].iter().sum();
            result[end] = oscillator(pos, neg);
        }

        Ok(result)
    }

    pub fn latest(&self, bars: &[PriceBar]) -> Result<f64, IndicatorError> {
        let series = self.calculate(bars)?;
        last_defined(&series).ok_or(IndicatorError::InsufficientData {
            required: self.window.saturating_add(1),
            available: bars.len(),
        })
    }
}
