use chrono::{DateTime, Utc};
use serde::Serialize;

/// Session tokens returned by the IG login handshake
#[derive(Clone)]
pub struct Session {
    pub client_token: String,
    pub security_token: String,
    pub api_version: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client_token", &"<redacted>")
            .field("security_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instrument {
    pub name: String,
    pub epic: Option<String>,
}

impl Instrument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            epic: None,
        }
    }
}

/// One sampled interval. `close` is the closing bid; the other columns are
/// only present when the upstream bar carried them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBar {
    pub close: f64,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl PriceBar {
    pub fn from_close(close: f64) -> Self {
        Self {
            close,
            high: None,
            low: None,
            volume: None,
            timestamp: None,
        }
    }
}

/// Chronological bars for one instrument
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self { bars }
    }

    pub fn from_closes(closes: &[f64]) -> Self {
        Self::new(closes.iter().copied().map(PriceBar::from_close).collect())
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// True when every bar has the columns MFI needs
    pub fn has_volume_data(&self) -> bool {
        !self.bars.is_empty()
            && self
                .bars
                .iter()
                .all(|b| b.high.is_some() && b.low.is_some() && b.volume.is_some())
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Value(f64),
    Error(String),
}

/// Per-instrument record handed to the presentation layer.
/// Serializes as `{"stock": .., "value": ..}` or `{"stock": .., "error": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorResult {
    pub stock: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epic: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl IndicatorResult {
    pub fn value(stock: impl Into<String>, epic: Option<String>, value: f64) -> Self {
        Self {
            stock: stock.into(),
            epic,
            outcome: Outcome::Value(value),
        }
    }

    pub fn error(stock: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stock: stock.into(),
            epic: None,
            outcome: Outcome::Error(message.into()),
        }
    }

    pub fn as_value(&self) -> Option<f64> {
        match self.outcome {
            Outcome::Value(v) => Some(v),
            Outcome::Error(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Value(_) => None,
            Outcome::Error(msg) => Some(msg),
        }
    }
}
