use thiserror::Error;

use crate::indicators::IndicatorError;

/// Failure of one stage of the instrument pipeline.
///
/// Display strings are shown to end users, so they name the failing stage and
/// never carry tokens or raw protocol detail. The detail goes to the log.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("Unable to authenticate with the broker, please try again later.")]
    AuthenticationFailed(String),

    #[error("No market found for \"{0}\".")]
    InstrumentNotFound(String),

    #[error("No epic key found for \"{0}\".")]
    NoIdentifierAvailable(String),

    #[error("Unable to fetch {stage} for \"{instrument}\".")]
    FetchFailed {
        instrument: String,
        stage: FetchStage,
        reason: String,
    },

    #[error("No valid close prices found for \"{0}\".")]
    NoValidPrices(String),

    #[error("Indicator calculation failed: {0}.")]
    Indicator(#[from] IndicatorError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    MarketSearch,
    PriceHistory,
}

impl std::fmt::Display for FetchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStage::MarketSearch => write!(f, "market data"),
            FetchStage::PriceHistory => write!(f, "historical prices"),
        }
    }
}

impl PipelineError {
    /// Internal detail worth logging alongside the user-facing message
    pub fn detail(&self) -> Option<&str> {
        match self {
            PipelineError::AuthenticationFailed(reason)
            | PipelineError::FetchFailed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
