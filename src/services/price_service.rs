use tracing::{error, info, warn};

use crate::api_client::{IgClient, PriceHistoryResponse};
use crate::config::PriceWindow;
use crate::error::{FetchStage, PipelineError};
use crate::models::{PriceBar, PriceSeries, Session};

/// Fetch the configured window of bars for `epic`
pub async fn fetch_price_series(
    client: &IgClient,
    session: &Session,
    name: &str,
    epic: &str,
    window: &PriceWindow,
) -> Result<PriceSeries, PipelineError> {
    info!(instrument = name, epic, "Fetching market history");

    let response = client
        .fetch_price_history(session, epic, window)
        .await
        .map_err(|e| {
            error!(instrument = name, epic, "Error fetching historic data: {}", e);
            PipelineError::FetchFailed {
                instrument: name.to_string(),
                stage: FetchStage::PriceHistory,
                reason: e.to_string(),
            }
        })?;

    let series = to_price_series(response);
    if series.is_empty() {
        warn!(instrument = name, epic, "No valid close prices found");
        return Err(PipelineError::NoValidPrices(name.to_string()));
    }

    info!(instrument = name, bars = series.len(), "Price history fetched");
    Ok(series)
}

/// Bars without a closing bid are dropped, not zero-filled
pub fn to_price_series(response: PriceHistoryResponse) -> PriceSeries {
    let bars = response
        .prices
        .unwrap_or_default()
        .into_iter()
        .filter_map(|bar| {
            let close = bar.close_bid()?;
            Some(PriceBar {
                close,
                high: bar.high_bid(),
                low: bar.low_bid(),
                volume: bar.last_traded_volume,
                timestamp: bar.snapshot_time(),
            })
        })
        .collect();

    PriceSeries::new(bars)
}
