use tracing::{error, info, warn};

use crate::api_client::{IgClient, MarketSearchResponse};
use crate::error::{FetchStage, PipelineError};
use crate::models::Session;

/// Look up the epic for `name`. The first match wins; IG's ordering is
/// trusted as is.
pub async fn resolve_epic(
    client: &IgClient,
    session: &Session,
    name: &str,
) -> Result<String, PipelineError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PipelineError::InstrumentNotFound(name.to_string()));
    }

    info!(instrument = name, "Searching for instrument in markets");

    let response = client
        .search_markets(session, name)
        .await
        .map_err(|e| {
            error!(instrument = name, "Error searching markets: {}", e);
            PipelineError::FetchFailed {
                instrument: name.to_string(),
                stage: FetchStage::MarketSearch,
                reason: e.to_string(),
            }
        })?;

    let epic = first_epic(name, response)?;
    info!(instrument = name, epic = %epic, "Instrument resolved");
    Ok(epic)
}

pub fn first_epic(name: &str, response: MarketSearchResponse) -> Result<String, PipelineError> {
    let markets = response.markets.unwrap_or_default();
    if markets.is_empty() {
        warn!(instrument = name, "No markets found");
        return Err(PipelineError::InstrumentNotFound(name.to_string()));
    }

    markets
        .into_iter()
        .filter_map(|m| m.epic)
        .find(|epic| !epic.trim().is_empty())
        .ok_or_else(|| {
            warn!(instrument = name, "Markets found but none carries an epic");
            PipelineError::NoIdentifierAvailable(name.to_string())
        })
}
