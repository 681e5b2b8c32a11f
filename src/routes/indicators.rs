use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::config::parse_stock_list;
use crate::error::PipelineError;
use crate::models::IndicatorResult;
use crate::services::indicator_service::{self, IndicatorReport};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RsiQuery {
    pub stocks: Option<String>, // comma-separated: "crude,gold"
}

#[derive(Deserialize)]
pub struct ReportQuery {
    pub stock: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Latest RSI per instrument. Always 200: failures are reported per record.
pub async fn rsi_indicator(
    State(state): State<AppState>,
    Query(query): Query<RsiQuery>,
) -> Json<Vec<IndicatorResult>> {
    let requested = query
        .stocks
        .as_deref()
        .map(parse_stock_list)
        .filter(|names| !names.is_empty())
        .unwrap_or_else(|| state.default_stocks.as_ref().clone());

    Json(indicator_service::check_rsi_batch(&state.client, &requested).await)
}

/// Full indicator series for charting one instrument
pub async fn get_indicators(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<IndicatorReport>, (StatusCode, Json<ErrorResponse>)> {
    let stock = query.stock.trim();
    if stock.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "A stock name is required.".to_string(),
            }),
        ));
    }

    indicator_service::indicator_report(&state.client, stock)
        .await
        .map(Json)
        .map_err(|e| {
            let status = match e {
                PipelineError::InstrumentNotFound(_) | PipelineError::NoIdentifierAvailable(_) => {
                    StatusCode::NOT_FOUND
                }
                _ => StatusCode::BAD_GATEWAY,
            };
            (
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
        })
}
