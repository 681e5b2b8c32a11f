use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub mod indicators;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(indicators::health))
        .route("/rsi_indicator", get(indicators::rsi_indicator))
        .route("/indicators", get(indicators::get_indicators));

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
