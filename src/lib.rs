// Momentum indicators (RSI, MACD, MFI) for instruments quoted on the IG REST gateway
// Entry points are in services::indicator_service

pub mod api_client;
pub mod config;
pub mod error;
pub mod indicators;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;
