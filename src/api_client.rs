use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{IgConfig, Lookback, PriceWindow};
use crate::models::Session;

const SESSION_API_VERSION: &str = "1";
const MARKETS_API_VERSION: &str = "1";
const PRICES_API_VERSION: &str = "3";
const IG_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Serialize)]
struct SessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct MarketSearchResponse {
    pub markets: Option<Vec<MarketSummary>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub epic: Option<String>,
    pub instrument_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PriceHistoryResponse {
    pub prices: Option<Vec<IgPriceBar>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgPriceBar {
    pub close_price: Option<IgPrice>,
    pub high_price: Option<IgPrice>,
    pub low_price: Option<IgPrice>,
    pub last_traded_volume: Option<f64>,
    #[serde(rename = "snapshotTimeUTC")]
    pub snapshot_time_utc: Option<String>,
}

/// Bid/ask pair as IG reports it; any side may be null
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgPrice {
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last_traded: Option<f64>,
}

impl IgPriceBar {
    pub fn close_bid(&self) -> Option<f64> {
        self.close_price.as_ref().and_then(|p| p.bid)
    }

    pub fn high_bid(&self) -> Option<f64> {
        self.high_price.as_ref().and_then(|p| p.bid)
    }

    pub fn low_bid(&self) -> Option<f64> {
        self.low_price.as_ref().and_then(|p| p.bid)
    }

    pub fn snapshot_time(&self) -> Option<DateTime<Utc>> {
        self.snapshot_time_utc
            .as_deref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, IG_TIME_FORMAT).ok())
            .map(|t| t.and_utc())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("response is missing the {0} header")]
    MissingHeader(&'static str),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::ParseError(e.to_string())
        } else {
            ApiError::RequestFailed(e.to_string())
        }
    }
}

/// Thin client over the IG REST gateway. Cheap to clone; clones share the
/// connection pool and the read-only configuration.
#[derive(Clone)]
pub struct IgClient {
    client: reqwest::Client,
    config: Arc<IgConfig>,
}

impl IgClient {
    pub fn new(config: IgConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("ig-momentum/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &IgConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    fn authed_get(&self, url: &str, session: &Session, version: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("X-IG-API-KEY", &self.config.credentials.api_key)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("CST", &session.client_token)
            .header("X-SECURITY-TOKEN", &session.security_token)
            .header("Version", version)
    }

    /// POST /session. Tokens come back in the response headers.
    pub async fn create_session(&self) -> Result<Session, ApiError> {
        let credentials = &self.config.credentials;
        let body = SessionRequest {
            identifier: &credentials.username,
            password: &credentials.password,
        };

        let response = self
            .client
            .post(self.url("session"))
            .header("X-IG-API-KEY", &credentials.api_key)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("Version", SESSION_API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        session_from_headers(response.headers())
    }

    /// GET /markets?searchTerm=..
    pub async fn search_markets(
        &self,
        session: &Session,
        search_term: &str,
    ) -> Result<MarketSearchResponse, ApiError> {
        let url = self.url("markets");
        debug!(search_term, "searching markets");

        let response = self
            .authed_get(&url, session, MARKETS_API_VERSION)
            .query(&[("searchTerm", search_term)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }

    /// GET /prices/{epic} bounded by `window`
    pub async fn fetch_price_history(
        &self,
        session: &Session,
        epic: &str,
        window: &PriceWindow,
    ) -> Result<PriceHistoryResponse, ApiError> {
        let url = prices_url(&self.config.base_url, epic)?;
        let query = price_query(window, Utc::now());
        debug!(epic, ?query, "fetching price history");

        let response = self
            .authed_get(url.as_str(), session, PRICES_API_VERSION)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::ParseError(format!("price history: {}", e)))
    }
}

/// Both tokens must be present and non-empty, whatever the status said
pub fn session_from_headers(headers: &HeaderMap) -> Result<Session, ApiError> {
    let token = |name: &'static str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or(ApiError::MissingHeader(name))
    };

    Ok(Session {
        client_token: token("CST")?,
        security_token: token("X-SECURITY-TOKEN")?,
        api_version: SESSION_API_VERSION.to_string(),
    })
}

/// `{base}/prices/{epic}` with the epic escaped as a single path segment
pub fn prices_url(base_url: &str, epic: &str) -> Result<reqwest::Url, ApiError> {
    let mut url = reqwest::Url::parse(base_url)
        .map_err(|e| ApiError::RequestFailed(format!("invalid base URL {}: {}", base_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::RequestFailed(format!("base URL {} cannot take a path", base_url)))?
        .pop_if_empty()
        .push("prices")
        .push(epic);
    Ok(url)
}

/// Query string for a price request, in the order IG documents it
pub fn price_query(window: &PriceWindow, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
    let mut query = vec![("resolution", window.resolution.clone())];

    if let Lookback::Trailing(span) = window.lookback {
        // Spans past chrono's range fall back to a count-based request
        if let Some(from) = now.checked_sub_signed(span) {
            query.push(("from", from.format(IG_TIME_FORMAT).to_string()));
            query.push(("to", now.format(IG_TIME_FORMAT).to_string()));
        }
    }

    query.push(("max", window.max_results.to_string()));
    query.push(("pageSize", window.page_size.to_string()));
    query.push(("pageNumber", window.page_number.to_string()));
    query
}
