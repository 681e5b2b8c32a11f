// In-process stand-in for the IG gateway, served by axum on an ephemeral port

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::api_client::IgClient;
use crate::config::{Credentials, IgConfig};

pub const API_KEY: &str = "test-api-key";

pub struct StubIg {
    session_status: StatusCode,
    session_headers: Vec<(&'static str, &'static str)>,
    markets: HashMap<String, Value>,
    prices: HashMap<String, Value>,
    slow_epics: Vec<String>,
    requests: Mutex<Vec<String>>,
}

impl StubIg {
    pub fn new() -> Self {
        Self {
            session_status: StatusCode::OK,
            session_headers: vec![("cst", "client-token"), ("x-security-token", "security-token")],
            markets: HashMap::new(),
            prices: HashMap::new(),
            slow_epics: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn session_status(mut self, status: StatusCode) -> Self {
        self.session_status = status;
        self
    }

    pub fn without_security_token(mut self) -> Self {
        self.session_headers.retain(|(name, _)| *name != "x-security-token");
        self
    }

    pub fn market(mut self, term: &str, body: Value) -> Self {
        self.markets.insert(term.to_string(), body);
        self
    }

    /// Registers a single-epic search result and its price payload
    pub fn instrument(self, term: &str, epic: &str, prices: Value) -> Self {
        self.market(term, json!({"markets": [{"epic": epic, "instrumentName": term}]}))
            .prices(epic, prices)
    }

    pub fn prices(mut self, epic: &str, body: Value) -> Self {
        self.prices.insert(epic.to_string(), body);
        self
    }

    pub fn slow(mut self, epic: &str) -> Self {
        self.slow_epics.push(epic.to_string());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, line: String) {
        self.requests.lock().unwrap().push(line);
    }

    /// Serves the stub and returns it together with its base URL
    pub async fn spawn(self) -> (Arc<Self>, String) {
        let stub = Arc::new(self);
        let app = Router::new()
            .route("/session", post(session))
            .route("/markets", get(markets))
            .route("/prices/:epic", get(prices))
            .with_state(stub.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (stub, format!("http://{}", addr))
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("x-ig-api-key").map(|v| v == API_KEY).unwrap_or(false)
        && headers.get("cst").map(|v| v == "client-token").unwrap_or(false)
        && headers.get("x-security-token").map(|v| v == "security-token").unwrap_or(false)
}

fn version(headers: &HeaderMap) -> String {
    headers
        .get("version")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

async fn session(
    State(stub): State<Arc<StubIg>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    stub.record(format!("POST /session v{}", version(&headers)));

    if headers.get("x-ig-api-key").map(|v| v != API_KEY).unwrap_or(true)
        || body["identifier"] != "trader"
        || body["password"] != "secret"
    {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"errorCode": "error.security.invalid-details"})),
        )
            .into_response();
    }

    let mut response = (stub.session_status, Json(json!({"accountType": "CFD"}))).into_response();
    for &(name, value) in &stub.session_headers {
        response
            .headers_mut()
            .insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    response
}

async fn markets(
    State(stub): State<Arc<StubIg>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let term = query.get("searchTerm").cloned().unwrap_or_default();
    stub.record(format!("GET /markets {} v{}", term, version(&headers)));

    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let body = stub
        .markets
        .get(&term)
        .cloned()
        .unwrap_or_else(|| json!({"markets": []}));
    Json(body).into_response()
}

async fn prices(
    State(stub): State<Arc<StubIg>>,
    Path(epic): Path<String>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut keys: Vec<&String> = query.keys().collect();
    keys.sort();
    stub.record(format!("GET /prices/{} v{} {:?}", epic, version(&headers), keys));

    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if stub.slow_epics.contains(&epic) {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    match stub.prices.get(&epic) {
        Some(body) => Json(body.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"errorCode": "error.error.price-history.io-error"})),
        )
            .into_response(),
    }
}

pub fn test_config(base_url: &str) -> IgConfig {
    let credentials = Credentials {
        api_key: API_KEY.to_string(),
        username: "trader".to_string(),
        password: "secret".to_string(),
    };
    let mut config = IgConfig::new(credentials, base_url);
    config.request_timeout = Duration::from_millis(500);
    config
}

pub fn test_client(base_url: &str) -> IgClient {
    IgClient::new(test_config(base_url)).unwrap()
}

/// IG-shaped price payload with full OHLC and volume for each close
pub fn price_payload(closes: &[f64]) -> Value {
    let prices: Vec<Value> = closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            json!({
                "snapshotTimeUTC": format!("2024-03-01T12:00:{:02}", i % 60),
                "closePrice": {"bid": close, "ask": close + 0.04, "lastTraded": null},
                "highPrice": {"bid": close + 0.5, "ask": close + 0.54, "lastTraded": null},
                "lowPrice": {"bid": close - 0.5, "ask": close - 0.46, "lastTraded": null},
                "lastTradedVolume": 10 + i
            })
        })
        .collect();
    json!({ "prices": prices })
}
