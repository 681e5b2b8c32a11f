use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://demo-api.ig.com/gateway/deal";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LOOKBACK_MINUTES: i64 = 5;
const MAX_LOOKBACK_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Static IG account credentials
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How far back a price request reaches
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookback {
    /// Explicit `from`/`to` range ending now
    Trailing(chrono::Duration),
    /// No time bound; page size and max results cap the data
    Count,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceWindow {
    pub resolution: String,
    pub lookback: Lookback,
    pub page_size: u32,
    pub page_number: u32,
    pub max_results: u32,
}

impl Default for PriceWindow {
    /// Last five minutes of per-second bars
    fn default() -> Self {
        Self {
            resolution: "SECOND".to_string(),
            lookback: Lookback::Trailing(chrono::Duration::minutes(DEFAULT_LOOKBACK_MINUTES)),
            page_size: 60,
            page_number: 1,
            max_results: 60,
        }
    }
}

/// Everything a pipeline run needs to talk to IG
#[derive(Debug, Clone)]
pub struct IgConfig {
    pub credentials: Credentials,
    pub base_url: String,
    pub request_timeout: Duration,
    pub price_window: PriceWindow,
    pub rsi_period: usize,
}

impl IgConfig {
    pub fn new(credentials: Credentials, base_url: impl Into<String>) -> Self {
        Self {
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            price_window: PriceWindow::default(),
            rsi_period: crate::indicators::rsi::DEFAULT_PERIOD,
        }
    }
}

/// Process configuration for the HTTP server binary
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ig: IgConfig,
    pub bind_addr: String,
    pub default_stocks: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let credentials = Credentials {
            api_key: required("IG_API_KEY")?,
            username: required("IG_USERNAME")?,
            password: required("IG_PASSWORD")?,
        };
        let base_url = lookup("IG_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut ig = IgConfig::new(credentials, base_url);
        ig.request_timeout =
            Duration::from_secs(parse_or(&lookup, "IG_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?);
        ig.rsi_period = match parse_or(&lookup, "RSI_PERIOD", ig.rsi_period)? {
            0 => {
                return Err(ConfigError::Invalid {
                    key: "RSI_PERIOD",
                    value: "0".to_string(),
                })
            }
            period => period,
        };

        let window = &mut ig.price_window;
        if let Some(resolution) = lookup("IG_RESOLUTION") {
            window.resolution = resolution.trim().to_uppercase();
        }
        let minutes: i64 = parse_or(&lookup, "IG_LOOKBACK_MINUTES", DEFAULT_LOOKBACK_MINUTES)?;
        window.lookback = match minutes {
            0 => Lookback::Count,
            m if m > 0 && m <= MAX_LOOKBACK_MINUTES => match chrono::Duration::try_minutes(m) {
                Some(span) => Lookback::Trailing(span),
                None => {
                    return Err(ConfigError::Invalid {
                        key: "IG_LOOKBACK_MINUTES",
                        value: minutes.to_string(),
                    })
                }
            },
            _ => {
                return Err(ConfigError::Invalid {
                    key: "IG_LOOKBACK_MINUTES",
                    value: minutes.to_string(),
                })
            }
        };
        window.page_size = parse_or(&lookup, "IG_PAGE_SIZE", window.page_size)?;
        window.page_number = parse_or(&lookup, "IG_PAGE_NUMBER", window.page_number)?;
        window.max_results = parse_or(&lookup, "IG_MAX_RESULTS", window.max_results)?;

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let default_stocks = parse_stock_list(
            &lookup("DEFAULT_STOCKS").unwrap_or_else(|| "crude".to_string()),
        );

        Ok(Self {
            ig,
            bind_addr,
            default_stocks,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

/// Comma separated instrument names, blanks dropped
pub fn parse_stock_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
