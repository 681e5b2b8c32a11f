use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::api_client::IgClient;
use crate::error::PipelineError;
use crate::indicators::{MACD, MacdSeries, MFI, RSI};
use crate::models::{IndicatorResult, Instrument, PriceSeries};
use crate::services::{auth_service, market_service, price_service};

/// authenticate -> resolve -> fetch, strictly in that order
pub async fn load_series(
    client: &IgClient,
    name: &str,
) -> Result<(Instrument, PriceSeries), PipelineError> {
    let mut instrument = Instrument::new(name.trim());

    let session = auth_service::authenticate(client).await?;
    let epic = market_service::resolve_epic(client, &session, &instrument.name).await?;
    let series = price_service::fetch_price_series(
        client,
        &session,
        &instrument.name,
        &epic,
        &client.config().price_window,
    )
    .await?;

    instrument.epic = Some(epic);
    Ok((instrument, series))
}

/// Latest RSI for one instrument. Always returns a record: failures become
/// the error variant with a user-facing message.
pub async fn check_rsi(client: &IgClient, name: &str) -> IndicatorResult {
    info!(instrument = name, "Fetching RSI data");
    let rsi = RSI::new(client.config().rsi_period);

    let outcome = async {
        let (instrument, series) = load_series(client, name).await?;
        let value = rsi.latest(&series.closes())?;
        Ok::<_, PipelineError>((instrument, value))
    }
    .await;

    match outcome {
        Ok((instrument, value)) => {
            info!(instrument = name, rsi = value, "RSI calculation completed");
            IndicatorResult::value(name, instrument.epic, value)
        }
        Err(e) => {
            match e.detail() {
                Some(detail) => warn!(instrument = name, detail, "RSI unavailable: {}", e),
                None => warn!(instrument = name, "RSI unavailable: {}", e),
            }
            IndicatorResult::error(name, e.to_string())
        }
    }
}

/// Runs one pipeline per instrument concurrently. Results come back in
/// request order.
pub async fn check_rsi_batch(client: &IgClient, names: &[String]) -> Vec<IndicatorResult> {
    let handles: Vec<_> = names
        .iter()
        .map(|name| {
            let client = client.clone();
            let name = name.clone();
            tokio::spawn(async move { check_rsi(&client, &name).await })
        })
        .collect();

    let mut results = Vec::with_capacity(names.len());
    for (name, handle) in names.iter().zip(handles) {
        match handle.await {
            Ok(result) => results.push(result),
            Err(e) => {
                error!(instrument = %name, "RSI task failed: {}", e);
                results.push(IndicatorResult::error(
                    name.as_str(),
                    "An internal error occurred while processing this instrument.",
                ));
            }
        }
    }
    results
}

/// Everything a chart needs for one instrument
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorReport {
    pub stock: String,
    pub epic: Option<String>,
    pub timestamps: Vec<Option<DateTime<Utc>>>,
    pub closes: Vec<f64>,
    pub rsi: Vec<Option<f64>>,
    pub rsi_latest: Option<f64>,
    pub macd: Option<MacdSeries>,
    pub mfi: Option<Vec<Option<f64>>>,
}

fn defined(values: Vec<f64>) -> Vec<Option<f64>> {
    values
        .into_iter()
        .map(|v| if v.is_nan() { None } else { Some(v) })
        .collect()
}

pub fn build_report(instrument: Instrument, series: &PriceSeries, rsi_period: usize) -> IndicatorReport {
    let closes = series.closes();
    let rsi = RSI::new(rsi_period);

    let mfi = if series.has_volume_data() {
        MFI::default().calculate(series.bars()).ok().map(defined)
    } else {
        None
    };

    IndicatorReport {
        stock: instrument.name,
        epic: instrument.epic,
        timestamps: series.bars().iter().map(|b| b.timestamp).collect(),
        rsi: defined(rsi.calculate(&closes)),
        rsi_latest: rsi.latest(&closes).ok(),
        macd: MACD::default().calculate(&closes).ok(),
        mfi,
        closes,
    }
}

pub async fn indicator_report(client: &IgClient, name: &str) -> Result<IndicatorReport, PipelineError> {
    let (instrument, series) = load_series(client, name).await?;
    Ok(build_report(instrument, &series, client.config().rsi_period))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Outcome;
    use crate::test_support::{price_payload, test_client, StubIg};
    use serde_json::json;

    const EXAMPLE: [f64; 14] = [
        10.0, 12.0, 11.0, 13.0, 15.0, 14.0, 16.0, 18.0, 17.0, 19.0, 21.0, 20.0, 22.0, 24.0,
    ];

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[tokio::test]
    async fn test_check_rsi_end_to_end() {
        let mut closes = EXAMPLE.to_vec();
        closes.push(23.0);
        let (stub, base_url) = StubIg::new()
            .instrument("crude", "CC.D.CL.UNC.IP", price_payload(&closes))
            .spawn()
            .await;

        let result = check_rsi(&test_client(&base_url), "crude").await;

        assert_eq!(result.stock, "crude");
        assert_eq!(result.epic.as_deref(), Some("CC.D.CL.UNC.IP"));
        let value = result.as_value().unwrap();
        assert!((value - 100.0 * 18.0 / 23.0).abs() < 1e-9);
        assert_eq!(stub.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_check_rsi_insufficient_data() {
        let (_stub, base_url) = StubIg::new()
            .instrument("crude", "EPIC", price_payload(&EXAMPLE))
            .spawn()
            .await;

        let result = check_rsi(&test_client(&base_url), "crude").await;
        assert_eq!(
            result.outcome,
            Outcome::Error(
                "Indicator calculation failed: not enough price data: need at least 15 points, have 14."
                    .to_string()
            )
        );
        assert_eq!(result.epic, None);
    }

    #[tokio::test]
    async fn test_check_rsi_auth_failure_becomes_record() {
        let (stub, base_url) = StubIg::new().without_security_token().spawn().await;

        let result = check_rsi(&test_client(&base_url), "crude").await;
        assert_eq!(
            result.as_error(),
            Some("Unable to authenticate with the broker, please try again later.")
        );
        // Fails fast: no search after a bad login
        assert_eq!(stub.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_check_rsi_unknown_instrument() {
        let (_stub, base_url) = StubIg::new().spawn().await;
        let result = check_rsi(&test_client(&base_url), "unobtainium").await;
        assert_eq!(result.as_error(), Some("No market found for \"unobtainium\"."));
    }

    #[tokio::test]
    async fn test_check_rsi_no_valid_prices() {
        let (_stub, base_url) = StubIg::new()
            .instrument("crude", "EPIC", json!({"prices": [{"closePrice": {"bid": null}}]}))
            .spawn()
            .await;
        let result = check_rsi(&test_client(&base_url), "crude").await;
        assert_eq!(
            result.as_error(),
            Some("No valid close prices found for \"crude\".")
        );
    }

    #[tokio::test]
    async fn test_batch_keeps_request_order() {
        let (stub, base_url) = StubIg::new()
            .instrument("gold", "CS.D.USCGC.TODAY.IP", price_payload(&rising(20)))
            .instrument("crude", "CC.D.CL.UNC.IP", price_payload(&[1.0, 2.0]))
            .spawn()
            .await;
        let names: Vec<String> = ["crude", "missing", "gold"].iter().map(|s| s.to_string()).collect();

        let results = check_rsi_batch(&test_client(&base_url), &names).await;

        let stocks: Vec<&str> = results.iter().map(|r| r.stock.as_str()).collect();
        assert_eq!(stocks, vec!["crude", "missing", "gold"]);
        assert!(results[0].as_error().is_some());
        assert_eq!(results[1].as_error(), Some("No market found for \"missing\"."));
        assert_eq!(results[2].as_value(), Some(100.0));

        // Every instrument logs in on its own
        let logins = stub
            .requests()
            .iter()
            .filter(|r| r.starts_with("POST /session"))
            .count();
        assert_eq!(logins, 3);
    }

    #[tokio::test]
    async fn test_batch_empty() {
        let client = test_client("http://127.0.0.1:9");
        assert!(check_rsi_batch(&client, &[]).await.is_empty());
    }

    #[test]
    fn test_build_report_with_volume() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + ((i * 3) % 7) as f64).collect();
        let series = price_service::to_price_series(serde_json::from_value(price_payload(&closes)).unwrap());
        let instrument = Instrument {
            name: "crude".into(),
            epic: Some("EPIC".into()),
        };

        let report = build_report(instrument, &series, 14);

        assert_eq!(report.closes, closes);
        assert_eq!(report.rsi.len(), 30);
        assert!(report.rsi[..14].iter().all(Option::is_none));
        assert!(report.rsi[14..].iter().all(Option::is_some));
        assert_eq!(report.rsi_latest, report.rsi[29]);
        assert_eq!(report.macd.as_ref().map(|m| m.macd.len()), Some(30));
        assert_eq!(report.mfi.as_ref().map(Vec::len), Some(30));
        assert!(report.timestamps.iter().all(Option::is_some));
    }

    #[test]
    fn test_build_report_short_close_only_series() {
        let series = PriceSeries::from_closes(&[1.0, 2.0, 3.0]);
        let report = build_report(Instrument::new("x"), &series, 14);

        assert_eq!(report.rsi_latest, None);
        assert!(report.rsi.iter().all(Option::is_none));
        assert!(report.mfi.is_none());
        assert!(report.macd.is_some());
    }

    #[tokio::test]
    async fn test_indicator_report_end_to_end() {
        let (_stub, base_url) = StubIg::new()
            .instrument("gold", "EPIC", price_payload(&rising(20)))
            .spawn()
            .await;

        let report = indicator_report(&test_client(&base_url), "gold").await.unwrap();
        assert_eq!(report.epic.as_deref(), Some("EPIC"));
        assert_eq!(report.rsi_latest, Some(100.0));
        assert_eq!(report.mfi.unwrap()[19], Some(100.0));
    }
}
