// src/providers/yahoo.rs

//! Yahoo Finance chart API (v8).
//!
//! The daily window asks for five daily bars, enough to find the previous
//! session close. The intraday window asks for today's 5-minute bars with
//! pre/post market included, and carries the last official close from the
//! chart metadata.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{RawSeries, Window};
use crate::providers::{ProviderError, QuoteProvider, send_text};

pub const ID: &str = "yahoo";

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    regular_market_time: Option<i64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBars>,
}

#[derive(Debug, Deserialize)]
struct QuoteBars {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Yahoo chart API client.
pub struct YahooProvider {
    client: Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: CHART_URL.to_string(),
        }
    }

    fn query(window: Window) -> [(&'static str, &'static str); 3] {
        match window {
            Window::Daily => [("range", "5d"), ("interval", "1d"), ("includePrePost", "false")],
            Window::Intraday => [("range", "1d"), ("interval", "5m"), ("includePrePost", "true")],
        }
    }
}

/// Turn a chart response body into a series for `window`.
fn parse_chart(body: &str, window: Window) -> Result<RawSeries, ProviderError> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = response.chart.error {
        let code = err.code.unwrap_or_default();
        let description = err.description.unwrap_or_default();
        return Err(if code.eq_ignore_ascii_case("not found") {
            ProviderError::NotFound
        } else {
            ProviderError::no_data(format!("{code}: {description}"))
        });
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ProviderError::no_data("empty chart result"))?;

    let mut samples = Vec::new();
    let mut last_ts = None;
    if let Some(bars) = result.indicators.quote.first() {
        for (i, close) in bars.close.iter().enumerate() {
            if let Some(v) = close.filter(|v| v.is_finite()) {
                samples.push(v);
                last_ts = result.timestamp.get(i).copied().or(last_ts);
            }
        }
    }

    let as_of = last_ts
        .or(result.meta.regular_market_time)
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now);

    let series = match RawSeries::from_samples(&samples, as_of) {
        Some(series) => series,
        None => {
            let price = result
                .meta
                .regular_market_price
                .ok_or_else(|| ProviderError::no_data("no closing prices"))?;
            RawSeries::point(price, as_of)
        }
    };

    // Intraday bars start after the last official close; daily bars already
    // contain it as the penultimate sample.
    let official_close = match window {
        Window::Intraday => result
            .meta
            .chart_previous_close
            .or(result.meta.previous_close),
        Window::Daily => result.meta.previous_close,
    };

    Ok(series.with_official_close(official_close))
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn id(&self) -> &str {
        ID
    }

    async fn fetch(&self, symbol: &str, window: Window) -> Result<RawSeries, ProviderError> {
        let url = format!("{}/{}", self.base_url, symbol);
        let body = send_text(self.client.get(&url).query(&Self::query(window))).await?;
        parse_chart(&body, window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BaselineRule;

    const DAILY: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "regularMarketPrice": 105.0, "regularMarketTime": 1760040000 },
                "timestamp": [1759795200, 1759881600, 1759968000, 1760054400],
                "indicators": { "quote": [{ "close": [98.0, null, 100.0, 105.0] }] }
            }],
            "error": null
        }
    }"#;

    const INTRADAY: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "regularMarketPrice": 100.0, "chartPreviousClose": 100.0 },
                "timestamp": [1760086800, 1760087100, 1760087400],
                "indicators": { "quote": [{ "close": [101.0, 102.5, null] }] }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_daily_prior_close() {
        let series = parse_chart(DAILY, Window::Daily).unwrap();
        assert_eq!(series.latest, 105.0);
        assert_eq!(series.baseline(BaselineRule::PriorClose), Some(100.0));
        assert_eq!(series.as_of.timestamp(), 1760054400);
    }

    #[test]
    fn test_parse_intraday_official_close() {
        let series = parse_chart(INTRADAY, Window::Intraday).unwrap();
        assert_eq!(series.latest, 102.5);
        assert_eq!(series.baseline(BaselineRule::OfficialClose), Some(100.0));
        assert_eq!(series.baseline(BaselineRule::FirstSample), Some(101.0));
    }

    #[test]
    fn test_parse_not_found() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert_eq!(
            parse_chart(body, Window::Daily).unwrap_err(),
            ProviderError::NotFound
        );
    }

    #[test]
    fn test_parse_falls_back_to_market_price() {
        let body = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":42.0,"regularMarketTime":1760040000},"indicators":{"quote":[{}]}}],"error":null}}"#;
        let series = parse_chart(body, Window::Daily).unwrap();
        assert_eq!(series.latest, 42.0);
        assert!(!series.has_usable_baseline(BaselineRule::PriorClose));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_chart("<html>", Window::Daily),
            Err(ProviderError::Parse(_))
        ));
    }
}
