// src/providers/alternative_me.rs

//! Crypto Fear & Greed index from alternative.me.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{RawSeries, Window};
use crate::providers::{ProviderError, QuoteProvider, send_text};

pub const ID: &str = "alternative_me";

const FNG_URL: &str = "https://api.alternative.me/fng/";

#[derive(Debug, Deserialize)]
struct FngResponse {
    #[serde(default)]
    data: Vec<FngPoint>,
}

/// The API reports numbers as strings.
#[derive(Debug, Deserialize)]
struct FngPoint {
    value: String,
    value_classification: Option<String>,
    timestamp: String,
}

/// alternative.me client.
pub struct AlternativeMeProvider {
    client: Client,
}

impl AlternativeMeProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, ProviderError> {
    raw.trim()
        .parse()
        .map_err(|_| ProviderError::parse(format!("{field} '{raw}'")))
}

/// Parse a response whose points are ordered newest first.
fn parse_fng(body: &str) -> Result<RawSeries, ProviderError> {
    let response: FngResponse = serde_json::from_str(body)?;
    let newest = response
        .data
        .first()
        .ok_or_else(|| ProviderError::no_data("empty index history"))?;

    let ts: i64 = parse_number("timestamp", &newest.timestamp)?;
    let as_of = DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now);

    let mut values = response
        .data
        .iter()
        .map(|p| parse_number::<f64>("value", &p.value))
        .collect::<Result<Vec<_>, _>>()?;
    values.reverse();

    let series = RawSeries::from_samples(&values, as_of)
        .ok_or_else(|| ProviderError::no_data("no finite values"))?;
    // The index is published once a day, so the previous reading is its close.
    let close = series.prior;
    let series = series.with_official_close(close);
    Ok(match &newest.value_classification {
        Some(label) => series.with_note(label.as_str()),
        None => series,
    })
}

#[async_trait]
impl QuoteProvider for AlternativeMeProvider {
    fn id(&self) -> &str {
        ID
    }

    async fn fetch(&self, _symbol: &str, _window: Window) -> Result<RawSeries, ProviderError> {
        let body = send_text(self.client.get(FNG_URL).query(&[("limit", "2")])).await?;
        parse_fng(&body)
    }
}
