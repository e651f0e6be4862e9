// src/providers/open_meteo.rs

//! Current conditions from the Open-Meteo forecast API.
//!
//! The symbol is `"lat,lon"`. The WMO weather code is translated into the
//! same short Korean condition words the Naver page uses.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{RawSeries, Window};
use crate::providers::{ProviderError, QuoteProvider, send_text};

pub const ID: &str = "open_meteo";

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<Current>,
}

#[derive(Debug, Deserialize)]
struct Current {
    time: String,
    temperature_2m: Option<f64>,
    weather_code: Option<u8>,
}

/// Open-Meteo client.
pub struct OpenMeteoProvider {
    client: Client,
}

impl OpenMeteoProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Split `"lat,lon"` into validated coordinates.
fn parse_coordinates(symbol: &str) -> Result<(f64, f64), ProviderError> {
    let invalid = || ProviderError::InvalidSymbol(symbol.to_string());
    let (lat, lon) = symbol.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(invalid());
    }
    Ok((lat, lon))
}

/// WMO weather interpretation code to a condition word.
fn describe(code: u8) -> &'static str {
    match code {
        0 => "맑음",
        1 | 2 => "구름조금",
        3 => "흐림",
        45 | 48 => "안개",
        51..=57 => "이슬비",
        61..=67 => "비",
        71..=77 => "눈",
        80..=82 => "소나기",
        85 | 86 => "눈 소나기",
        95..=99 => "뇌우",
        _ => "알 수 없음",
    }
}

fn parse_forecast(body: &str) -> Result<RawSeries, ProviderError> {
    let response: ForecastResponse = serde_json::from_str(body)?;
    let current = response
        .current
        .ok_or_else(|| ProviderError::no_data("missing current block"))?;
    let temperature = current
        .temperature_2m
        .ok_or_else(|| ProviderError::no_data("missing temperature"))?;

    // Times are GMT when no timezone is requested.
    let as_of = NaiveDateTime::parse_from_str(&current.time, "%Y-%m-%dT%H:%M")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now());

    let series = RawSeries::point(temperature, as_of);
    Ok(match current.weather_code {
        Some(code) => series.with_note(describe(code)),
        None => series,
    })
}

#[async_trait]
impl QuoteProvider for OpenMeteoProvider {
    fn id(&self) -> &str {
        ID
    }

    async fn fetch(&self, symbol: &str, _window: Window) -> Result<RawSeries, ProviderError> {
        let (lat, lon) = parse_coordinates(symbol)?;
        let request = self.client.get(FORECAST_URL).query(&[
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("current", "temperature_2m,weather_code".to_string()),
        ]);
        let body = send_text(request).await?;
        parse_forecast(&body)
    }
}
