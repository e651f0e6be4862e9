// src/providers/naver.rs

//! Current weather scraped from the Naver search result page.
//!
//! The symbol is the location query (e.g. "성동구"). The reading has no
//! comparison value; the condition text becomes the series note.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use scraper::{Html, Selector};

use crate::models::{RawSeries, Window};
use crate::providers::{ProviderError, QuoteProvider, send_text};

pub const ID: &str = "naver";

const SEARCH_URL: &str = "https://search.naver.com/search.naver";

const TEMPERATURE_SELECTOR: &str = "div.temperature_text";
const CONDITION_SELECTOR: &str = "span.weather_before_text";

/// Naver weather scraper.
pub struct NaverWeatherProvider {
    client: Client,
}

impl NaverWeatherProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn selector(css: &str) -> Result<Selector, ProviderError> {
    Selector::parse(css).map_err(|e| ProviderError::parse(format!("selector {css}: {e}")))
}

fn element_text(document: &Html, css: &str) -> Result<Option<String>, ProviderError> {
    let sel = selector(css)?;
    Ok(document
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string()))
}

/// Extract temperature and condition from a search result page.
fn parse_weather(html: &str, as_of: DateTime<Utc>) -> Result<RawSeries, ProviderError> {
    let document = Html::parse_document(html);

    let raw = element_text(&document, TEMPERATURE_SELECTOR)?
        .ok_or_else(|| ProviderError::parse("temperature element missing"))?;
    let cleaned = raw.replace("현재 온도", "").replace('°', "");
    let temperature: f64 = cleaned
        .trim()
        .parse()
        .map_err(|_| ProviderError::parse(format!("temperature '{}'", cleaned.trim())))?;

    let series = RawSeries::point(temperature, as_of);
    Ok(match element_text(&document, CONDITION_SELECTOR)? {
        Some(condition) => series.with_note(condition),
        None => series,
    })
}

#[async_trait]
impl QuoteProvider for NaverWeatherProvider {
    fn id(&self) -> &str {
        ID
    }

    async fn fetch(&self, symbol: &str, _window: Window) -> Result<RawSeries, ProviderError> {
        let query = format!("{symbol} 날씨");
        let body = send_text(self.client.get(SEARCH_URL).query(&[("query", query.as_str())])).await?;
        parse_weather(&body, Utc::now())
    }
}
