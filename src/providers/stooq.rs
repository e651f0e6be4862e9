// src/providers/stooq.rs

//! Stooq daily CSV downloads.
//!
//! Stooq only publishes daily bars; the intraday window is reported as
//! unsupported and the resolver moves on without counting it as a failure.

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{RawSeries, Window};
use crate::providers::{ProviderError, QuoteProvider, send_text};

pub const ID: &str = "stooq";

const DOWNLOAD_URL: &str = "https://stooq.com/q/d/l/";

/// Days of history requested; covers long weekends and holidays.
const LOOKBACK_DAYS: u64 = 10;

#[derive(Debug, Deserialize)]
struct DailyRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Close")]
    close: f64,
}

/// Stooq CSV client.
pub struct StooqProvider {
    client: Client,
}

impl StooqProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Parse a Stooq daily CSV body (oldest row first).
fn parse_daily_csv(body: &str) -> Result<RawSeries, ProviderError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("no data") {
        return Err(ProviderError::NotFound);
    }

    let mut reader = csv::Reader::from_reader(trimmed.as_bytes());
    let mut rows = Vec::new();
    for row in reader.deserialize::<DailyRow>() {
        rows.push(row.map_err(|e| ProviderError::parse(e.to_string()))?);
    }
    rows.sort_by_key(|r| r.date);

    let last = rows
        .last()
        .ok_or_else(|| ProviderError::no_data("empty CSV"))?;
    let as_of = last
        .date
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(Utc::now);

    let closes: Vec<f64> = rows.iter().map(|r| r.close).collect();
    RawSeries::from_samples(&closes, as_of)
        .ok_or_else(|| ProviderError::no_data("no finite closing prices"))
}

#[async_trait]
impl QuoteProvider for StooqProvider {
    fn id(&self) -> &str {
        ID
    }

    async fn fetch(&self, symbol: &str, window: Window) -> Result<RawSeries, ProviderError> {
        if window == Window::Intraday {
            return Err(ProviderError::unsupported("intraday window"));
        }

        let today = Utc::now().date_naive();
        let from = today
            .checked_sub_days(Days::new(LOOKBACK_DAYS))
            .unwrap_or(today);
        let d1 = from.format("%Y%m%d").to_string();
        let d2 = today.format("%Y%m%d").to_string();

        let request = self.client.get(DOWNLOAD_URL).query(&[
            ("s", symbol),
            ("i", "d"),
            ("d1", d1.as_str()),
            ("d2", d2.as_str()),
        ]);
        let body = send_text(request).await?;
        parse_daily_csv(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BaselineRule;

    #[test]
    fn test_parse_daily_csv() {
        let body = "Date,Open,High,Low,Close,Volume\n\
                    2025-10-08,99,101,98,100.0,1000\n\
                    2025-10-09,100,106,99,105.0,1200\n";
        let series = parse_daily_csv(body).unwrap();
        assert_eq!(series.latest, 105.0);
        assert_eq!(series.baseline(BaselineRule::PriorClose), Some(100.0));
        assert_eq!(series.as_of.date_naive().to_string(), "2025-10-09");
    }

    #[test]
    fn test_parse_no_data() {
        assert_eq!(parse_daily_csv("No data").unwrap_err(), ProviderError::NotFound);
    }

    #[test]
    fn test_parse_bad_row() {
        let body = "Date,Open,High,Low,Close,Volume\n2025-10-08,99,101,98,n/a,1000\n";
        assert!(matches!(
            parse_daily_csv(body),
            Err(ProviderError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_intraday_not_supported() {
        let provider = StooqProvider::new(Client::new());
        let err = provider.fetch("aapl.us", Window::Intraday).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unsupported(_)));
    }
}
