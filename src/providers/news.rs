// src/providers/news.rs

//! Cosmetic enrichment: latest headline and next earnings date.
//!
//! Enrichment never fails a run. Every error is logged at debug level and
//! the corresponding part of the annotation is left empty.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

use crate::models::{Annotation, Headline};
use crate::providers::{ProviderError, send_json};
use crate::services::Pacer;

const SEARCH_URL: &str = "https://query2.finance.yahoo.com/v1/finance/search";
const EARNINGS_URL: &str = "https://api.nasdaq.com/api/analyst";

/// Pacing keys, one per upstream.
pub const SEARCH_KEY: &str = "yahoo_search";
pub const EARNINGS_KEY: &str = "nasdaq";

static ANNOUNCEMENT_DATE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"([A-Z][a-z]{2}) (\d{1,2}), (\d{4})").ok());

/// Adds context to an instrument that resolved successfully.
///
/// Every upstream call waits on `pacer` under that upstream's own key.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn annotate(&self, symbol: &str, pacer: &Pacer) -> Annotation;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNews>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNews {
    title: String,
    publisher: Option<String>,
    link: Option<String>,
    provider_publish_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct EarningsResponse {
    data: Option<EarningsData>,
}

#[derive(Debug, Deserialize)]
struct EarningsData {
    announcement: Option<String>,
}

/// Yahoo search headlines plus Nasdaq earnings dates.
pub struct NewsEnricher {
    client: Client,
    search_url: String,
    earnings_url: String,
}

impl NewsEnricher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            search_url: SEARCH_URL.to_string(),
            earnings_url: EARNINGS_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_endpoints(mut self, search_url: &str, earnings_url: &str) -> Self {
        self.search_url = search_url.to_string();
        self.earnings_url = earnings_url.to_string();
        self
    }

    async fn headline(&self, symbol: &str) -> Result<Option<Headline>, ProviderError> {
        let request = self.client.get(&self.search_url).query(&[
            ("q", symbol),
            ("quotesCount", "0"),
            ("newsCount", "5"),
        ]);
        let response: SearchResponse = send_json(request).await?;
        Ok(latest_headline(response))
    }

    async fn next_event(&self, symbol: &str) -> Result<Option<NaiveDate>, ProviderError> {
        let url = format!("{}/{}/earnings-date", self.earnings_url, symbol.to_uppercase());
        let request = self
            .client
            .get(&url)
            .header("Accept", "application/json, text/plain, */*");
        let response: EarningsResponse = send_json(request).await?;
        Ok(response
            .data
            .and_then(|d| d.announcement)
            .and_then(|text| parse_announcement(&text)))
    }
}

fn latest_headline(response: SearchResponse) -> Option<Headline> {
    response
        .news
        .into_iter()
        .filter(|n| !n.title.trim().is_empty())
        .max_by_key(|n| n.provider_publish_time.unwrap_or(i64::MIN))
        .map(|n| Headline {
            title: n.title.trim().to_string(),
            publisher: n.publisher,
            link: n.link,
            published_at: n
                .provider_publish_time
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
        })
}

/// Pull the date out of text like "Earnings announcement* for NVDA: Nov 19, 2025".
fn parse_announcement(text: &str) -> Option<NaiveDate> {
    let caps = ANNOUNCEMENT_DATE.as_ref()?.captures(text)?;
    let normalized = format!("{} {} {}", &caps[1], &caps[2], &caps[3]);
    NaiveDate::parse_from_str(&normalized, "%b %d %Y").ok()
}

#[async_trait]
impl Enricher for NewsEnricher {
    async fn annotate(&self, symbol: &str, pacer: &Pacer) -> Annotation {
        pacer.wait(SEARCH_KEY).await;
        let headline = self.headline(symbol).await.unwrap_or_else(|e| {
            log::debug!("Headline lookup failed for {}: {}", symbol, e);
            None
        });
        pacer.wait(EARNINGS_KEY).await;
        let next_event = self.next_event(symbol).await.unwrap_or_else(|e| {
            log::debug!("Earnings date lookup failed for {}: {}", symbol, e);
            None
        });
        Annotation {
            headline,
            next_event,
        }
    }
}
