// src/providers/cnn.rs

//! CNN Business Fear & Greed index.
//!
//! CNN answers obvious bots with 418/403, which the status mapping reports
//! as rate limiting. The symbol is ignored; there is a single index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{RawSeries, Window};
use crate::providers::{ProviderError, QuoteProvider, send_text};

pub const ID: &str = "cnn";

const GRAPH_URL: &str = "https://production.dataviz.cnn.io/index/fearandgreed/graphdata";

#[derive(Debug, Deserialize)]
struct GraphData {
    fear_and_greed: CurrentStats,
}

#[derive(Debug, Deserialize)]
struct CurrentStats {
    score: f64,
    rating: Option<String>,
    timestamp: Option<String>,
    previous_close: Option<f64>,
}

/// CNN Fear & Greed client.
pub struct CnnProvider {
    client: Client,
}

impl CnnProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn parse_graph(body: &str) -> Result<RawSeries, ProviderError> {
    let data: GraphData = serde_json::from_str(body)?;
    let stats = data.fear_and_greed;
    let as_of = stats
        .timestamp
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let series = RawSeries::point(stats.score, as_of).with_official_close(stats.previous_close);
    Ok(match stats.rating {
        Some(rating) => series.with_note(rating),
        None => series,
    })
}

#[async_trait]
impl QuoteProvider for CnnProvider {
    fn id(&self) -> &str {
        ID
    }

    async fn fetch(&self, _symbol: &str, _window: Window) -> Result<RawSeries, ProviderError> {
        let request = self
            .client
            .get(GRAPH_URL)
            .header("Accept", "application/json")
            .header("Referer", "https://edition.cnn.com/")
            .header("Origin", "https://edition.cnn.com");
        let body = send_text(request).await?;
        parse_graph(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BaselineRule;

    #[test]
    fn test_parse_graph() {
        let body = r#"{
            "fear_and_greed": {
                "score": 45.6,
                "rating": "fear",
                "timestamp": "2025-10-17T23:59:57+00:00",
                "previous_close": 40.2,
                "previous_1_week": 30.0
            },
            "fear_and_greed_historical": { "data": [] }
        }"#;
        let series = parse_graph(body).unwrap();
        assert_eq!(series.latest, 45.6);
        assert_eq!(series.note.as_deref(), Some("fear"));
        assert_eq!(series.baseline(BaselineRule::PriorClose), Some(40.2));
        assert_eq!(series.baseline(BaselineRule::OfficialClose), Some(40.2));
    }

    #[test]
    fn test_parse_unexpected_shape() {
        assert!(matches!(
            parse_graph(r#"{"message":"blocked"}"#),
            Err(ProviderError::Parse(_))
        ));
    }
}
