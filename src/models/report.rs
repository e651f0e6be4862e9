// src/models/report.rs

//! Sections, run mode and the composed report.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Annotation, Headline, Instrument, Outcome};

/// Run classification derived from local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Before the cutoff hour: weather plus previous-session moves.
    Morning,
    /// At or after the cutoff: pre-market moves against the official close.
    #[serde(rename = "evening")]
    PreMarketEvening,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Morning => "morning",
            Mode::PreMarketEvening => "evening",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Ok(Mode::Morning),
            "evening" | "pre-market" | "premarket" => Ok(Mode::PreMarketEvening),
            other => Err(AppError::validation(format!(
                "unknown mode '{other}' (expected morning or evening)"
            ))),
        }
    }
}

/// Section kinds in their fixed display order.
///
/// The derived `Ord` follows declaration order and is what the composer
/// sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Weather,
    Indices,
    Sentiment,
    Commodities,
    Watchlist,
    News,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Weather => "weather",
            SectionKind::Indices => "indices",
            SectionKind::Sentiment => "sentiment",
            SectionKind::Commodities => "commodities",
            SectionKind::Watchlist => "watchlist",
            SectionKind::News => "news",
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            SectionKind::Weather => "🌤 오늘의 날씨",
            SectionKind::Indices => "🌏 주요 지수·환율",
            SectionKind::Sentiment => "🧭 투자 심리",
            SectionKind::Commodities => "🛢 원자재·코인",
            SectionKind::Watchlist => "📊 미국 주식 현황",
            SectionKind::News => "📰 뉴스·일정",
        }
    }
}

/// One configured instrument and what the collection pass produced for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub instrument: Instrument,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<Annotation>,
}

/// A line of the news/events section, derived from an annotated entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub instrument_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<Headline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_event: Option<NaiveDate>,
}

/// Contents of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "items", rename_all = "snake_case")]
pub enum SectionBody {
    Quotes(Vec<Entry>),
    News(Vec<NewsItem>),
}

/// A named group of results in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub title: String,
    pub body: SectionBody,
}

impl Section {
    pub fn quotes(kind: SectionKind, title: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            kind,
            title: title.into(),
            body: SectionBody::Quotes(entries),
        }
    }

    /// Quote entries of this section; empty for the news section.
    pub fn entries(&self) -> &[Entry] {
        match &self.body {
            SectionBody::Quotes(entries) => entries,
            SectionBody::News(_) => &[],
        }
    }
}

/// The briefing for one run. Renderers only ever borrow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub mode: Mode,
    pub generated_at: DateTime<FixedOffset>,
    pub sections: Vec<Section>,
}

impl Report {
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.sections.iter().flat_map(|s| s.entries())
    }

    pub fn quote_count(&self) -> usize {
        self.entries().filter(|e| !e.outcome.is_failure()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.entries().filter(|e| e.outcome.is_failure()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("morning".parse::<Mode>().unwrap(), Mode::Morning);
        assert_eq!("Evening".parse::<Mode>().unwrap(), Mode::PreMarketEvening);
        assert!("noon".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_serde_names() {
        let json = serde_json::to_string(&Mode::PreMarketEvening).unwrap();
        assert_eq!(json, "\"evening\"");
    }

    #[test]
    fn test_section_kind_display_order() {
        let mut kinds = vec![
            SectionKind::News,
            SectionKind::Watchlist,
            SectionKind::Weather,
            SectionKind::Commodities,
            SectionKind::Sentiment,
            SectionKind::Indices,
        ];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Weather,
                SectionKind::Indices,
                SectionKind::Sentiment,
                SectionKind::Commodities,
                SectionKind::Watchlist,
                SectionKind::News,
            ]
        );
    }
}
