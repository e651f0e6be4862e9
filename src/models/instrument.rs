// src/models/instrument.rs

//! Instruments and the provider sources configured for them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of quantity an instrument tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Equity,
    Index,
    Fx,
    Commodity,
    Crypto,
    Sentiment,
    Weather,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Equity => "equity",
            Category::Index => "index",
            Category::Fx => "fx",
            Category::Commodity => "commodity",
            Category::Crypto => "crypto",
            Category::Sentiment => "sentiment",
            Category::Weather => "weather",
        }
    }

    /// Whether a quote without a baseline is only a partial result.
    ///
    /// Weather readings have no prior value to compare against.
    pub fn requires_baseline(&self) -> bool {
        !matches!(self, Category::Weather)
    }

    /// Format a value with the unit this category is displayed in.
    pub fn format_value(&self, value: f64) -> String {
        match self {
            Category::Equity | Category::Commodity | Category::Crypto => format!("${value:.2}"),
            Category::Weather => format!("{value:.1}°C"),
            Category::Sentiment => format!("{value:.0}"),
            Category::Index | Category::Fx => format!("{value:.2}"),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One provider able to serve an instrument, with the symbol that provider uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Provider identifier (e.g. "yahoo", "stooq", "naver")
    pub provider: String,

    /// Provider-specific symbol, query or coordinates
    pub symbol: String,
}

impl Source {
    pub fn new(provider: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            symbol: symbol.into(),
        }
    }
}

/// A trackable quantity defined in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Identifier shown in the report (ticker, location, index symbol)
    pub id: String,

    /// Display name, defaults to `id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub category: Category,

    /// Providers in priority order
    #[serde(default)]
    pub sources: Vec<Source>,

    /// Fetch a headline and next earnings date for this instrument
    #[serde(default)]
    pub annotate: bool,
}

impl Instrument {
    pub fn new(id: impl Into<String>, category: Category, sources: Vec<Source>) -> Self {
        Self {
            id: id.into(),
            name: None,
            category,
            sources,
            annotate: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn annotated(mut self) -> Self {
        self.annotate = true;
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// A US-listed equity served by Yahoo first and Stooq second.
    pub fn us_equity(ticker: &str) -> Self {
        Self::new(
            ticker,
            Category::Equity,
            vec![
                Source::new("yahoo", ticker),
                Source::new("stooq", format!("{}.us", ticker.to_lowercase())),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_us_equity_sources() {
        let inst = Instrument::us_equity("NVDA");
        assert_eq!(inst.sources[0], Source::new("yahoo", "NVDA"));
        assert_eq!(inst.sources[1], Source::new("stooq", "nvda.us"));
        assert_eq!(inst.display_name(), "NVDA");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(Category::Equity.format_value(105.0), "$105.00");
        assert_eq!(Category::Weather.format_value(12.34), "12.3°C");
        assert_eq!(Category::Sentiment.format_value(44.6), "45");
    }

    #[test]
    fn test_deserialize_instrument() {
        let inst: Instrument = toml::from_str(
            r#"
            id = "^GSPC"
            name = "S&P 500"
            category = "index"
            sources = [{ provider = "yahoo", symbol = "^GSPC" }]
            "#,
        )
        .unwrap();
        assert_eq!(inst.display_name(), "S&P 500");
        assert_eq!(inst.category, Category::Index);
        assert!(!inst.annotate);
    }
}
