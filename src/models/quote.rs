// src/models/quote.rs

//! Per-instrument outcomes of a collection pass.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::round_change;

/// Percent change of `value` against `baseline`.
///
/// `None` means "no comparison": the baseline is missing, not finite, or not
/// strictly positive.
pub fn percent_change(value: f64, baseline: Option<f64>) -> Option<f64> {
    let baseline = baseline?;
    if !value.is_finite() || !baseline.is_finite() || baseline <= 0.0 {
        return None;
    }
    Some((value - baseline) / baseline * 100.0)
}

/// Direction of a move at display precision, with the tie at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    pub fn from_change(change_pct: f64) -> Self {
        let change_pct = round_change(change_pct);
        if change_pct > 0.0 {
            Direction::Up
        } else if change_pct < 0.0 {
            Direction::Down
        } else {
            Direction::Flat
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Direction::Up => "🔺",
            Direction::Down => "🔻",
            Direction::Flat => "➖",
        }
    }
}

/// A successfully resolved value for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub instrument_id: String,
    pub value: f64,
    pub baseline: Option<f64>,
    pub as_of: DateTime<Utc>,
    /// Provider that produced this quote
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Quote {
    /// Percent change against the baseline, if a comparison is possible.
    pub fn change_pct(&self) -> Option<f64> {
        percent_change(self.value, self.baseline)
    }

    /// Direction of the move; `None` when there is no comparison.
    pub fn direction(&self) -> Option<Direction> {
        self.change_pct().map(Direction::from_change)
    }
}

/// Why an instrument could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    Timeout,
    NotFound,
    ParseError,
    RateLimited,
    NoData,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Timeout => "timeout",
            FailureReason::NotFound => "not-found",
            FailureReason::ParseError => "parse-error",
            FailureReason::RateLimited => "rate-limited",
            FailureReason::NoData => "no-data",
        }
    }

    /// How much this reason tells the reader; higher wins when aggregating.
    pub fn specificity(&self) -> u8 {
        match self {
            FailureReason::ParseError | FailureReason::NotFound => 4,
            FailureReason::NoData => 3,
            FailureReason::RateLimited => 2,
            FailureReason::Timeout => 1,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of one instrument in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub instrument_id: String,
    pub reason: FailureReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Failure {
    pub fn new(instrument_id: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            reason,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Exactly one of these exists per configured instrument per section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Quote(Quote),
    Failure(Failure),
}

impl Outcome {
    pub fn instrument_id(&self) -> &str {
        match self {
            Outcome::Quote(q) => &q.instrument_id,
            Outcome::Failure(f) => &f.instrument_id,
        }
    }

    pub fn as_quote(&self) -> Option<&Quote> {
        match self {
            Outcome::Quote(q) => Some(q),
            Outcome::Failure(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }
}

/// A news headline attached to an instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// Cosmetic context for an instrument. Missing parts are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<Headline>,
    /// Next scheduled earnings/disclosure date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_event: Option<NaiveDate>,
}

impl Annotation {
    pub fn is_empty(&self) -> bool {
        self.headline.is_none() && self.next_event.is_none()
    }
}
