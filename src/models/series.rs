// src/models/series.rs

//! Raw provider output and the rules that pick a baseline from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Historical window requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    /// A few daily bars, enough to see the previous session close.
    Daily,
    /// Today's intraday bars including extended hours.
    Intraday,
}

/// Which value of a [`RawSeries`] counts as the baseline for percent change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineRule {
    /// Previous trading day's close (penultimate daily bar, else the
    /// provider-reported previous close).
    PriorClose,
    /// Most recent official session close as reported by the provider.
    OfficialClose,
    /// Oldest sample in the fetched window.
    FirstSample,
}

/// The smallest parsed unit a provider hands back for one quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    /// Most recent value.
    pub latest: f64,
    /// Sample immediately before `latest` in the window.
    pub prior: Option<f64>,
    /// Oldest sample in the window.
    pub first: Option<f64>,
    /// Most recent official close before `latest`, when the provider reports one.
    pub official_close: Option<f64>,
    /// Time of `latest`.
    pub as_of: DateTime<Utc>,
    /// Free-form qualifier (weather condition, sentiment rating).
    pub note: Option<String>,
}

impl RawSeries {
    /// A single observation without any comparison values.
    pub fn point(latest: f64, as_of: DateTime<Utc>) -> Self {
        Self {
            latest,
            prior: None,
            first: None,
            official_close: None,
            as_of,
            note: None,
        }
    }

    /// Build a series from samples ordered oldest to newest.
    ///
    /// Returns `None` when there is no finite sample at all.
    pub fn from_samples(samples: &[f64], as_of: DateTime<Utc>) -> Option<Self> {
        let finite: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        let latest = *finite.last()?;
        let prior = finite.len().checked_sub(2).map(|i| finite[i]);
        Some(Self {
            latest,
            prior,
            first: finite.first().copied(),
            official_close: None,
            as_of,
            note: None,
        })
    }

    pub fn with_official_close(mut self, close: Option<f64>) -> Self {
        self.official_close = close.filter(|v| v.is_finite());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.note = if note.trim().is_empty() {
            None
        } else {
            Some(note.trim().to_string())
        };
        self
    }

    /// The baseline selected by `rule`, if the series carries it.
    pub fn baseline(&self, rule: BaselineRule) -> Option<f64> {
        match rule {
            BaselineRule::PriorClose => self.prior.or(self.official_close),
            BaselineRule::OfficialClose => self.official_close,
            BaselineRule::FirstSample => self.first,
        }
    }

    /// True when `rule` yields a baseline that percent change can use.
    pub fn has_usable_baseline(&self, rule: BaselineRule) -> bool {
        self.baseline(rule).is_some_and(|b| b.is_finite() && b > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000, 0).unwrap()
    }

    #[test]
    fn test_from_samples_skips_gaps() {
        let series = RawSeries::from_samples(&[99.0, f64::NAN, 100.0, 105.0], ts()).unwrap();
        assert_eq!(series.latest, 105.0);
        assert_eq!(series.prior, Some(100.0));
        assert_eq!(series.first, Some(99.0));
    }

    #[test]
    fn test_from_samples_empty() {
        assert!(RawSeries::from_samples(&[f64::NAN], ts()).is_none());
    }

    #[test]
    fn test_baseline_rules_differ() {
        // Intraday window: first pre-market sample drifts away from the official close.
        let series = RawSeries::from_samples(&[101.0, 103.0, 104.0], ts())
            .unwrap()
            .with_official_close(Some(100.0));

        assert_eq!(series.baseline(BaselineRule::OfficialClose), Some(100.0));
        assert_eq!(series.baseline(BaselineRule::FirstSample), Some(101.0));
        assert_eq!(series.baseline(BaselineRule::PriorClose), Some(103.0));
    }

    #[test]
    fn test_prior_close_falls_back_to_official() {
        let series = RawSeries::point(10.0, ts()).with_official_close(Some(9.5));
        assert_eq!(series.baseline(BaselineRule::PriorClose), Some(9.5));
    }

    #[test]
    fn test_zero_baseline_not_usable() {
        let series = RawSeries::point(10.0, ts()).with_official_close(Some(0.0));
        assert!(!series.has_usable_baseline(BaselineRule::OfficialClose));
    }
}
