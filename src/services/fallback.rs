// src/services/fallback.rs

//! Ordered provider fallback for a single instrument.

use std::sync::Arc;

use crate::models::{BaselineRule, Failure, FailureReason, Instrument, Outcome, Quote, Window};
use crate::providers::{ProviderError, ProviderRegistry};
use crate::services::Pacer;

/// Resolves an instrument by trying its sources in priority order.
///
/// - The first source that returns a value (and a usable baseline when the
///   category needs one) wins, and later sources are never called.
/// - A value without a usable baseline is kept as a partial result and
///   returned only when no later source does better.
/// - When every source fails, the most specific reason is reported; ties
///   keep the earlier source.
/// - Sources that cannot serve the request (unregistered provider, window
///   not supported) are skipped and never compete with real failures.
pub struct FallbackResolver {
    registry: Arc<ProviderRegistry>,
    pacer: Arc<Pacer>,
}

impl FallbackResolver {
    pub fn new(registry: Arc<ProviderRegistry>, pacer: Arc<Pacer>) -> Self {
        Self { registry, pacer }
    }

    pub async fn resolve(&self, instrument: &Instrument, window: Window, rule: BaselineRule) -> Outcome {
        let mut partial: Option<Quote> = None;
        let mut worst: Option<(FailureReason, String)> = None;
        let mut skipped: Vec<String> = Vec::new();

        let mut record = |reason: FailureReason, detail: String| {
            let better = worst
                .as_ref()
                .is_none_or(|(current, _)| reason.specificity() > current.specificity());
            if better {
                worst = Some((reason, detail));
            }
        };

        for source in &instrument.sources {
            let Some(provider) = self.registry.get(&source.provider) else {
                log::debug!("{}: provider {} not available", instrument.id, source.provider);
                skipped.push(format!("{}: provider not available", source.provider));
                continue;
            };

            self.pacer.wait(provider.id()).await;

            match provider.fetch(&source.symbol, window).await {
                Ok(series) => {
                    let complete = !instrument.category.requires_baseline()
                        || series.has_usable_baseline(rule);
                    let quote = Quote {
                        instrument_id: instrument.id.clone(),
                        value: series.latest,
                        baseline: series.baseline(rule),
                        as_of: series.as_of,
                        provider: source.provider.clone(),
                        note: series.note,
                    };

                    if complete {
                        log::debug!("{} resolved by {}", instrument.id, source.provider);
                        return Outcome::Quote(quote);
                    }

                    log::debug!(
                        "{}: {} returned no usable baseline, trying next source",
                        instrument.id,
                        source.provider
                    );
                    partial.get_or_insert(quote);
                }
                Err(e @ ProviderError::Unsupported(_)) => {
                    log::debug!("{}: {} skipped: {}", instrument.id, source.provider, e);
                    skipped.push(format!("{}: {}", source.provider, e));
                }
                Err(e) => {
                    log::debug!("{}: {} failed: {}", instrument.id, source.provider, e);
                    record(e.reason(), format!("{}: {}", source.provider, e));
                }
            }
        }

        if let Some(quote) = partial {
            return Outcome::Quote(quote);
        }

        let failure = match worst {
            Some((reason, detail)) => Failure::new(&instrument.id, reason).with_detail(detail),
            None if skipped.is_empty() => {
                Failure::new(&instrument.id, FailureReason::NoData).with_detail("no sources configured")
            }
            None => Failure::new(&instrument.id, FailureReason::NoData).with_detail(format!(
                "no usable source ({})",
                skipped.join("; ")
            )),
        };
        log::warn!(
            "{} unresolved: {}",
            instrument.id,
            failure.detail.as_deref().unwrap_or(failure.reason.as_str())
        );
        Outcome::Failure(failure)
    }
}
