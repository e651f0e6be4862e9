// src/services/collector.rs

//! Collection pass over the configured sections.
//!
//! Every configured instrument of an active section yields exactly one
//! [`Entry`], whatever its providers do. Sections may be fetched
//! concurrently; the result is always returned in configured order.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::models::{Entry, Instrument, Outcome, SectionConfig, SectionKind};
use crate::providers::{Enricher, ProviderRegistry};
use crate::services::{FallbackResolver, ModeProfile, Pacer};
use crate::utils::log;

/// Results of one configured section.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedSection {
    /// Index in the configured section list
    pub position: usize,
    pub kind: SectionKind,
    pub title: String,
    pub entries: Vec<Entry>,
}

/// Everything a collection pass produced, in configured order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub sections: Vec<CollectedSection>,
}

impl Collection {
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.sections.iter().flat_map(|s| s.entries.iter())
    }
}

pub struct QuantityCollector {
    resolver: FallbackResolver,
    pacer: Arc<Pacer>,
    enricher: Option<Arc<dyn Enricher>>,
    max_concurrent_sections: Option<usize>,
    show_progress: bool,
}

impl QuantityCollector {
    pub fn new(registry: Arc<ProviderRegistry>, pacer: Arc<Pacer>) -> Self {
        Self {
            resolver: FallbackResolver::new(registry, Arc::clone(&pacer)),
            pacer,
            enricher: None,
            max_concurrent_sections: None,
            show_progress: false,
        }
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Fetch up to `max` sections at the same time.
    pub fn concurrent(mut self, max: usize) -> Self {
        self.max_concurrent_sections = Some(max.max(1));
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Collect every section active under `profile`.
    ///
    /// Entries are only enriched when a news section is active as well.
    pub async fn collect(&self, sections: &[SectionConfig], profile: &ModeProfile) -> Collection {
        let jobs: Vec<_> = sections
            .iter()
            .enumerate()
            .filter(|(_, section)| profile.includes(section))
            .collect();
        let enrich = jobs.iter().any(|(_, s)| s.kind == SectionKind::News);

        let mut collected: Vec<CollectedSection> = match self.max_concurrent_sections {
            Some(max) => {
                stream::iter(jobs)
                    .map(|(position, section)| {
                        self.collect_section(position, section, profile, enrich)
                    })
                    .buffer_unordered(max)
                    .collect()
                    .await
            }
            None => {
                let mut out = Vec::with_capacity(jobs.len());
                for (position, section) in jobs {
                    out.push(self.collect_section(position, section, profile, enrich).await);
                }
                out
            }
        };

        collected.sort_by_key(|s| s.position);
        Collection {
            sections: collected,
        }
    }

    async fn collect_section(
        &self,
        position: usize,
        section: &SectionConfig,
        profile: &ModeProfile,
        enrich: bool,
    ) -> CollectedSection {
        if self.show_progress && !section.instruments.is_empty() {
            log::info(&format!(
                "Collecting {} ({} instruments)",
                section.kind.as_str(),
                section.instruments.len()
            ));
        }

        let mut entries = Vec::with_capacity(section.instruments.len());
        for instrument in &section.instruments {
            let outcome = self
                .resolver
                .resolve(instrument, profile.window, profile.baseline)
                .await;

            if self.show_progress {
                log::sub_item(&progress_line(&outcome));
            }

            let annotation = match (&outcome, &self.enricher) {
                (Outcome::Quote(_), Some(enricher)) if enrich && instrument.annotate => {
                    let annotation = enricher
                        .annotate(enrichment_symbol(instrument), &self.pacer)
                        .await;
                    (!annotation.is_empty()).then_some(annotation)
                }
                _ => None,
            };

            entries.push(Entry {
                instrument: instrument.clone(),
                outcome,
                annotation,
            });
        }

        CollectedSection {
            position,
            kind: section.kind,
            title: section.title().to_string(),
            entries,
        }
    }
}

/// Ticker used for headline and earnings lookups.
fn enrichment_symbol(instrument: &Instrument) -> &str {
    instrument
        .sources
        .iter()
        .find(|s| s.provider == crate::providers::yahoo::ID)
        .map(|s| s.symbol.as_str())
        .unwrap_or(&instrument.id)
}

fn progress_line(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Quote(q) => format!("✓ {} via {}", q.instrument_id, q.provider),
        Outcome::Failure(f) => format!("✗ {} ({})", f.instrument_id, f.reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::models::{
        Annotation, BaselineRule, Category, FailureReason, Headline, Mode, RawSeries,
        ScheduleConfig, Source, Window,
    };
    use crate::providers::{ProviderError, QuoteProvider};
    use crate::services::fallback::tests::{MockProvider, series};

    /// Answers every symbol after a per-symbol delay.
    struct SlowProvider;

    #[async_trait]
    impl QuoteProvider for SlowProvider {
        fn id(&self) -> &str {
            "slow"
        }

        async fn fetch(&self, symbol: &str, _window: Window) -> Result<RawSeries, ProviderError> {
            let ms = symbol.parse::<u64>().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(series(ms as f64 + 1.0, Some(1.0)))
        }
    }

    #[derive(Default)]
    struct FixedEnricher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Enricher for FixedEnricher {
        async fn annotate(&self, symbol: &str, _pacer: &Pacer) -> Annotation {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Annotation {
                headline: Some(Headline {
                    title: format!("{symbol} headline"),
                    publisher: None,
                    link: None,
                    published_at: None,
                }),
                next_event: None,
            }
        }
    }

    fn instrument(id: &str, provider: &str, symbol: &str) -> Instrument {
        Instrument::new(id, Category::Equity, vec![Source::new(provider, symbol)])
    }

    fn morning() -> ModeProfile {
        Mode::Morning.profile(&ScheduleConfig::default())
    }

    fn no_pacing() -> Arc<Pacer> {
        Arc::new(Pacer::new(Duration::ZERO))
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_section() {
        let mock = MockProvider::new("mock")
            .answer("AAA", Ok(series(105.0, Some(100.0))))
            .answer("BBB", Err(ProviderError::Timeout))
            .answer("CCC", Ok(series(50.0, Some(50.0))));
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(mock));

        let sections = vec![SectionConfig::new(
            SectionKind::Watchlist,
            vec![
                instrument("AAA", "mock", "AAA"),
                instrument("BBB", "mock", "BBB"),
                instrument("CCC", "mock", "CCC"),
            ],
        )];

        let collector = QuantityCollector::new(Arc::new(registry), no_pacing());
        let collection = collector.collect(&sections, &morning()).await;

        let ids: Vec<_> = collection.entries().map(|e| e.outcome.instrument_id()).collect();
        assert_eq!(ids, vec!["AAA", "BBB", "CCC"]);
        match &collection.sections[0].entries[1].outcome {
            Outcome::Failure(f) => assert_eq!(f.reason, FailureReason::Timeout),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_sections_keep_configured_order() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(SlowProvider));

        // The first section is the slowest to complete.
        let sections = vec![
            SectionConfig::new(
                SectionKind::Indices,
                vec![instrument("SLOW", "slow", "300"), instrument("FAST", "slow", "10")],
            ),
            SectionConfig::new(SectionKind::Commodities, vec![instrument("MID", "slow", "100")]),
            SectionConfig::new(SectionKind::Watchlist, vec![instrument("QUICK", "slow", "1")]),
        ];

        let collector = QuantityCollector::new(Arc::new(registry), no_pacing()).concurrent(3);
        let collection = collector.collect(&sections, &morning()).await;

        let positions: Vec<_> = collection.sections.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        let ids: Vec<_> = collection.entries().map(|e| e.instrument.id.as_str()).collect();
        assert_eq!(ids, vec!["SLOW", "FAST", "MID", "QUICK"]);
    }

    #[tokio::test]
    async fn test_inactive_sections_skipped() {
        let registry = ProviderRegistry::new();
        let sections = vec![
            SectionConfig::new(SectionKind::Weather, vec![instrument("성동구", "naver", "성동구")]),
            SectionConfig::new(SectionKind::Watchlist, vec![instrument("AAPL", "yahoo", "AAPL")]),
        ];

        let collector = QuantityCollector::new(Arc::new(registry), no_pacing());
        let evening = Mode::PreMarketEvening.profile(&ScheduleConfig::default());
        let collection = collector.collect(&sections, &evening).await;

        assert_eq!(collection.sections.len(), 1);
        assert_eq!(collection.sections[0].kind, SectionKind::Watchlist);
        assert_eq!(evening.baseline, BaselineRule::OfficialClose);
    }

    #[tokio::test]
    async fn test_only_resolved_annotated_entries_enriched() {
        let mock = MockProvider::new("yahoo")
            .answer("NVDA", Ok(series(105.0, Some(100.0))))
            .answer("MSFT", Ok(series(400.0, Some(401.0))));
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(mock));

        let sections = vec![
            SectionConfig::new(
                SectionKind::Watchlist,
                vec![
                    instrument("NVDA", "yahoo", "NVDA").annotated(),
                    instrument("MSFT", "yahoo", "MSFT"),
                    instrument("TSLA", "yahoo", "TSLA").annotated(),
                ],
            ),
            SectionConfig::new(SectionKind::News, Vec::new()),
        ];

        let collector = QuantityCollector::new(Arc::new(registry), no_pacing())
            .with_enricher(Arc::new(FixedEnricher::default()));
        let collection = collector.collect(&sections, &morning()).await;
        let entries = &collection.sections[0].entries;

        assert_eq!(
            entries[0].annotation.as_ref().unwrap().headline.as_ref().unwrap().title,
            "NVDA headline"
        );
        assert!(entries[1].annotation.is_none());
        // TSLA has no scripted answer and fails, so it is not enriched.
        assert!(entries[2].outcome.is_failure());
        assert!(entries[2].annotation.is_none());
    }

    #[tokio::test]
    async fn test_no_enrichment_without_active_news_section() {
        let mock = MockProvider::new("yahoo").answer("NVDA", Ok(series(105.0, Some(100.0))));
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(mock));
        let enricher = Arc::new(FixedEnricher::default());
        let collector = QuantityCollector::new(Arc::new(registry), no_pacing())
            .with_enricher(Arc::clone(&enricher) as Arc<dyn Enricher>);
        let watchlist = SectionConfig::new(
            SectionKind::Watchlist,
            vec![instrument("NVDA", "yahoo", "NVDA").annotated()],
        );

        // No news section configured.
        let collection = collector.collect(&[watchlist.clone()], &morning()).await;
        assert!(collection.sections[0].entries[0].annotation.is_none());

        // News section configured but not collected in this mode.
        let mut news = SectionConfig::new(SectionKind::News, Vec::new());
        news.modes = vec![Mode::PreMarketEvening];
        let collection = collector.collect(&[watchlist, news], &morning()).await;
        assert_eq!(collection.sections.len(), 1);
        assert!(collection.sections[0].entries[0].annotation.is_none());

        assert_eq!(enricher.calls.load(Ordering::SeqCst), 0);
    }
}
