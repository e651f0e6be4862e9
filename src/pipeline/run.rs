// src/pipeline/run.rs

//! Briefing run: mode → collect → compose → deliver.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Config, Mode, Report};
use crate::output::{ReportSink, SinkOutcome, StaticPageSink, TelegramSink, dispatch};
use crate::providers::{Enricher, NewsEnricher, ProviderRegistry};
use crate::services::{
    Pacer, QuantityCollector, TextOptions, compose, local_time, render_text, select_mode,
};
use crate::utils::{http, log};

/// Which outputs a run should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub send: bool,
    pub page: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            send: true,
            page: true,
        }
    }
}

/// Providers, enrichment and sinks used by a run.
pub struct Briefing {
    registry: Arc<ProviderRegistry>,
    enricher: Option<Arc<dyn Enricher>>,
    sinks: Vec<Box<dyn ReportSink>>,
}

impl Briefing {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            enricher: None,
            sinks: Vec::new(),
        }
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Wire the real providers and the sinks enabled by config and options.
    pub fn from_config(config: &Config, storage_dir: &Path, options: &RunOptions) -> Result<Self> {
        let client = http::create_async_client(&config.http)?;
        let mut briefing = Self::new(ProviderRegistry::from_config(config, &client))
            .with_enricher(Arc::new(NewsEnricher::new(client.clone())));

        if options.send && config.transport.enabled {
            briefing = briefing.with_sink(Box::new(TelegramSink::from_env(
                client,
                &config.transport,
                &config.report,
            )));
        }
        if options.page && config.output.page_enabled {
            briefing = briefing.with_sink(Box::new(StaticPageSink::new(
                storage_dir.join(&config.output.page_dir),
                config.report.clone(),
            )));
        }
        Ok(briefing)
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: Report,
    /// Chat text as rendered for the report
    pub text: String,
    pub sinks: Vec<SinkOutcome>,
}

impl RunSummary {
    pub fn failed_sinks(&self) -> usize {
        self.sinks.iter().filter(|s| s.is_failed()).count()
    }
}

/// Run one briefing at `now`.
///
/// `mode` overrides the clock-based selection. Only configuration errors
/// abort the run; provider and sink failures end up in the summary.
pub async fn run_briefing(
    config: &Config,
    briefing: &Briefing,
    mode: Option<Mode>,
    now: DateTime<Utc>,
) -> Result<RunSummary> {
    config.validate()?;

    let local = local_time(config, now)?;
    let mode = mode.unwrap_or_else(|| select_mode(&local, config.schedule.cutoff_hour));
    let profile = mode.profile(&config.schedule);

    log::header(&format!(
        "Briefing ({}) at {}",
        mode,
        local.format("%Y-%m-%d %H:%M %Z")
    ));

    log::step(1, 3, "Collect - Fetching quotes");
    let pacer = Arc::new(Pacer::from_config(config));
    let mut collector = QuantityCollector::new(Arc::clone(&briefing.registry), pacer)
        .show_progress(config.logging.show_progress);
    if config.pacing.concurrent_sections {
        collector = collector.concurrent(config.pacing.max_concurrent_sections);
    }
    if let Some(enricher) = &briefing.enricher {
        collector = collector.with_enricher(Arc::clone(enricher));
    }
    let collection = collector.collect(&config.sections, &profile).await;

    log::step(2, 3, "Compose - Building report");
    let report = compose(&collection, mode, local.fixed_offset());
    let text = render_text(&report, &TextOptions::from_config(&config.report, mode));

    log::step(3, 3, "Deliver - Dispatching to sinks");
    let sinks = dispatch(&report, &briefing.sinks).await;

    let summary = RunSummary {
        report,
        text,
        sinks,
    };

    log::summary(
        "Briefing",
        &[
            ("Mode", mode.to_string()),
            ("Sections", summary.report.sections.len().to_string()),
            ("Quotes", summary.report.quote_count().to_string()),
            ("Failures", summary.report.failure_count().to_string()),
            (
                "Sinks",
                format!(
                    "{} ok / {} failed",
                    summary.sinks.len() - summary.failed_sinks(),
                    summary.failed_sinks()
                ),
            ),
        ],
    );

    if summary.failed_sinks() == 0 {
        log::success("Briefing complete");
    } else {
        log::warn("Briefing complete with sink failures");
    }

    Ok(summary)
}
