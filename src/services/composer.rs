// src/services/composer.rs

//! Builds the [`Report`] value from a collection pass. No I/O.

use chrono::{DateTime, FixedOffset};

use crate::models::{Entry, Mode, NewsItem, Report, Section, SectionBody, SectionKind};
use crate::services::{CollectedSection, Collection};

/// Compose the report for `mode` at `generated_at`.
///
/// Sections are ordered by kind, then by configured position. The news
/// section lists annotated entries of all other sections and is dropped
/// when nothing was annotated.
pub fn compose(collection: &Collection, mode: Mode, generated_at: DateTime<FixedOffset>) -> Report {
    let mut ordered: Vec<&CollectedSection> = collection.sections.iter().collect();
    ordered.sort_by_key(|s| (s.kind, s.position));

    let sections = ordered
        .into_iter()
        .filter_map(|collected| match collected.kind {
            SectionKind::News => {
                let items = news_items(&ordered_entries(collection));
                (!items.is_empty()).then(|| Section {
                    kind: SectionKind::News,
                    title: collected.title.clone(),
                    body: SectionBody::News(items),
                })
            }
            kind => Some(Section::quotes(
                kind,
                collected.title.clone(),
                collected.entries.clone(),
            )),
        })
        .collect();

    Report {
        mode,
        generated_at,
        sections,
    }
}

/// Entries of the quote sections in display order.
fn ordered_entries(collection: &Collection) -> Vec<&Entry> {
    let mut sections: Vec<&CollectedSection> = collection
        .sections
        .iter()
        .filter(|s| s.kind != SectionKind::News)
        .collect();
    sections.sort_by_key(|s| (s.kind, s.position));
    sections.iter().flat_map(|s| s.entries.iter()).collect()
}

fn news_items(entries: &[&Entry]) -> Vec<NewsItem> {
    entries
        .iter()
        .filter_map(|entry| {
            let annotation = entry.annotation.as_ref().filter(|a| !a.is_empty())?;
            Some(NewsItem {
                instrument_id: entry.instrument.id.clone(),
                name: entry.instrument.display_name().to_string(),
                headline: annotation.headline.clone(),
                next_event: annotation.next_event,
            })
        })
        .collect()
}
