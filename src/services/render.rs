// src/services/render.rs

//! Projections of a [`Report`]: chat text, table payload and HTML page.
//!
//! All renderers are deterministic functions of their input.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::models::{
    Direction, Entry, Mode, NewsItem, Outcome, Quote, Report, ReportConfig, SectionBody,
    SectionKind,
};
use crate::utils::{escape_html, escape_markdown, format_change, markdown_bold};

const FAILURE_GLYPH: &str = "⚠️";
const LOCATION_GLYPH: &str = "📍";
const EVENT_GLYPH: &str = "📅";

/// Text layout settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextOptions {
    pub title: String,
    pub separator: String,
}

impl TextOptions {
    pub fn from_config(report: &ReportConfig, mode: Mode) -> Self {
        Self {
            title: report.title(mode).to_string(),
            separator: report.separator.clone(),
        }
    }
}

/// Render the chat message (Telegram legacy Markdown).
pub fn render_text(report: &Report, options: &TextOptions) -> String {
    let mut lines = vec![
        markdown_bold(&options.title),
        report.generated_at.format("%Y-%m-%d %H:%M").to_string(),
    ];

    for section in &report.sections {
        lines.push(escape_markdown(&options.separator));
        lines.push(markdown_bold(&section.title));
        match &section.body {
            SectionBody::Quotes(entries) => {
                lines.extend(entries.iter().map(entry_line));
            }
            SectionBody::News(items) => {
                for item in items {
                    lines.extend(news_lines(item));
                }
            }
        }
    }

    lines.join("\n")
}

fn entry_line(entry: &Entry) -> String {
    let name = escape_markdown(entry.instrument.display_name());
    match &entry.outcome {
        Outcome::Quote(quote) => quote_line(entry, &name, quote),
        Outcome::Failure(failure) => {
            format!("{FAILURE_GLYPH} {name}: 조회 실패 ({})", failure.reason)
        }
    }
}

fn quote_line(entry: &Entry, name: &str, quote: &Quote) -> String {
    let category = entry.instrument.category;
    let value = escape_markdown(&category.format_value(quote.value));

    let mut line = match quote.change_pct() {
        Some(change) => format!(
            "{} {name}: {value} ({})",
            Direction::from_change(change).glyph(),
            format_change(change)
        ),
        None if !category.requires_baseline() => format!("{LOCATION_GLYPH} {name}: {value}"),
        None => format!("{} {name}: {value}", Direction::Flat.glyph()),
    };

    if let Some(note) = &quote.note {
        line.push_str(" · ");
        line.push_str(&escape_markdown(note));
    }
    line
}

fn news_lines(item: &NewsItem) -> Vec<String> {
    let name = escape_markdown(&item.name);
    let mut lines = Vec::new();
    match &item.headline {
        Some(headline) => {
            let mut line = format!("• {name}: {}", escape_markdown(&headline.title));
            if let Some(publisher) = &headline.publisher {
                line.push_str(&format!(" ({})", escape_markdown(publisher)));
            }
            lines.push(line);
        }
        None => lines.push(format!("• {name}")),
    }
    if let Some(date) = item.next_event {
        lines.push(format!("  {EVENT_GLYPH} 실적 발표: {}", date.format("%Y-%m-%d")));
    }
    lines
}

/// Serializable table for the static page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePayload {
    pub mode: Mode,
    pub generated_at: String,
    pub sections: Vec<TableSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSection {
    pub kind: SectionKind,
    pub title: String,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub id: String,
    pub name: String,
    /// "ok", "failed" or "news"
    pub status: String,
    /// Formatted value, failure reason or headline
    pub display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Flatten the report into table rows.
pub fn render_table(report: &Report) -> TablePayload {
    let sections = report
        .sections
        .iter()
        .map(|section| TableSection {
            kind: section.kind,
            title: section.title.clone(),
            rows: match &section.body {
                SectionBody::Quotes(entries) => entries.iter().map(entry_row).collect(),
                SectionBody::News(items) => items.iter().map(news_row).collect(),
            },
        })
        .collect();

    TablePayload {
        mode: report.mode,
        generated_at: report.generated_at.to_rfc3339(),
        sections,
    }
}

fn entry_row(entry: &Entry) -> TableRow {
    let id = entry.instrument.id.clone();
    let name = entry.instrument.display_name().to_string();
    match &entry.outcome {
        Outcome::Quote(quote) => TableRow {
            id,
            name,
            status: "ok".to_string(),
            display: entry.instrument.category.format_value(quote.value),
            value: Some(quote.value),
            change_pct: quote.change_pct(),
            direction: quote.direction(),
            provider: Some(quote.provider.clone()),
            note: quote.note.clone(),
        },
        Outcome::Failure(failure) => TableRow {
            id,
            name,
            status: "failed".to_string(),
            display: failure.reason.to_string(),
            value: None,
            change_pct: None,
            direction: None,
            provider: None,
            note: failure.detail.clone(),
        },
    }
}

fn news_row(item: &NewsItem) -> TableRow {
    TableRow {
        id: item.instrument_id.clone(),
        name: item.name.clone(),
        status: "news".to_string(),
        display: item
            .headline
            .as_ref()
            .map(|h| h.title.clone())
            .unwrap_or_default(),
        value: None,
        change_pct: None,
        direction: None,
        provider: item.headline.as_ref().and_then(|h| h.publisher.clone()),
        note: item.next_event.map(|d| d.format("%Y-%m-%d").to_string()),
    }
}

/// Minimal HTML page for the table payload.
pub fn render_html(payload: &TablePayload, title: &str) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"ko\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n</head>\n<body>\n", escape_html(title)));
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(title)));
    html.push_str(&format!(
        "<p><time datetime=\"{0}\">{0}</time></p>\n",
        escape_html(&payload.generated_at)
    ));

    for section in &payload.sections {
        html.push_str(&format!("<h2>{}</h2>\n<table>\n", escape_html(&section.title)));
        for row in &section.rows {
            let change = row.change_pct.map(format_change).unwrap_or_default();
            let glyph = match (row.status.as_str(), row.direction) {
                ("failed", _) => FAILURE_GLYPH,
                (_, Some(direction)) => direction.glyph(),
                _ => "",
            };
            html.push_str(&format!(
                "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&row.status),
                glyph,
                escape_html(&row.name),
                escape_html(&row.display),
                escape_html(&change),
                escape_html(row.note.as_deref().unwrap_or("")),
            ));
        }
        html.push_str("</table>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Split `text` into chunks of at most `max_len` characters.
///
/// Chunks break at line boundaries; a single line longer than `max_len` is
/// cut on grapheme boundaries.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count();
        let needed = if current.is_empty() {
            line_len
        } else {
            current_len + 1 + line_len
        };

        if needed <= max_len {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            current_len = needed;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= max_len {
            current.push_str(line);
            current_len = line_len;
        } else {
            for grapheme in line.graphemes(true) {
                let g_len = grapheme.chars().count();
                if current_len + g_len > max_len && !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                current.push_str(grapheme);
                current_len += g_len;
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
