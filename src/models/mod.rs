// src/models/mod.rs

//! Domain models for the briefing application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod instrument;
mod quote;
mod report;
mod series;

// Re-export all public types
pub use config::{
    Config, HttpConfig, LoggingConfig, OutputConfig, PacingConfig, ProviderConfig, ReportConfig,
    ScheduleConfig, SectionConfig, TransportConfig,
};
pub use instrument::{Category, Instrument, Source};
pub use quote::{
    Annotation, Direction, Failure, FailureReason, Headline, Outcome, Quote, percent_change,
};
pub use report::{Entry, Mode, NewsItem, Report, Section, SectionBody, SectionKind};
pub use series::{BaselineRule, RawSeries, Window};
