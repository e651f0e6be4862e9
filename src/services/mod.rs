// src/services/mod.rs

//! Business logic services.
//!
//! Provides the collection and composition stages of a briefing run:
//! - `mode`: Morning vs pre-market selection and what each implies
//! - `pacing`: Per-provider call spacing
//! - `fallback`: Ordered provider fallback per instrument
//! - `collector`: Section-by-section collection pass
//! - `composer`: Report assembly
//! - `render`: Text, table and HTML projections of a report

pub mod collector;
pub mod composer;
pub mod fallback;
pub mod mode;
pub mod pacing;
pub mod render;

pub use collector::{CollectedSection, Collection, QuantityCollector};
pub use composer::compose;
pub use fallback::FallbackResolver;
pub use mode::{ModeProfile, local_time, select_mode};
pub use pacing::Pacer;
pub use render::{
    TablePayload, TextOptions, render_html, render_table, render_text, split_message,
};
