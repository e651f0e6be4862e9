// src/pipeline/mod.rs

//! Pipeline entry points.
//!
//! - `run_briefing`: Select mode, collect, compose and deliver one briefing
//! - `run_validate`: Check configuration without touching the network

pub mod run;
pub mod validate;

pub use run::{Briefing, RunOptions, RunSummary, run_briefing};
pub use validate::run_validate;
