// src/lib.rs

//! Market and weather briefing library.
//!
//! Collects quotes, weather and sentiment readings from unreliable public
//! providers with ordered fallback, composes them into a single report and
//! delivers it to a chat transport and a static page.

pub mod error;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod providers;
pub mod services;
pub mod utils;
