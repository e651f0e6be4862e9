// src/services/pacing.rs

//! Fixed per-provider call spacing.
//!
//! Each provider id owns a "next free slot". A caller reserves the current
//! slot under the lock, pushes it forward by the provider's gap, and sleeps
//! until its reserved instant outside the lock. Concurrent sections sharing
//! a provider are therefore serialized without holding the lock across an
//! await.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::models::Config;

pub struct Pacer {
    default_gap: Duration,
    overrides: HashMap<String, Duration>,
    slots: Mutex<HashMap<String, Instant>>,
}

impl Pacer {
    pub fn new(default_gap: Duration) -> Self {
        Self {
            default_gap,
            overrides: HashMap::new(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_gap(mut self, provider: impl Into<String>, gap: Duration) -> Self {
        self.overrides.insert(provider.into(), gap);
        self
    }

    pub fn from_config(config: &Config) -> Self {
        config.providers.iter().fold(
            Self::new(Duration::from_millis(config.pacing.min_gap_ms)),
            |pacer, p| match p.min_gap_ms {
                Some(ms) => pacer.with_gap(p.id.clone(), Duration::from_millis(ms)),
                None => pacer,
            },
        )
    }

    pub fn gap(&self, provider: &str) -> Duration {
        self.overrides
            .get(provider)
            .copied()
            .unwrap_or(self.default_gap)
    }

    /// Wait until `provider` may be called again.
    pub async fn wait(&self, provider: &str) {
        let gap = self.gap(provider);
        if gap.is_zero() {
            return;
        }

        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            let now = Instant::now();
            let slot = slots.get(provider).copied().unwrap_or(now).max(now);
            slots.insert(provider.to_string(), slot + gap);
            slot
        };

        if slot > Instant::now() {
            log::debug!("Pacing {} for {:?}", provider, slot - Instant::now());
            tokio::time::sleep_until(slot).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_same_provider_is_spaced() {
        let pacer = Pacer::new(Duration::from_millis(500));
        let start = Instant::now();

        pacer.wait("yahoo").await;
        pacer.wait("yahoo").await;
        pacer.wait("yahoo").await;

        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_providers_are_independent() {
        let pacer = Pacer::new(Duration::from_millis(500));
        let start = Instant::now();

        pacer.wait("yahoo").await;
        pacer.wait("stooq").await;
        pacer.wait("naver").await;

        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_override_gap() {
        let pacer = Pacer::new(Duration::from_millis(500)).with_gap("cnn", Duration::ZERO);
        let start = Instant::now();

        pacer.wait("cnn").await;
        pacer.wait("cnn").await;

        assert_eq!(pacer.gap("cnn"), Duration::ZERO);
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_serialized() {
        let pacer = std::sync::Arc::new(Pacer::new(Duration::from_millis(200)));
        let start = Instant::now();

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let pacer = pacer.clone();
                tokio::spawn(async move { pacer.wait("yahoo").await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(600));
    }
}
