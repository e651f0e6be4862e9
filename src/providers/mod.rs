// src/providers/mod.rs

//! Data provider clients.
//!
//! Each provider turns a provider-specific symbol into a [`RawSeries`] or a
//! typed [`ProviderError`]. Providers never retry on their own; the only
//! retry is the uniform, bounded [`RetryPolicy`] applied on timeouts by the
//! registry wrapper.
//!
//! | id | serves |
//! |---|---|
//! | `yahoo` | equities, indices, FX, commodities, crypto |
//! | `stooq` | same, daily window only |
//! | `naver` | current weather by location name |
//! | `open_meteo` | current weather by coordinates |
//! | `cnn` | CNN Fear & Greed index |
//! | `alternative_me` | crypto Fear & Greed index |

pub mod alternative_me;
pub mod cnn;
pub mod naver;
pub mod news;
pub mod open_meteo;
pub mod stooq;
pub mod yahoo;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{Config, FailureReason, RawSeries, Window};

pub use alternative_me::AlternativeMeProvider;
pub use cnn::CnnProvider;
pub use naver::NaverWeatherProvider;
pub use news::{Enricher, NewsEnricher};
pub use open_meteo::OpenMeteoProvider;
pub use stooq::StooqProvider;
pub use yahoo::YahooProvider;

/// Provider ids accepted in configuration.
pub const KNOWN_PROVIDERS: &[&str] = &[
    yahoo::ID,
    stooq::ID,
    naver::ID,
    open_meteo::ID,
    cnn::ID,
    alternative_me::ID,
];

/// Failure at the provider boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,

    #[error("rate limited (HTTP {0})")]
    RateLimited(u16),

    #[error("symbol not found")]
    NotFound,

    #[error("invalid symbol '{0}'")]
    InvalidSymbol(String),

    #[error("unexpected HTTP status {0}")]
    Http(u16),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("no data: {0}")]
    NoData(String),

    /// The provider does not serve this kind of request at all.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl ProviderError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::NoData(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            403 | 418 | 429 => Self::RateLimited(status.as_u16()),
            404 => Self::NotFound,
            code => Self::Http(code),
        }
    }

    /// The per-instrument failure reason this error is reported as.
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::Timeout => FailureReason::Timeout,
            Self::RateLimited(_) => FailureReason::RateLimited,
            Self::NotFound | Self::InvalidSymbol(_) => FailureReason::NotFound,
            Self::Parse(_) => FailureReason::ParseError,
            Self::Http(_) | Self::NoData(_) | Self::Unsupported(_) => FailureReason::NoData,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::from_status(status)
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::NoData(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// A source of time series for one family of quantities.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Stable identifier used in configuration and provenance.
    fn id(&self) -> &str;

    /// Fetch the series for `symbol` over `window`.
    async fn fetch(&self, symbol: &str, window: Window) -> Result<RawSeries, ProviderError>;
}

/// Send a request and return the body of a successful response.
pub(crate) async fn send_text(request: RequestBuilder) -> Result<String, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::from_status(status));
    }
    Ok(response.text().await?)
}

/// Send a request and decode a successful JSON response.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let body = send_text(request).await?;
    Ok(serde_json::from_str(&body)?)
}

/// Bounded retry applied to timeouts only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Fixed pause between attempts
    pub pause: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, pause: Duration) -> Self {
        Self { attempts, pause }
    }

    /// Single attempt.
    pub const fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Run `op`, retrying while it fails with [`ProviderError::Timeout`].
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Err(ProviderError::Timeout) if attempt < attempts => {
                    log::debug!("Timeout on attempt {}/{}, retrying", attempt, attempts);
                    attempt += 1;
                    tokio::time::sleep(self.pause).await;
                }
                result => return result,
            }
        }
    }
}

/// Default retry policy per provider.
fn default_retry(id: &str) -> RetryPolicy {
    match id {
        yahoo::ID => RetryPolicy::new(3, Duration::from_millis(500)),
        cnn::ID => RetryPolicy::new(2, Duration::from_millis(1000)),
        _ => RetryPolicy::none(),
    }
}

/// Wraps a provider with a timeout retry policy.
struct Retrying {
    inner: Arc<dyn QuoteProvider>,
    policy: RetryPolicy,
}

#[async_trait]
impl QuoteProvider for Retrying {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn fetch(&self, symbol: &str, window: Window) -> Result<RawSeries, ProviderError> {
        self.policy
            .run(|| self.inner.fetch(symbol, window))
            .await
    }
}

/// Providers available to the resolver, by id.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn QuoteProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own id, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn QuoteProvider>) {
        self.providers.insert(provider.id().to_string(), provider);
    }

    /// Register a provider wrapped in a timeout retry policy.
    pub fn register_with_retry(&mut self, provider: Arc<dyn QuoteProvider>, policy: RetryPolicy) {
        if policy.attempts <= 1 {
            self.register(provider);
        } else {
            self.register(Arc::new(Retrying {
                inner: provider,
                policy,
            }));
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn QuoteProvider>> {
        self.providers.get(id)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Build every enabled provider with the shared HTTP client.
    pub fn from_config(config: &Config, client: &Client) -> Self {
        let mut registry = Self::new();

        for &id in KNOWN_PROVIDERS {
            let overrides = config.provider(id);
            if overrides.is_some_and(|p| !p.enabled) {
                log::info!("Provider '{}' disabled by configuration", id);
                continue;
            }

            let provider: Arc<dyn QuoteProvider> = match id {
                yahoo::ID => Arc::new(YahooProvider::new(client.clone())),
                stooq::ID => Arc::new(StooqProvider::new(client.clone())),
                naver::ID => Arc::new(NaverWeatherProvider::new(client.clone())),
                open_meteo::ID => Arc::new(OpenMeteoProvider::new(client.clone())),
                cnn::ID => Arc::new(CnnProvider::new(client.clone())),
                alternative_me::ID => Arc::new(AlternativeMeProvider::new(client.clone())),
                _ => continue,
            };

            let mut policy = default_retry(id);
            if let Some(p) = overrides {
                if let Some(attempts) = p.retry_attempts {
                    policy.attempts = attempts;
                }
                if let Some(pause) = p.retry_pause_ms {
                    policy.pause = Duration::from_millis(pause);
                }
            }
            registry.register_with_retry(provider, policy);
        }

        registry
    }
}
