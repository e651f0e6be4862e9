// src/models/config.rs

//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{BaselineRule, Instrument, Mode, SectionKind};
use crate::providers::KNOWN_PROVIDERS;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings shared by all providers
    #[serde(default)]
    pub http: HttpConfig,

    /// Spacing between calls to the same provider
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Mode selection
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Report text settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Chat message transport
    #[serde(default)]
    pub transport: TransportConfig,

    /// Static page output
    #[serde(default)]
    pub output: OutputConfig,

    /// Console output settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-provider overrides
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    /// Sections and their instruments, in display order
    #[serde(default = "defaults::sections")]
    pub sections: Vec<SectionConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("cannot read {}: {e}", path.display())))?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values.
    ///
    /// Anything rejected here would make the run meaningless, so the
    /// pipeline refuses to start collecting.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.schedule.cutoff_hour > 23 {
            return Err(AppError::validation("schedule.cutoff_hour must be 0-23"));
        }
        self.timezone()?;
        if self.report.max_message_len < 256 {
            return Err(AppError::validation(
                "report.max_message_len must be >= 256",
            ));
        }
        if self.pacing.concurrent_sections && self.pacing.max_concurrent_sections == 0 {
            return Err(AppError::validation(
                "pacing.max_concurrent_sections must be > 0",
            ));
        }

        for provider in &self.providers {
            if !KNOWN_PROVIDERS.contains(&provider.id.as_str()) {
                return Err(AppError::validation(format!(
                    "providers: unknown provider '{}'",
                    provider.id
                )));
            }
        }

        for section in &self.sections {
            let kind = section.kind.as_str();
            if section.kind == SectionKind::News {
                if !section.instruments.is_empty() {
                    return Err(AppError::validation(
                        "news section is derived from annotations and takes no instruments",
                    ));
                }
                continue;
            }

            let mut seen = HashSet::new();
            for inst in &section.instruments {
                if inst.id.trim().is_empty() {
                    return Err(AppError::validation(format!(
                        "{kind}: instrument with empty id"
                    )));
                }
                if !seen.insert(inst.id.as_str()) {
                    return Err(AppError::validation(format!(
                        "{kind}: duplicate instrument '{}'",
                        inst.id
                    )));
                }
                if inst.sources.is_empty() {
                    return Err(AppError::validation(format!(
                        "{kind}: instrument '{}' has no sources",
                        inst.id
                    )));
                }
                if let Some(source) = inst
                    .sources
                    .iter()
                    .find(|s| !KNOWN_PROVIDERS.contains(&s.provider.as_str()))
                {
                    return Err(AppError::validation(format!(
                        "{kind}: instrument '{}' uses unknown provider '{}'",
                        inst.id, source.provider
                    )));
                }
            }
        }

        if self.instrument_count() == 0 {
            return Err(AppError::validation("No instruments configured"));
        }
        Ok(())
    }

    /// Parsed schedule timezone.
    pub fn timezone(&self) -> Result<Tz> {
        self.schedule.timezone.parse::<Tz>().map_err(|e| {
            AppError::validation(format!(
                "schedule.timezone '{}' is not an IANA zone: {e}",
                self.schedule.timezone
            ))
        })
    }

    /// Number of configured instruments across all sections.
    pub fn instrument_count(&self) -> usize {
        self.sections.iter().map(|s| s.instruments.len()).sum()
    }

    /// Overrides for a provider, if any.
    pub fn provider(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            pacing: PacingConfig::default(),
            schedule: ScheduleConfig::default(),
            report: ReportConfig::default(),
            transport: TransportConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            providers: Vec::new(),
            sections: defaults::sections(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header; some providers block obvious bots
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Call pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Minimum gap between two calls to the same provider, in milliseconds
    #[serde(default = "defaults::min_gap")]
    pub min_gap_ms: u64,

    /// Fetch sections concurrently (per-provider pacing still applies)
    #[serde(default)]
    pub concurrent_sections: bool,

    /// Upper bound on sections fetched at once
    #[serde(default = "defaults::max_concurrent_sections")]
    pub max_concurrent_sections: usize,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_gap_ms: defaults::min_gap(),
            concurrent_sections: false,
            max_concurrent_sections: defaults::max_concurrent_sections(),
        }
    }
}

/// Mode selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// IANA timezone the cutoff hour is expressed in
    #[serde(default = "defaults::timezone")]
    pub timezone: String,

    /// Local hour from which runs are pre-market/evening runs
    #[serde(default = "defaults::cutoff_hour")]
    pub cutoff_hour: u32,

    /// Baseline used for evening percent change
    #[serde(default = "defaults::evening_baseline")]
    pub evening_baseline: BaselineRule,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: defaults::timezone(),
            cutoff_hour: defaults::cutoff_hour(),
            evening_baseline: defaults::evening_baseline(),
        }
    }
}

/// Report text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "defaults::morning_title")]
    pub morning_title: String,

    #[serde(default = "defaults::evening_title")]
    pub evening_title: String,

    /// Line placed between sections
    #[serde(default = "defaults::separator")]
    pub separator: String,

    /// Maximum characters per transport message
    #[serde(default = "defaults::max_message_len")]
    pub max_message_len: usize,
}

impl ReportConfig {
    pub fn title(&self, mode: Mode) -> &str {
        match mode {
            Mode::Morning => &self.morning_title,
            Mode::PreMarketEvening => &self.evening_title,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            morning_title: defaults::morning_title(),
            evening_title: defaults::evening_title(),
            separator: defaults::separator(),
            max_message_len: defaults::max_message_len(),
        }
    }
}

/// Telegram transport settings. Credentials come from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Environment variable holding the bot token
    #[serde(default = "defaults::token_env")]
    pub token_env: String,

    /// Environment variable holding the chat id
    #[serde(default = "defaults::chat_id_env")]
    pub chat_id_env: String,

    #[serde(default = "defaults::parse_mode")]
    pub parse_mode: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            api_base: defaults::api_base(),
            token_env: defaults::token_env(),
            chat_id_env: defaults::chat_id_env(),
            parse_mode: defaults::parse_mode(),
        }
    }
}

/// Static page output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "defaults::enabled")]
    pub page_enabled: bool,

    /// Directory (relative to the storage dir) receiving the page files
    #[serde(default = "defaults::page_dir")]
    pub page_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            page_enabled: defaults::enabled(),
            page_dir: defaults::page_dir(),
        }
    }
}

/// Console output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,

    /// Print one line per resolved instrument
    #[serde(default = "defaults::enabled")]
    pub show_progress: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            show_progress: defaults::enabled(),
        }
    }
}

/// Per-provider tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,

    /// Skip this provider entirely
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Attempts on timeout before giving up (1 = no retry)
    #[serde(default)]
    pub retry_attempts: Option<u32>,

    /// Fixed pause between timeout retries, in milliseconds
    #[serde(default)]
    pub retry_pause_ms: Option<u64>,

    /// Overrides `pacing.min_gap_ms` for this provider
    #[serde(default)]
    pub min_gap_ms: Option<u64>,
}

/// A section of the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionConfig {
    pub kind: SectionKind,

    /// Heading, defaults to the kind's title
    #[serde(default)]
    pub title: Option<String>,

    /// Modes in which this section is collected
    #[serde(default = "defaults::modes")]
    pub modes: Vec<Mode>,

    #[serde(default)]
    pub instruments: Vec<Instrument>,
}

impl SectionConfig {
    pub fn new(kind: SectionKind, instruments: Vec<Instrument>) -> Self {
        Self {
            kind,
            title: None,
            modes: defaults::modes(),
            instruments,
        }
    }

    pub fn title(&self) -> &str {
        self.title
            .as_deref()
            .unwrap_or_else(|| self.kind.default_title())
    }
}

mod defaults {
    use super::SectionConfig;
    use crate::models::{BaselineRule, Category, Instrument, Mode, SectionKind, Source};

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/124.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        5
    }

    // Pacing defaults
    pub fn min_gap() -> u64 {
        500
    }
    pub fn max_concurrent_sections() -> usize {
        3
    }

    // Schedule defaults
    pub fn timezone() -> String {
        "Asia/Seoul".into()
    }
    pub fn cutoff_hour() -> u32 {
        12
    }
    pub fn evening_baseline() -> BaselineRule {
        BaselineRule::OfficialClose
    }

    // Report defaults
    pub fn morning_title() -> String {
        "📈 [모닝 브리핑]".into()
    }
    pub fn evening_title() -> String {
        "🌙 [프리마켓 브리핑]".into()
    }
    pub fn separator() -> String {
        "------------------".into()
    }
    pub fn max_message_len() -> usize {
        4096
    }

    // Transport defaults
    pub fn enabled() -> bool {
        true
    }
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn token_env() -> String {
        "TELEGRAM_TOKEN".into()
    }
    pub fn chat_id_env() -> String {
        "TELEGRAM_CHAT_ID".into()
    }
    pub fn parse_mode() -> String {
        "Markdown".into()
    }

    // Output defaults
    pub fn page_dir() -> String {
        "public".into()
    }
    pub fn log_level() -> String {
        "info".into()
    }

    pub fn modes() -> Vec<Mode> {
        vec![Mode::Morning, Mode::PreMarketEvening]
    }

    fn weather(location: &str, coordinates: &str) -> Instrument {
        Instrument::new(
            location,
            Category::Weather,
            vec![
                Source::new("naver", location),
                Source::new("open_meteo", coordinates),
            ],
        )
    }

    fn dual(id: &str, name: &str, category: Category, stooq: &str) -> Instrument {
        Instrument::new(
            id,
            category,
            vec![Source::new("yahoo", id), Source::new("stooq", stooq)],
        )
        .named(name)
    }

    const WATCHLIST: &[&str] = &[
        "SWKS", "NVDA", "TSLA", "AAPL", "MSFT", "SOXL", "LABU", "TQQQ", "RETL", "FNGU", "ETHT",
        "AVGO", "AMZN", "NFLX", "GOOGL", "IONQ", "PLTR", "ETN", "TSM", "MU", "AXON", "META",
    ];
    const ANNOTATED: &[&str] = &["NVDA", "TSLA", "AAPL"];

    pub fn sections() -> Vec<SectionConfig> {
        let mut weather_section = SectionConfig::new(
            SectionKind::Weather,
            vec![
                weather("성동구", "37.5633,127.0371"),
                weather("대치동", "37.4994,127.0626"),
            ],
        );
        weather_section.modes = vec![Mode::Morning];

        let watchlist = WATCHLIST
            .iter()
            .map(|ticker| {
                let inst = Instrument::us_equity(ticker);
                if ANNOTATED.contains(ticker) {
                    inst.annotated()
                } else {
                    inst
                }
            })
            .collect();

        vec![
            weather_section,
            SectionConfig::new(
                SectionKind::Indices,
                vec![
                    dual("^GSPC", "S&P 500", Category::Index, "^spx"),
                    dual("^IXIC", "NASDAQ", Category::Index, "^ndq"),
                    dual("^DJI", "Dow Jones", Category::Index, "^dji"),
                    dual("^KS11", "KOSPI", Category::Index, "^kospi"),
                    dual("KRW=X", "USD/KRW", Category::Fx, "usdkrw"),
                ],
            ),
            SectionConfig::new(
                SectionKind::Sentiment,
                vec![
                    Instrument::new(
                        "FEAR_GREED",
                        Category::Sentiment,
                        vec![Source::new("cnn", "fear-and-greed")],
                    )
                    .named("CNN Fear & Greed"),
                    Instrument::new(
                        "CRYPTO_FEAR_GREED",
                        Category::Sentiment,
                        vec![Source::new("alternative_me", "fng")],
                    )
                    .named("Crypto Fear & Greed"),
                ],
            ),
            SectionConfig::new(
                SectionKind::Commodities,
                vec![
                    dual("GC=F", "Gold", Category::Commodity, "gc.f"),
                    dual("CL=F", "WTI", Category::Commodity, "cl.f"),
                    dual("BTC-USD", "Bitcoin", Category::Crypto, "btcusd"),
                ],
            ),
            SectionConfig::new(SectionKind::Watchlist, watchlist),
            SectionConfig::new(SectionKind::News, Vec::new()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Source};

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn default_universe_matches_watchlist() {
        let config = Config::default();
        let watchlist = config
            .sections
            .iter()
            .find(|s| s.kind == SectionKind::Watchlist)
            .unwrap();
        assert_eq!(watchlist.instruments.len(), 22);
        assert_eq!(watchlist.instruments[0].id, "SWKS");
        assert_eq!(watchlist.instruments[21].id, "META");
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_no_instruments() {
        let mut config = Config::default();
        config.sections = vec![SectionConfig::new(SectionKind::News, Vec::new())];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("No instruments configured"));
    }

    #[test]
    fn validate_rejects_unknown_provider() {
        let mut config = Config::default();
        config.sections = vec![SectionConfig::new(
            SectionKind::Watchlist,
            vec![Instrument::new(
                "AAPL",
                Category::Equity,
                vec![Source::new("bloomberg", "AAPL")],
            )],
        )];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicates_in_section() {
        let mut config = Config::default();
        config.sections = vec![SectionConfig::new(
            SectionKind::Watchlist,
            vec![Instrument::us_equity("AAPL"), Instrument::us_equity("AAPL")],
        )];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_timezone() {
        let mut config = Config::default();
        config.schedule.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_minimal_toml_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [schedule]
            cutoff_hour = 15
            evening_baseline = "first_sample"

            [[sections]]
            kind = "watchlist"

            [[sections.instruments]]
            id = "AAPL"
            category = "equity"
            sources = [{ provider = "yahoo", symbol = "AAPL" }]
            "#,
        )
        .unwrap();

        assert_eq!(config.schedule.cutoff_hour, 15);
        assert_eq!(config.schedule.evening_baseline, BaselineRule::FirstSample);
        assert_eq!(config.schedule.timezone, "Asia/Seoul");
        assert_eq!(config.sections.len(), 1);
        assert_eq!(config.sections[0].modes.len(), 2);
        assert_eq!(config.sections[0].title(), "📊 미국 주식 현황");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_reads_file_and_reports_missing_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("briefing.toml");
        fs::write(&path, "[schedule]\ncutoff_hour = 9\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.schedule.cutoff_hour, 9);

        let err = Config::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
