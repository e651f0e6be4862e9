//! Briefing CLI
//!
//! Local and scheduled execution entry point.

use std::path::{Path, PathBuf};

use briefing::{
    error::{AppError, Result},
    models::{Config, Mode},
    pipeline::{self, Briefing, RunOptions},
    services::{local_time, select_mode},
    utils,
};
use chrono::Utc;
use clap::{Parser, Subcommand};

/// Briefing - market and weather digest
#[derive(Parser, Debug)]
#[command(
    name = "briefing",
    version,
    about = "Collects market, weather and sentiment data into a daily briefing"
)]
struct Cli {
    /// Path to storage directory containing config.toml
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect, compose and deliver one briefing
    Run {
        /// Force a mode instead of deriving it from the clock (morning|evening)
        #[arg(long)]
        mode: Option<Mode>,

        /// Do not send the chat message
        #[arg(long)]
        no_send: bool,

        /// Do not write the static page
        #[arg(long)]
        no_page: bool,

        /// Print the rendered message to stdout
        #[arg(long)]
        print: bool,

        /// Exit with an error if any sink failed
        #[arg(long)]
        strict: bool,
    },

    /// Validate configuration file
    Validate,

    /// Show the mode the clock selects right now
    Mode,
}

/// Initialize logging based on verbosity flag.
#[cfg(not(feature = "json-logs"))]
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Initialize JSON logging for unattended runs; `log` records are bridged.
#[cfg(feature = "json-logs")]
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .init();
}

/// Load config.toml from the storage dir, or defaults when it does not exist.
fn load_config(storage_dir: &Path) -> Result<Config> {
    let config_path = storage_dir.join("config.toml");
    if config_path.exists() {
        log::info!("Loading configuration from {}", config_path.display());
        Config::load(&config_path)
    } else {
        log::info!(
            "No config at {}, using built-in defaults",
            config_path.display()
        );
        Ok(Config::default())
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli.storage_dir)?;
    let console_level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    utils::log::init(console_level);

    match cli.command {
        Command::Run {
            mode,
            no_send,
            no_page,
            print,
            strict,
        } => {
            let options = RunOptions {
                send: !no_send,
                page: !no_page,
            };
            let briefing = Briefing::from_config(&config, &cli.storage_dir, &options)?;
            let summary = pipeline::run_briefing(&config, &briefing, mode, Utc::now()).await?;

            if print {
                println!("{}", summary.text);
            }

            let failed = summary.failed_sinks();
            if strict && failed > 0 {
                return Err(AppError::transport(
                    "dispatch",
                    format!("{failed} sink(s) failed"),
                ));
            }
        }

        Command::Validate => {
            pipeline::run_validate(&config)?;
        }

        Command::Mode => {
            let local = local_time(&config, Utc::now())?;
            let mode = select_mode(&local, config.schedule.cutoff_hour);
            let profile = mode.profile(&config.schedule);
            println!(
                "{} ({} {}, window {:?}, baseline {:?})",
                mode,
                local.format("%Y-%m-%d %H:%M"),
                config.schedule.timezone,
                profile.window,
                profile.baseline
            );
        }
    }

    Ok(())
}
