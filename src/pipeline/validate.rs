// src/pipeline/validate.rs

use crate::error::Result;
use crate::models::{Config, SectionKind};
use crate::utils::log;

/// Validate configuration and print what a run would collect.
pub fn run_validate(config: &Config) -> Result<()> {
    log::header("Validating configuration");

    if let Err(e) = config.validate() {
        log::error(&format!("Config validation failed: {}", e));
        return Err(e);
    }

    log::success("Config OK");
    log::sub_item(&format!("User agent: {}", config.http.user_agent));
    log::sub_item(&format!("Timeout: {}s", config.http.timeout_secs));
    log::sub_item(&format!(
        "Schedule: {} (cutoff {:02}:00, evening baseline {:?})",
        config.schedule.timezone, config.schedule.cutoff_hour, config.schedule.evening_baseline
    ));

    for section in &config.sections {
        let modes: Vec<_> = section.modes.iter().map(|m| m.as_str()).collect();
        let detail = if section.kind == SectionKind::News {
            "derived from annotations".to_string()
        } else {
            format!("{} instruments", section.instruments.len())
        };
        log::sub_item(&format!(
            "[{}] {}: {} ({})",
            section.kind.as_str(),
            section.title(),
            detail,
            modes.join("/")
        ));
    }

    let token_set = std::env::var(&config.transport.token_env).is_ok();
    let chat_set = std::env::var(&config.transport.chat_id_env).is_ok();
    if config.transport.enabled && !(token_set && chat_set) {
        log::warn(&format!(
            "{} / {} not set; chat delivery will be skipped",
            config.transport.token_env, config.transport.chat_id_env
        ));
    }

    Ok(())
}
