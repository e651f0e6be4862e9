// src/services/mode.rs

//! Run mode selection from local wall-clock time.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::Result;
use crate::models::{BaselineRule, Config, Mode, ScheduleConfig, SectionConfig, SectionKind, Window};

/// Morning before `cutoff_hour`, pre-market/evening from it on.
pub fn select_mode<Z: chrono::TimeZone>(now_local: &DateTime<Z>, cutoff_hour: u32) -> Mode {
    if now_local.hour() < cutoff_hour {
        Mode::Morning
    } else {
        Mode::PreMarketEvening
    }
}

/// `now` converted to the configured schedule timezone.
pub fn local_time(config: &Config, now: DateTime<Utc>) -> Result<DateTime<Tz>> {
    Ok(now.with_timezone(&config.timezone()?))
}

/// What a mode implies for collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeProfile {
    pub mode: Mode,
    pub window: Window,
    pub baseline: BaselineRule,
}

impl ModeProfile {
    /// Whether `section` is collected in this mode.
    ///
    /// Weather is a morning-only section whatever the configuration says.
    pub fn includes(&self, section: &SectionConfig) -> bool {
        if section.kind == SectionKind::Weather && self.mode != Mode::Morning {
            return false;
        }
        section.modes.contains(&self.mode)
    }
}

impl Mode {
    pub fn profile(self, schedule: &ScheduleConfig) -> ModeProfile {
        match self {
            Mode::Morning => ModeProfile {
                mode: self,
                window: Window::Daily,
                baseline: BaselineRule::PriorClose,
            },
            Mode::PreMarketEvening => ModeProfile {
                mode: self,
                window: Window::Intraday,
                baseline: schedule.evening_baseline,
            },
        }
    }
}
