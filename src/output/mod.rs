// src/output/mod.rs

//! Report delivery.
//!
//! Every sink receives the same finished [`Report`]. Sinks are independent:
//! [`dispatch`] runs all of them and records each result, so one failing
//! sink never prevents or undoes another.
//!
//! ## Static page layout
//!
//! ```text
//! {storage_dir}/{page_dir}/
//! ├── briefing.json   # Table payload of the latest run
//! └── index.html      # Unstyled page rendered from the payload
//! ```

pub mod static_page;
pub mod telegram;

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Report;

pub use static_page::StaticPageSink;
pub use telegram::TelegramSink;

/// What a sink did with the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Message sent in `parts` chunks
    Sent { parts: usize },
    /// Artifacts written under `path`
    Written { path: PathBuf },
    /// Sink disabled for this run
    Skipped(String),
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delivery::Sent { parts } => write!(f, "sent ({parts} message(s))"),
            Delivery::Written { path } => write!(f, "written to {}", path.display()),
            Delivery::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

/// Per-sink result of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    Delivered { sink: String, delivery: Delivery },
    Failed { sink: String, error: String },
}

impl SinkOutcome {
    pub fn sink(&self) -> &str {
        match self {
            SinkOutcome::Delivered { sink, .. } | SinkOutcome::Failed { sink, .. } => sink,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SinkOutcome::Failed { .. })
    }
}

/// A destination for the finished report.
#[async_trait]
pub trait ReportSink: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, report: &Report) -> Result<Delivery>;
}

/// Run every sink in order, isolating failures.
pub async fn dispatch(report: &Report, sinks: &[Box<dyn ReportSink>]) -> Vec<SinkOutcome> {
    let mut outcomes = Vec::with_capacity(sinks.len());
    for sink in sinks {
        let outcome = match sink.deliver(report).await {
            Ok(delivery) => {
                log::info!("Sink '{}': {}", sink.name(), delivery);
                SinkOutcome::Delivered {
                    sink: sink.name().to_string(),
                    delivery,
                }
            }
            Err(e) => {
                log::error!("Sink '{}' failed: {}", sink.name(), e);
                SinkOutcome::Failed {
                    sink: sink.name().to_string(),
                    error: e.to_string(),
                }
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use chrono::DateTime;

    use crate::error::AppError;
    use crate::models::Mode;

    /// Records the reports it receives; optionally fails.
    pub(crate) struct RecordingSink {
        pub(crate) name: String,
        pub(crate) fail: bool,
        received: Arc<Mutex<Vec<Report>>>,
    }

    impl RecordingSink {
        pub(crate) fn new(name: &str, fail: bool) -> Self {
            Self {
                name: name.to_string(),
                fail,
                received: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Handle on the reports delivered so far.
        pub(crate) fn received(&self) -> Arc<Mutex<Vec<Report>>> {
            Arc::clone(&self.received)
        }
    }

    #[async_trait]
    impl ReportSink for RecordingSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn deliver(&self, report: &Report) -> Result<Delivery> {
            self.received.lock().unwrap().push(report.clone());
            if self.fail {
                Err(AppError::transport(&self.name, "HTTP 500"))
            } else {
                Ok(Delivery::Sent { parts: 1 })
            }
        }
    }

    fn empty_report() -> Report {
        Report {
            mode: Mode::Morning,
            generated_at: DateTime::parse_from_rfc3339("2025-10-20T07:30:00+09:00").unwrap(),
            sections: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_failed_sink_does_not_stop_others() {
        let first = RecordingSink::new("first", true);
        let second = RecordingSink::new("second", false);
        let received = second.received();
        let sinks: Vec<Box<dyn ReportSink>> = vec![Box::new(first), Box::new(second)];
        let report = empty_report();

        let outcomes = dispatch(&report, &sinks).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_failed());
        assert_eq!(outcomes[0].sink(), "first");
        assert_eq!(
            outcomes[1],
            SinkOutcome::Delivered {
                sink: "second".to_string(),
                delivery: Delivery::Sent { parts: 1 },
            }
        );
        assert_eq!(received.lock().unwrap().as_slice(), &[report]);
    }

    #[test]
    fn test_delivery_display() {
        assert_eq!(
            Delivery::Skipped("no credentials".to_string()).to_string(),
            "skipped: no credentials"
        );
    }
}
