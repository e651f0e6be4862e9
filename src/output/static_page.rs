// src/output/static_page.rs

//! Static page output.
//!
//! Writes `briefing.json` and `index.html` with a temp-file + rename so a
//! reader never observes a half-written file. Each run overwrites the
//! previous one; two runs writing the same directory at once are not
//! supported.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Report, ReportConfig};
use crate::output::{Delivery, ReportSink};
use crate::services::{render_html, render_table};

const PAYLOAD_FILE: &str = "briefing.json";
const PAGE_FILE: &str = "index.html";

/// Local directory sink for the table payload and HTML page.
pub struct StaticPageSink {
    root_dir: PathBuf,
    report: ReportConfig,
}

impl StaticPageSink {
    pub fn new(root_dir: impl Into<PathBuf>, report: ReportConfig) -> Self {
        Self {
            root_dir: root_dir.into(),
            report,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.root_dir.join(key);
        tokio::fs::create_dir_all(&self.root_dir)
            .await
            .map_err(|e| AppError::storage(self.root_dir.display().to_string(), e))?;

        let tmp = path.with_extension("tmp");
        let write = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            drop(file);
            tokio::fs::rename(&tmp, &path).await
        };

        if let Err(e) = write.await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::storage(path.display().to_string(), e));
        }
        Ok(())
    }
}

#[async_trait]
impl ReportSink for StaticPageSink {
    fn name(&self) -> &str {
        "static-page"
    }

    async fn deliver(&self, report: &Report) -> Result<Delivery> {
        let payload = render_table(report);
        let json = serde_json::to_vec_pretty(&payload)?;
        let html = render_html(&payload, self.report.title(report.mode));

        self.write_bytes(PAYLOAD_FILE, &json).await?;
        self.write_bytes(PAGE_FILE, html.as_bytes()).await?;

        Ok(Delivery::Written {
            path: self.root_dir.clone(),
        })
    }
}
