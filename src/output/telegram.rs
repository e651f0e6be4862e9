// src/output/telegram.rs

//! Telegram Bot API transport.
//!
//! Credentials come from the environment. When either is missing the sink
//! reports itself as skipped instead of failing the run.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Report, ReportConfig, TransportConfig};
use crate::output::{Delivery, ReportSink};
use crate::services::{TextOptions, render_text, split_message};

const NAME: &str = "telegram";

#[derive(Debug, Clone)]
struct Credentials {
    token: String,
    chat_id: String,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Sends the rendered report as one or more chat messages.
pub struct TelegramSink {
    client: Client,
    api_base: String,
    parse_mode: String,
    report: ReportConfig,
    credentials: Option<Credentials>,
}

impl TelegramSink {
    /// Build the sink, reading credentials from the configured env vars.
    pub fn from_env(client: Client, transport: &TransportConfig, report: &ReportConfig) -> Self {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let credentials = match (read(&transport.token_env), read(&transport.chat_id_env)) {
            (Some(token), Some(chat_id)) => Some(Credentials { token, chat_id }),
            _ => None,
        };
        Self::build(client, transport, report, credentials)
    }

    pub fn with_credentials(
        client: Client,
        transport: &TransportConfig,
        report: &ReportConfig,
        token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        let credentials = Some(Credentials {
            token: token.into(),
            chat_id: chat_id.into(),
        });
        Self::build(client, transport, report, credentials)
    }

    fn build(
        client: Client,
        transport: &TransportConfig,
        report: &ReportConfig,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            client,
            api_base: transport.api_base.trim_end_matches('/').to_string(),
            parse_mode: transport.parse_mode.clone(),
            report: report.clone(),
            credentials,
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    async fn send(
        &self,
        credentials: &Credentials,
        text: &str,
        parse_mode: Option<&str>,
    ) -> std::result::Result<(), SendError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, credentials.token);
        let body = SendMessage {
            chat_id: &credentials.chat_id,
            text,
            parse_mode,
            disable_web_page_preview: true,
        };

        // The URL carries the bot token; keep it out of error messages.
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SendError::Failed(AppError::transport(NAME, e.without_url())))?;
        let status = response.status().as_u16();
        let api: Option<ApiResponse> = response.json().await.ok();

        match api {
            Some(api) if (200..300).contains(&status) && api.ok => Ok(()),
            Some(api) => {
                let description = api.description.unwrap_or_default();
                if is_markup_rejection(status, &description) {
                    Err(SendError::Markup(description))
                } else {
                    Err(SendError::Failed(AppError::transport(
                        NAME,
                        format!("HTTP {status}: {description}"),
                    )))
                }
            }
            None => Err(SendError::Failed(AppError::transport(
                NAME,
                format!("HTTP {status}"),
            ))),
        }
    }
}

/// Outcome of a rejected `sendMessage` call.
#[derive(Debug)]
enum SendError {
    /// The server could not parse the message markup
    Markup(String),
    Failed(AppError),
}

impl From<SendError> for AppError {
    fn from(err: SendError) -> Self {
        match err {
            SendError::Markup(description) => {
                AppError::transport(NAME, format!("HTTP 400: {description}"))
            }
            SendError::Failed(e) => e,
        }
    }
}

/// Bot API answer for text whose entities do not parse.
fn is_markup_rejection(status: u16, description: &str) -> bool {
    status == 400 && description.to_lowercase().contains("can't parse entities")
}

#[async_trait]
impl ReportSink for TelegramSink {
    fn name(&self) -> &str {
        NAME
    }

    async fn deliver(&self, report: &Report) -> Result<Delivery> {
        let Some(credentials) = &self.credentials else {
            return Ok(Delivery::Skipped("missing bot token or chat id".to_string()));
        };

        let options = TextOptions::from_config(&self.report, report.mode);
        let text = render_text(report, &options);
        let chunks = split_message(&text, self.report.max_message_len);
        let parse_mode = Some(self.parse_mode.as_str()).filter(|m| !m.is_empty());

        for (i, chunk) in chunks.iter().enumerate() {
            match self.send(credentials, chunk, parse_mode).await {
                Ok(()) => {}
                // Only a markup rejection is resent; anything else may already have been delivered.
                Err(SendError::Markup(description)) if parse_mode.is_some() => {
                    log::warn!(
                        "Part {}/{} rejected with markup ({}), resending as plain text",
                        i + 1,
                        chunks.len(),
                        description
                    );
                    self.send(credentials, chunk, None).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Delivery::Sent {
            parts: chunks.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::DateTime;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use crate::models::Mode;

    /// Read one HTTP request (headers plus Content-Length body).
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    return;
                }
            }
        }
    }

    /// Local Bot API stand-in: answers requests with the scripted replies in
    /// order (the last one repeats) and counts every request.
    async fn bot_api(replies: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                read_request(&mut socket).await;
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = replies[n.min(replies.len() - 1)];
                let reply = format!(
                    "HTTP/1.1 {status} Scripted\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}"), requests)
    }

    fn sink_for(api_base: String) -> TelegramSink {
        let transport = TransportConfig {
            api_base,
            ..TransportConfig::default()
        };
        let client = Client::builder().no_proxy().build().unwrap();
        TelegramSink::with_credentials(client, &transport, &ReportConfig::default(), "token", "42")
    }

    fn report() -> Report {
        Report {
            mode: Mode::Morning,
            generated_at: DateTime::parse_from_rfc3339("2025-10-20T07:30:00+09:00").unwrap(),
            sections: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_missing_credentials_skips() {
        let transport = TransportConfig {
            token_env: "BRIEFING_TEST_UNSET_TOKEN".to_string(),
            chat_id_env: "BRIEFING_TEST_UNSET_CHAT".to_string(),
            ..TransportConfig::default()
        };
        let sink = TelegramSink::from_env(Client::new(), &transport, &ReportConfig::default());

        assert!(!sink.has_credentials());
        let delivery = sink.deliver(&report()).await.unwrap();
        assert!(matches!(delivery, Delivery::Skipped(_)));
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_resent() {
        let (api_base, requests) =
            bot_api(vec![(401, r#"{"ok":false,"description":"Unauthorized"}"#)]).await;

        let err = sink_for(api_base).deliver(&report()).await.unwrap_err();

        assert!(err.to_string().contains("HTTP 401: Unauthorized"));
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_markup_rejection_resent_as_plain_text() {
        let (api_base, requests) = bot_api(vec![
            (
                400,
                r#"{"ok":false,"description":"Bad Request: can't parse entities: Can't find end of the entity starting at byte offset 3"}"#,
            ),
            (200, r#"{"ok":true}"#),
        ])
        .await;

        let delivery = sink_for(api_base).deliver(&report()).await.unwrap();

        assert_eq!(delivery, Delivery::Sent { parts: 1 });
        assert_eq!(requests.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_markup_rejection_detection() {
        assert!(is_markup_rejection(400, "Bad Request: can't parse entities: ..."));
        assert!(!is_markup_rejection(400, "Bad Request: chat not found"));
        assert!(!is_markup_rejection(429, "Too Many Requests: retry after 5"));
    }

    #[test]
    fn test_send_message_body() {
        let body = SendMessage {
            chat_id: "42",
            text: "*hi*",
            parse_mode: None,
            disable_web_page_preview: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["chat_id"], "42");
        assert!(json.get("parse_mode").is_none());
    }

    #[test]
    fn test_api_base_trailing_slash() {
        let transport = TransportConfig {
            api_base: "https://api.telegram.org/".to_string(),
            ..TransportConfig::default()
        };
        let sink = TelegramSink::with_credentials(
            Client::new(),
            &transport,
            &ReportConfig::default(),
            "t",
            "c",
        );
        assert_eq!(sink.api_base, "https://api.telegram.org");
        assert!(sink.has_credentials());
    }
}
