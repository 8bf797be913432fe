// src/services/notifier.rs

//! Outbound notifications for new entries.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::{JobPosting, NotifyConfig};
use crate::utils::{escape_html, join_url};

/// Outcome of one notification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No destination configured; nothing was sent
    Skipped,
    Failed(String),
}

/// Something that can announce a posting.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Whether a destination is configured at all.
    fn is_enabled(&self) -> bool;

    /// Announce one posting. Never fails the caller.
    async fn notify(&self, posting: &JobPosting) -> Delivery;
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API `sendMessage` notifier.
pub struct TelegramNotifier {
    client: Client,
    credentials: Option<(String, String)>,
    api_base: String,
    heading: String,
    apply_base_url: String,
    location: String,
}

impl TelegramNotifier {
    /// `location` is the configured location filter, shown in the heading.
    pub fn new(client: Client, config: &NotifyConfig, location: &str) -> Self {
        Self {
            client,
            credentials: config
                .credentials()
                .map(|(token, chat)| (token.to_string(), chat.to_string())),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            heading: config.heading.clone(),
            apply_base_url: config.apply_base_url.clone(),
            location: location.to_string(),
        }
    }

    /// Render the HTML message body for one posting.
    pub fn format_message(&self, posting: &JobPosting) -> String {
        format!(
            "<b>{} ({})</b>\n\nTitle: {}\nLocation: {}\nPosted: {}\nApply: {}",
            escape_html(&self.heading),
            escape_html(&self.location),
            escape_html(&posting.title),
            escape_html(&posting.location_label()),
            escape_html(&posting.posted_on),
            escape_html(&join_url(&self.apply_base_url, &posting.detail_path)),
        )
    }

    async fn send(&self, token: &str, chat_id: &str, text: &str) -> Result<(), String> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, token);
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.without_url().to_string())?;

        let status = response.status();
        let parsed = response.json::<TelegramResponse>().await.ok();

        match parsed {
            Some(r) if status.is_success() && r.ok => Ok(()),
            Some(r) => Err(format!(
                "HTTP {}: {}",
                status.as_u16(),
                r.description.unwrap_or_else(|| "request rejected".to_string())
            )),
            None if status.is_success() => Err(format!("HTTP {}: unreadable response", status.as_u16())),
            None => Err(format!("HTTP {}", status.as_u16())),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    async fn notify(&self, posting: &JobPosting) -> Delivery {
        let Some((token, chat_id)) = &self.credentials else {
            return Delivery::Skipped;
        };

        let text = self.format_message(posting);
        match self.send(token, chat_id, &text).await {
            Ok(()) => {
                log::info!("Notified: {} ({})", posting.title, posting.id);
                Delivery::Sent
            }
            Err(reason) => {
                log::warn!("Notification for {} failed: {}", posting.id, reason);
                Delivery::Failed(reason)
            }
        }
    }
}

/// Counts from one dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
    /// New entries beyond the cap; recorded but not announced
    pub withheld: usize,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.sent + self.skipped + self.failed
    }
}

/// Notify the first `cap` entries in order. `cap == 0` means no limit.
pub async fn dispatch(notifier: &dyn Notifier, entries: &[JobPosting], cap: usize) -> DispatchReport {
    let limit = if cap == 0 {
        entries.len()
    } else {
        cap.min(entries.len())
    };

    let mut report = DispatchReport {
        withheld: entries.len() - limit,
        ..DispatchReport::default()
    };

    if !notifier.is_enabled() && limit > 0 {
        log::info!(
            "Notification destination not configured; {} new entries not sent",
            limit
        );
    }

    for posting in &entries[..limit] {
        match notifier.notify(posting).await {
            Delivery::Sent => report.sent += 1,
            Delivery::Skipped => report.skipped += 1,
            Delivery::Failed(_) => report.failed += 1,
        }
    }

    if report.withheld > 0 {
        log::info!(
            "Dispatch cap of {} reached; {} new entries recorded without notification",
            cap,
            report.withheld
        );
    }

    report
}
