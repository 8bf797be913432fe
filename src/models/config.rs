//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
///
/// Built once at process start and passed by reference; nothing below the
/// CLI reads the environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Listing service and keyword settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Candidate filtering policy
    #[serde(default)]
    pub filter: FilterConfig,

    /// Known-state persistence
    #[serde(default)]
    pub state: StateConfig,

    /// Outbound notifications
    #[serde(default)]
    pub notify: NotifyConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply environment overrides through the given lookup.
    ///
    /// Recognised keys: `JOB_LOCATION`, `JOB_KEYWORDS` (comma separated),
    /// `JOB_MAX_AGE_DAYS`, `TELEGRAM_TOKEN`, `TELEGRAM_CHAT_ID`,
    /// `JOBWATCH_STATE_BACKEND`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(location) = lookup("JOB_LOCATION") {
            self.search.location = location;
        }
        if let Some(keywords) = lookup("JOB_KEYWORDS") {
            self.search.keywords = keywords
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(days) = lookup("JOB_MAX_AGE_DAYS") {
            self.filter.max_age_days = days.trim().parse().map_err(|_| {
                AppError::config(format!("JOB_MAX_AGE_DAYS is not a number: {days}"))
            })?;
        }
        if let Some(token) = lookup("TELEGRAM_TOKEN").filter(|s| !s.trim().is_empty()) {
            self.notify.telegram_token = Some(token);
        }
        if let Some(chat_id) = lookup("TELEGRAM_CHAT_ID").filter(|s| !s.trim().is_empty()) {
            self.notify.telegram_chat_id = Some(chat_id);
        }
        if let Some(backend) = lookup("JOBWATCH_STATE_BACKEND") {
            self.state.backend = match backend.trim().to_lowercase().as_str() {
                "snapshot" => StateBackend::Snapshot,
                "ledger" => StateBackend::Ledger,
                other => {
                    return Err(AppError::config(format!(
                        "Unknown state backend '{other}' (expected snapshot or ledger)"
                    )));
                }
            };
        }
        Ok(self)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.search.endpoint).map_err(|e| {
            AppError::validation(format!("search.endpoint is not a valid URL: {e}"))
        })?;
        if self.search.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(AppError::validation("No search keywords defined"));
        }
        if self.search.max_pages == 0 {
            return Err(AppError::validation("search.max_pages must be > 0"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.notify.api_base).map_err(|e| {
            AppError::validation(format!("notify.api_base is not a valid URL: {e}"))
        })?;
        Ok(())
    }

    /// Keywords with blank entries removed, in configured order.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.search
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
    }
}

/// Wire protocol of the listing service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListingProtocol {
    /// `GET endpoint?keyword=..&location=..&page=N`
    #[default]
    SearchGet,
    /// `POST endpoint` with `{limit, offset, searchText}` body
    CxsPost,
}

/// Listing service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub protocol: ListingProtocol,

    /// Full URL of the search endpoint
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    /// Location substring a posting must contain
    #[serde(default = "defaults::location")]
    pub location: String,

    /// Search phrases, queried in order
    #[serde(default = "defaults::keywords")]
    pub keywords: Vec<String>,

    /// Safety cap on pages fetched per keyword
    #[serde(default = "defaults::max_pages")]
    pub max_pages: usize,

    /// Delay between page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            protocol: ListingProtocol::default(),
            endpoint: defaults::endpoint(),
            location: defaults::location(),
            keywords: defaults::keywords(),
            max_pages: defaults::max_pages(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// Candidate filtering policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Maximum age in days for "N days ago" phrasing
    #[serde(default = "defaults::max_age_days")]
    pub max_age_days: u32,

    /// Whether to drop postings that are not confidently recent
    #[serde(default = "defaults::enforce_recency")]
    pub enforce_recency: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_age_days: defaults::max_age_days(),
            enforce_recency: defaults::enforce_recency(),
        }
    }
}

/// Which known-state implementation to use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StateBackend {
    /// Whole document replaced at end of each completed run
    Snapshot,
    /// Append-only table, one durable insert per candidate
    #[default]
    Ledger,
}

/// Known-state persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default)]
    pub backend: StateBackend,

    #[serde(default = "defaults::snapshot_path")]
    pub snapshot_path: PathBuf,

    #[serde(default = "defaults::ledger_path")]
    pub ledger_path: PathBuf,
}

impl StateConfig {
    /// File backing the selected backend.
    pub fn active_path(&self) -> &Path {
        match self.backend {
            StateBackend::Snapshot => &self.snapshot_path,
            StateBackend::Ledger => &self.ledger_path,
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: StateBackend::default(),
            snapshot_path: defaults::snapshot_path(),
            ledger_path: defaults::ledger_path(),
        }
    }
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Bot token; notifications are disabled when absent
    #[serde(default)]
    pub telegram_token: Option<String>,

    /// Destination chat; notifications are disabled when absent
    #[serde(default)]
    pub telegram_chat_id: Option<String>,

    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Maximum messages per run; 0 means uncapped
    #[serde(default = "defaults::dispatch_cap")]
    pub dispatch_cap: usize,

    /// First line of every message
    #[serde(default = "defaults::heading")]
    pub heading: String,

    /// Prefix joined with a posting's detail path to form the apply link
    #[serde(default = "defaults::apply_base_url")]
    pub apply_base_url: String,
}

impl NotifyConfig {
    /// Token and chat id, if both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let token = self.telegram_token.as_deref().filter(|s| !s.is_empty())?;
        let chat = self.telegram_chat_id.as_deref().filter(|s| !s.is_empty())?;
        Some((token, chat))
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            telegram_token: None,
            telegram_chat_id: None,
            api_base: defaults::api_base(),
            dispatch_cap: defaults::dispatch_cap(),
            heading: defaults::heading(),
            apply_base_url: defaults::apply_base_url(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
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

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Search defaults
    pub fn endpoint() -> String {
        "https://www.wellsfargojobs.com/en-US/search".into()
    }
    pub fn location() -> String {
        "Hyderabad".into()
    }
    pub fn keywords() -> Vec<String> {
        [
            "Data Analyst",
            "Business Intelligence",
            "BI Analyst",
            "Analytics",
            "Reporting",
            "Power BI",
            "SQL",
            "Databricks",
            "Azure",
            "Data Engineer",
            "ETL",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn max_pages() -> usize {
        50
    }
    pub fn request_delay() -> u64 {
        250
    }

    // Filter defaults
    pub fn max_age_days() -> u32 {
        3
    }
    pub fn enforce_recency() -> bool {
        true
    }

    // State defaults
    pub fn snapshot_path() -> PathBuf {
        PathBuf::from("state/jobs.json")
    }
    pub fn ledger_path() -> PathBuf {
        PathBuf::from("state/jobs.db")
    }

    // Notify defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn dispatch_cap() -> usize {
        5
    }
    pub fn heading() -> String {
        "New Job Posting".into()
    }
    pub fn apply_base_url() -> String {
        "https://www.wellsfargojobs.com".into()
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; jobwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
