// src/models/mod.rs

//! Domain models for the watcher.

mod config;
mod posting;

// Re-export all public types
pub use config::{
    Config, FilterConfig, HttpConfig, ListingProtocol, LoggingConfig, NotifyConfig, SearchConfig,
    StateBackend, StateConfig,
};
pub use posting::{JobPosting, Locations, RawListing};

/// Number of records the listing service returns per page.
pub const PAGE_SIZE: usize = 20;

/// One page of records plus the service's hint about further pages.
///
/// Records stay undecoded JSON until the filter looks at them, so one
/// malformed record cannot sink the rest of its page.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub records: Vec<serde_json::Value>,
    pub has_more: bool,
}

impl ListingPage {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
