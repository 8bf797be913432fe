//! Remote services the watcher talks to.
//!
//! - Listing sources (`SearchPageClient`, `CxsClient`)
//! - Notification delivery (`TelegramNotifier`)

mod listings;
mod notifier;

pub use listings::{CxsClient, ListingSource, SearchPageClient, listing_source};
pub use notifier::{Delivery, DispatchReport, Notifier, TelegramNotifier, dispatch};
