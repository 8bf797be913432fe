//! Keyword pagination over a [`ListingSource`].

use std::time::Duration;

use serde_json::Value;

use crate::error::Result;
use crate::models::PAGE_SIZE;
use crate::services::ListingSource;

/// Fixed pause between consecutive page requests of a run.
#[derive(Debug)]
pub struct Throttle {
    delay: Duration,
    primed: bool,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            primed: false,
        }
    }

    /// Sleep unless this is the first request of the run.
    async fn wait(&mut self) {
        if self.primed && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.primed = true;
    }
}

/// Walks one keyword's pages in order.
///
/// Stops after an empty page, after a page the source marks as last, or
/// once `max_pages` pages have been fetched.
pub struct PageCursor<'a> {
    source: &'a dyn ListingSource,
    keyword: &'a str,
    offset: usize,
    pages_fetched: usize,
    max_pages: usize,
    done: bool,
}

impl<'a> PageCursor<'a> {
    pub fn new(source: &'a dyn ListingSource, keyword: &'a str, max_pages: usize) -> Self {
        Self {
            source,
            keyword,
            offset: 0,
            pages_fetched: 0,
            max_pages,
            done: max_pages == 0,
        }
    }

    /// Fetch the next non-empty page, or `None` when pagination is over.
    pub async fn next_page(&mut self, throttle: &mut Throttle) -> Result<Option<Vec<Value>>> {
        if self.done {
            return Ok(None);
        }

        throttle.wait().await;
        let page = self.source.list_page(self.keyword, self.offset).await?;
        self.pages_fetched += 1;
        self.offset += PAGE_SIZE;

        if page.is_empty() {
            self.done = true;
            return Ok(None);
        }
        if !page.has_more {
            self.done = true;
        } else if self.pages_fetched >= self.max_pages {
            log::warn!(
                "Page cap of {} reached for '{}'; remaining pages skipped",
                self.max_pages,
                self.keyword
            );
            self.done = true;
        }

        Ok(Some(page.records))
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}
