// src/pipeline/run.rs

//! One watch pass: fetch, filter, diff, persist, notify.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Config, JobPosting};
use crate::pipeline::diff::DiffEngine;
use crate::pipeline::fetch::{PageCursor, Throttle};
use crate::pipeline::filter::{FilterPolicy, FilterStats, RunFilter};
use crate::services::{
    DispatchReport, ListingSource, Notifier, TelegramNotifier, dispatch, listing_source,
};
use crate::storage::{CommitSummary, StateRepository, open_repository};
use crate::utils::{self, http};

/// Everything a pass did.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub keywords: usize,
    pub pages: usize,
    pub raw_records: usize,
    pub filter: FilterStats,
    pub candidates: usize,
    /// New entries in discovery order
    pub new_entries: Vec<JobPosting>,
    pub known: usize,
    pub deferred: usize,
    pub commit: CommitSummary,
    pub dispatch: DispatchReport,
}

impl RunReport {
    pub fn log_summary(&self) {
        let elapsed = (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0;
        utils::log::summary(
            "Watch run",
            &[
                ("Keywords", self.keywords.to_string()),
                ("Pages fetched", self.pages.to_string()),
                ("Raw records", self.raw_records.to_string()),
                ("Malformed", self.filter.malformed.to_string()),
                ("Missing id", self.filter.missing_id.to_string()),
                ("Location mismatch", self.filter.location_mismatch.to_string()),
                ("Not recent", self.filter.not_recent.to_string()),
                ("Duplicates", self.filter.duplicate.to_string()),
                ("Candidates", self.candidates.to_string()),
                ("New entries", self.new_entries.len().to_string()),
                ("Deferred", self.deferred.to_string()),
                ("Stale dropped", self.commit.dropped_count.to_string()),
                ("Known after run", self.commit.known_count.to_string()),
                ("Notified", self.dispatch.sent.to_string()),
                ("Failed", self.dispatch.failed.to_string()),
                ("Withheld by cap", self.dispatch.withheld.to_string()),
                ("Elapsed", format!("{elapsed:.1}s")),
            ],
        );
    }
}

/// Run one pass against the given collaborators.
///
/// Any fetch failure aborts before the repository is committed and before
/// anything is sent. Notifications only go out once known-state is durable.
pub async fn run_watch(
    config: &Config,
    source: &dyn ListingSource,
    repository: &mut dyn StateRepository,
    notifier: &dyn Notifier,
) -> Result<RunReport> {
    let started_at = Utc::now();
    utils::log::header(&format!(
        "jobwatch: {} ({:?} state)",
        config.search.location,
        repository.backend()
    ));

    utils::log::step(1, 3, "Fetching listings");
    let mut filter = RunFilter::new(FilterPolicy::new(&config.search.location, &config.filter));
    let mut engine = DiffEngine::new();
    let mut throttle = Throttle::new(Duration::from_millis(config.search.request_delay_ms));
    let mut keywords = 0;
    let mut pages = 0;
    let mut raw_records = 0;

    for keyword in config.keywords() {
        keywords += 1;
        let mut cursor = PageCursor::new(source, keyword, config.search.max_pages);
        let before = engine.candidates().len();

        while let Some(records) = cursor.next_page(&mut throttle).await? {
            raw_records += records.len();
            for record in records {
                match filter.admit(record) {
                    Ok(posting) => {
                        engine.observe(repository, posting, Utc::now()).await;
                    }
                    Err(rejection) => log::trace!("Rejected record: {}", rejection),
                }
            }
        }

        pages += cursor.pages_fetched();
        utils::log::sub_item(&format!(
            "{}: {} pages, {} candidates",
            keyword,
            cursor.pages_fetched(),
            engine.candidates().len() - before
        ));
    }

    let diff = engine.finish();

    utils::log::step(2, 3, "Recording known-state");
    let commit = repository.commit(&diff.candidates).await?;

    utils::log::step(3, 3, "Dispatching notifications");
    let dispatched = dispatch(notifier, &diff.new_entries, config.notify.dispatch_cap).await;

    let report = RunReport {
        started_at,
        finished_at: Utc::now(),
        keywords,
        pages,
        raw_records,
        filter: filter.stats(),
        candidates: diff.candidates.len(),
        known: diff.known,
        deferred: diff.deferred,
        new_entries: diff.new_entries,
        commit,
        dispatch: dispatched,
    };
    report.log_summary();
    Ok(report)
}

/// Build the production collaborators from `config` and run one pass.
pub async fn run(config: &Config) -> Result<RunReport> {
    let client = http::create_client(&config.http)?;
    let source = listing_source(client.clone(), &config.search);
    let notifier = TelegramNotifier::new(client, &config.notify, &config.search.location);
    let mut repository = open_repository(&config.state).await?;

    run_watch(config, source.as_ref(), repository.as_mut(), &notifier).await
}
