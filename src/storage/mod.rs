//! Known-state persistence.
//!
//! Two interchangeable backends answer "was this posting seen before?":
//!
//! - [`SnapshotStore`]: one JSON document holding the latest run's full
//!   candidate set, replaced atomically after a run finishes fetching.
//!   A crashed run records nothing and loses nothing.
//! - [`LedgerStore`]: a SQLite table with a uniqueness constraint on the
//!   identifier. Every accepted posting is durable the moment it is
//!   inserted, and the table is never pruned.
//!
//! ```text
//! state/
//! ├── jobs.json   # snapshot backend
//! └── jobs.db     # ledger backend
//! ```

pub mod ledger;
pub mod snapshot;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{JobPosting, StateBackend, StateConfig};

// Re-export for convenience
pub use ledger::LedgerStore;
pub use snapshot::SnapshotStore;

/// How the repository classified a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Not previously known; this is a new entry
    New,
    /// Already known from an earlier run
    Known,
    /// Could not be recorded; re-evaluated on the next run
    Deferred,
}

/// Result of the end-of-run commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Identifiers known after the commit
    pub known_count: usize,
    /// Previously known identifiers that are no longer known
    pub dropped_count: usize,
    /// Where the state lives
    pub location: String,
}

/// Storage for the set of already-observed postings.
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Which backend this is.
    fn backend(&self) -> StateBackend;

    /// Classify one candidate, recording it if the backend commits per record.
    async fn admit(&mut self, posting: &JobPosting, observed_at: DateTime<Utc>) -> Admission;

    /// Finish a run whose fetch phase completed. `candidates` is the run's
    /// full candidate set in discovery order.
    async fn commit(&mut self, candidates: &[JobPosting]) -> Result<CommitSummary>;

    /// Number of identifiers currently known.
    async fn known_count(&self) -> Result<usize>;
}

/// Known-posting count of the selected backend, or `None` when its file
/// does not exist yet. Never creates state.
pub async fn known_state_size(config: &StateConfig) -> Result<Option<usize>> {
    let path = config.active_path();
    if !tokio::fs::try_exists(path)
        .await
        .map_err(|e| AppError::persistence(format!("state {}", path.display()), e))?
    {
        return Ok(None);
    }
    let repository = open_repository(config).await?;
    Ok(Some(repository.known_count().await?))
}

/// Open the repository selected by configuration.
pub async fn open_repository(config: &StateConfig) -> Result<Box<dyn StateRepository>> {
    match config.backend {
        StateBackend::Snapshot => Ok(Box::new(SnapshotStore::open(&config.snapshot_path).await?)),
        StateBackend::Ledger => Ok(Box::new(LedgerStore::open(&config.ledger_path)?)),
    }
}
