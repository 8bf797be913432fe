//! Append-only ledger of every posting ever accepted.
//!
//! Each new identifier is inserted as soon as it is admitted, so postings
//! seen before a mid-run failure stay known. Rows are never deleted.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{AppError, Result};
use crate::models::{JobPosting, StateBackend};
use crate::storage::{Admission, CommitSummary, StateRepository};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS seen_postings (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    external_path TEXT NOT NULL UNIQUE,
    title         TEXT NOT NULL,
    locations     TEXT NOT NULL,
    posted_on     TEXT NOT NULL,
    first_seen_at TEXT NOT NULL
);
";

/// SQLite-backed known-state.
pub struct LedgerStore {
    conn: Mutex<Connection>,
    location: String,
}

impl LedgerStore {
    /// Open (and create if needed) the ledger database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::persistence(format!("ledger {}", path.display()), e))?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Self::bootstrap(conn, path.display().to_string())
    }

    /// Ledger that lives only as long as the process.
    pub fn in_memory() -> Result<Self> {
        Self::bootstrap(Connection::open_in_memory()?, ":memory:".to_string())
    }

    fn bootstrap(conn: Connection, location: String) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            location,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::persistence("ledger", "connection lock poisoned"))
    }

    /// Insert `posting` unless its identifier is already recorded.
    ///
    /// Returns `true` only when a row was actually written.
    pub fn insert_if_absent(&self, posting: &JobPosting, observed_at: DateTime<Utc>) -> Result<bool> {
        let locations = serde_json::to_string(&posting.locations)?;
        let changed = self.conn()?.execute(
            "INSERT INTO seen_postings (external_path, title, locations, posted_on, first_seen_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(external_path) DO NOTHING",
            params![
                posting.id,
                posting.title,
                locations,
                posting.posted_on,
                observed_at.to_rfc3339(),
            ],
        )?;
        Ok(changed == 1)
    }

    pub fn is_known(&self, id: &str) -> Result<bool> {
        let found = self
            .conn()?
            .query_row(
                "SELECT 1 FROM seen_postings WHERE external_path = ?1",
                params![id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// When `id` was first recorded.
    pub fn first_seen(&self, id: &str) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn()?
            .query_row(
                "SELECT first_seen_at FROM seen_postings WHERE external_path = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| AppError::persistence("ledger", e))
        })
        .transpose()
    }

    fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM seen_postings", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}

#[async_trait]
impl StateRepository for LedgerStore {
    fn backend(&self) -> StateBackend {
        StateBackend::Ledger
    }

    async fn admit(&mut self, posting: &JobPosting, observed_at: DateTime<Utc>) -> Admission {
        match self.insert_if_absent(posting, observed_at) {
            Ok(true) => Admission::New,
            Ok(false) => Admission::Known,
            Err(e) => {
                log::warn!("Could not record {} in ledger, deferring: {}", posting.id, e);
                Admission::Deferred
            }
        }
    }

    async fn commit(&mut self, _candidates: &[JobPosting]) -> Result<CommitSummary> {
        // Rows are already durable; nothing is dropped.
        Ok(CommitSummary {
            known_count: self.count()?,
            dropped_count: 0,
            location: self.location.clone(),
        })
    }

    async fn known_count(&self) -> Result<usize> {
        self.count()
    }
}
