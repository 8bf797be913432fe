//! New-entry detection.
//!
//! A candidate is a new entry when its identifier is absent from
//! known-state at the moment it is admitted. Output keeps discovery order.

use chrono::{DateTime, Utc};

use crate::models::JobPosting;
use crate::storage::{Admission, StateRepository};

/// What a run's candidates amounted to.
#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    /// Every candidate, in discovery order
    pub candidates: Vec<JobPosting>,
    /// Candidates that were not previously known, in discovery order
    pub new_entries: Vec<JobPosting>,
    /// Candidates already known
    pub known: usize,
    /// Candidates the repository could not record this run
    pub deferred: usize,
}

impl DiffResult {
    pub fn has_new(&self) -> bool {
        !self.new_entries.is_empty()
    }
}

/// Feeds candidates through a [`StateRepository`] one at a time.
#[derive(Debug, Default)]
pub struct DiffEngine {
    result: DiffResult,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit one candidate and remember it if it is new.
    pub async fn observe(
        &mut self,
        repository: &mut dyn StateRepository,
        posting: JobPosting,
        observed_at: DateTime<Utc>,
    ) -> Admission {
        let admission = repository.admit(&posting, observed_at).await;
        match admission {
            Admission::New => {
                log::debug!("New: {} ({})", posting.title, posting.id);
                self.result.new_entries.push(posting.clone());
            }
            Admission::Known => self.result.known += 1,
            Admission::Deferred => self.result.deferred += 1,
        }
        self.result.candidates.push(posting);
        admission
    }

    pub fn candidates(&self) -> &[JobPosting] {
        &self.result.candidates
    }

    pub fn finish(self) -> DiffResult {
        self.result
    }
}
