//! Per-run candidate filtering.
//!
//! Checks run in a fixed order: decoding, identifier, location, recency,
//! then within-run duplicates. Nothing here survives the run; cross-run
//! deduplication belongs to the state repository.

use std::collections::HashSet;
use std::fmt;

use serde_json::Value;

use crate::models::{FilterConfig, JobPosting, RawListing};
use crate::pipeline::recency::is_recent;

/// Why a raw record was not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// A field had the wrong JSON type
    Malformed,
    MissingId,
    LocationMismatch,
    NotRecent,
    Duplicate,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rejection::Malformed => "malformed",
            Rejection::MissingId => "missing id",
            Rejection::LocationMismatch => "location mismatch",
            Rejection::NotRecent => "not recent",
            Rejection::Duplicate => "duplicate",
        };
        f.write_str(label)
    }
}

/// Static part of the filter: what a candidate must look like.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    location: String,
    max_age_days: u32,
    enforce_recency: bool,
}

impl FilterPolicy {
    pub fn new(location: &str, filter: &FilterConfig) -> Self {
        Self {
            location: location.trim().to_lowercase(),
            max_age_days: filter.max_age_days,
            enforce_recency: filter.enforce_recency,
        }
    }

    /// Apply the stateless checks to one record.
    pub fn check(&self, raw: &RawListing) -> Result<(), Rejection> {
        if raw.identifier().is_none() {
            return Err(Rejection::MissingId);
        }
        if !raw.location_text().to_lowercase().contains(&self.location) {
            return Err(Rejection::LocationMismatch);
        }
        if self.enforce_recency && !is_recent(raw.posted_text().unwrap_or(""), self.max_age_days) {
            return Err(Rejection::NotRecent);
        }
        Ok(())
    }
}

/// Rejection counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub kept: usize,
    pub malformed: usize,
    pub missing_id: usize,
    pub location_mismatch: usize,
    pub not_recent: usize,
    pub duplicate: usize,
}

impl FilterStats {
    pub fn rejected(&self) -> usize {
        self.malformed + self.missing_id + self.location_mismatch + self.not_recent + self.duplicate
    }

    fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::Malformed => self.malformed += 1,
            Rejection::MissingId => self.missing_id += 1,
            Rejection::LocationMismatch => self.location_mismatch += 1,
            Rejection::NotRecent => self.not_recent += 1,
            Rejection::Duplicate => self.duplicate += 1,
        }
    }
}

/// Filter state for a single run.
#[derive(Debug)]
pub struct RunFilter {
    policy: FilterPolicy,
    seen: HashSet<String>,
    stats: FilterStats,
}

impl RunFilter {
    pub fn new(policy: FilterPolicy) -> Self {
        Self {
            policy,
            seen: HashSet::new(),
            stats: FilterStats::default(),
        }
    }

    /// Keep or reject one record as it came off the wire.
    pub fn admit(&mut self, record: Value) -> Result<JobPosting, Rejection> {
        let outcome = RawListing::from_value(record)
            .map_err(|e| {
                log::debug!("Undecodable listing record: {}", e);
                Rejection::Malformed
            })
            .and_then(|raw| self.evaluate(raw));
        match &outcome {
            Ok(_) => self.stats.kept += 1,
            Err(rejection) => self.stats.record(*rejection),
        }
        outcome
    }

    fn evaluate(&mut self, raw: RawListing) -> Result<JobPosting, Rejection> {
        self.policy.check(&raw)?;
        let posting = raw.into_posting().ok_or(Rejection::MissingId)?;
        if !self.seen.insert(posting.id.clone()) {
            return Err(Rejection::Duplicate);
        }
        Ok(posting)
    }

    pub fn stats(&self) -> FilterStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: Option<&str>, location: &str, posted: &str) -> Value {
        serde_json::json!({
            "externalPath": id,
            "title": "Data Analyst",
            "locations": location,
            "postedDate": posted
        })
    }

    fn filter(enforce_recency: bool) -> RunFilter {
        let config = FilterConfig {
            max_age_days: 3,
            enforce_recency,
        };
        RunFilter::new(FilterPolicy::new("Hyderabad", &config))
    }

    #[test]
    fn test_keeps_matching_recent_record() {
        let mut f = filter(true);
        let posting = f.admit(raw(Some("/job/1"), "Hyderabad, India", "Posted Today")).unwrap();
        assert_eq!(posting.id, "/job/1");
        assert_eq!(f.stats().kept, 1);
    }

    #[test]
    fn test_rejects_missing_id_first() {
        let mut f = filter(true);
        assert_eq!(
            f.admit(raw(None, "Chicago", "Posted 40+ Days Ago")),
            Err(Rejection::MissingId)
        );
        assert_eq!(
            f.admit(raw(Some(""), "Hyderabad", "Posted Today")),
            Err(Rejection::MissingId)
        );
    }

    #[test]
    fn test_location_is_case_insensitive_across_all_locations() {
        let mut f = filter(true);
        let mut record = raw(Some("/job/2"), "", "Posted Today");
        record["locations"] = serde_json::json!(["Charlotte, NC", "HYDERABAD, Telangana"]);
        assert!(f.admit(record).is_ok());

        assert_eq!(
            f.admit(raw(Some("/job/3"), "Bengaluru", "Posted Today")),
            Err(Rejection::LocationMismatch)
        );
    }

    #[test]
    fn test_recency_only_when_enforced() {
        let mut strict = filter(true);
        assert_eq!(
            strict.admit(raw(Some("/job/4"), "Hyderabad", "Posted 30+ Days Ago")),
            Err(Rejection::NotRecent)
        );

        let mut lenient = filter(false);
        assert!(
            lenient
                .admit(raw(Some("/job/4"), "Hyderabad", "Posted 30+ Days Ago"))
                .is_ok()
        );
    }

    #[test]
    fn test_within_run_duplicates() {
        let mut f = filter(true);
        assert!(f.admit(raw(Some("/job/5"), "Hyderabad", "Posted Today")).is_ok());
        assert_eq!(
            f.admit(raw(Some("/job/5"), "Hyderabad", "Posted Yesterday")),
            Err(Rejection::Duplicate)
        );

        let stats = f.stats();
        assert_eq!(stats.kept, 1);
        assert_eq!(stats.duplicate, 1);
        assert_eq!(stats.rejected(), 1);
    }

    #[test]
    fn test_rejected_record_does_not_claim_identifier() {
        let mut f = filter(true);
        assert_eq!(
            f.admit(raw(Some("/job/6"), "Hyderabad", "Posted 9 Days Ago")),
            Err(Rejection::NotRecent)
        );
        assert!(f.admit(raw(Some("/job/6"), "Hyderabad", "Posted Today")).is_ok());
    }

    #[test]
    fn test_malformed_record_is_counted_and_skipped() {
        let mut f = filter(true);
        let mut bad = raw(Some("/job/7"), "Hyderabad", "Posted Today");
        bad["title"] = serde_json::json!(42);

        assert_eq!(f.admit(bad), Err(Rejection::Malformed));
        assert!(f.admit(raw(Some("/job/8"), "Hyderabad", "Posted Today")).is_ok());

        let stats = f.stats();
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.kept, 1);
    }
}
