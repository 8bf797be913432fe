//! Whole-snapshot known-state.
//!
//! The previous run's candidate set is loaded once when the store is opened.
//! `admit` only consults that set; nothing touches disk until `commit`, which
//! replaces the document with exactly the current run's candidates (write to
//! a temp file, then rename). Identifiers that were not re-surfaced drop out.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{JobPosting, StateBackend};
use crate::storage::{Admission, CommitSummary, StateRepository};

/// Persisted snapshot document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDocument {
    /// ISO 8601 timestamp of the run that wrote it
    pub updated_at: DateTime<Utc>,
    /// Number of postings
    pub count: usize,
    /// The run's candidates in discovery order
    pub postings: Vec<JobPosting>,
}

impl SnapshotDocument {
    pub fn new(postings: Vec<JobPosting>) -> Self {
        Self {
            updated_at: Utc::now(),
            count: postings.len(),
            postings,
        }
    }
}

/// A bare array of raw listing objects, as older state files hold.
#[derive(Debug, Deserialize)]
struct LegacyEntry {
    #[serde(rename = "externalPath")]
    external_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredSnapshot {
    Document(SnapshotDocument),
    Legacy(Vec<LegacyEntry>),
}

impl StoredSnapshot {
    fn into_ids(self) -> HashSet<String> {
        match self {
            StoredSnapshot::Document(doc) => doc.postings.into_iter().map(|p| p.id).collect(),
            StoredSnapshot::Legacy(entries) => {
                entries.into_iter().map(|e| e.external_path).collect()
            }
        }
    }
}

/// Snapshot-backed known-state.
#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    known: HashSet<String>,
}

impl SnapshotStore {
    /// Open the store, loading the previous snapshot (empty if absent).
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let known = match Self::read_bytes(&path).await? {
            Some(bytes) => serde_json::from_slice::<StoredSnapshot>(&bytes)
                .map_err(|e| AppError::persistence(Self::context(&path), e))?
                .into_ids(),
            None => {
                log::info!("No snapshot at {}; starting empty", path.display());
                HashSet::new()
            }
        };
        log::debug!("Loaded {} known identifiers from snapshot", known.len());
        Ok(Self { path, known })
    }

    /// Identifiers known from the last committed run.
    pub fn known_ids(&self) -> &HashSet<String> {
        &self.known
    }

    fn context(path: &Path) -> String {
        format!("snapshot {}", path.display())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::persistence(Self::context(path), e)),
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await
    }
}

#[async_trait]
impl StateRepository for SnapshotStore {
    fn backend(&self) -> StateBackend {
        StateBackend::Snapshot
    }

    async fn admit(&mut self, posting: &JobPosting, _observed_at: DateTime<Utc>) -> Admission {
        if self.known.contains(&posting.id) {
            Admission::Known
        } else {
            Admission::New
        }
    }

    async fn commit(&mut self, candidates: &[JobPosting]) -> Result<CommitSummary> {
        let document = SnapshotDocument::new(candidates.to_vec());
        let bytes = serde_json::to_vec_pretty(&document)?;
        self.write_bytes(&bytes)
            .await
            .map_err(|e| AppError::persistence(Self::context(&self.path), e))?;

        let current: HashSet<String> = candidates.iter().map(|p| p.id.clone()).collect();
        let dropped_count = self.known.difference(&current).count();
        self.known = current;

        log::info!(
            "Snapshot: {} postings written to {} ({} stale dropped)",
            document.count,
            self.path.display(),
            dropped_count
        );

        Ok(CommitSummary {
            known_count: self.known.len(),
            dropped_count,
            location: self.path.display().to_string(),
        })
    }

    async fn known_count(&self) -> Result<usize> {
        Ok(self.known.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn posting(id: &str) -> JobPosting {
        JobPosting {
            id: id.to_string(),
            title: format!("Title {id}"),
            locations: vec!["Hyderabad".into()],
            posted_on: "Posted Today".into(),
            detail_path: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_state() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::open(tmp.path().join("jobs.json")).await.unwrap();
        assert!(store.known_ids().is_empty());
    }

    #[tokio::test]
    async fn test_admit_does_not_touch_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("jobs.json");
        let mut store = SnapshotStore::open(&path).await.unwrap();

        assert_eq!(store.admit(&posting("/job/1"), Utc::now()).await, Admission::New);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_commit_replaces_with_exact_candidate_set() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state/jobs.json");

        let mut first = SnapshotStore::open(&path).await.unwrap();
        first
            .commit(&[posting("/job/1"), posting("/job/2")])
            .await
            .unwrap();

        let mut second = SnapshotStore::open(&path).await.unwrap();
        assert_eq!(second.admit(&posting("/job/1"), Utc::now()).await, Admission::Known);
        assert_eq!(second.admit(&posting("/job/3"), Utc::now()).await, Admission::New);

        let summary = second
            .commit(&[posting("/job/2"), posting("/job/3")])
            .await
            .unwrap();
        assert_eq!(summary.known_count, 2);
        assert_eq!(summary.dropped_count, 1);

        let reopened = SnapshotStore::open(&path).await.unwrap();
        let expected: HashSet<String> = ["/job/2", "/job/3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(reopened.known_ids(), &expected);

        let doc: SnapshotDocument =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(doc.count, 2);
        assert_eq!(doc.postings[0].id, "/job/2");
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_loads_legacy_array() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("jobs.json");
        std::fs::write(
            &path,
            r#"[{"title":"SQL Dev","locations":"Hyderabad","postedDate":"Posted Today","externalPath":"/job/9"}]"#,
        )
        .unwrap();

        let store = SnapshotStore::open(&path).await.unwrap();
        assert!(store.known_ids().contains("/job/9"));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_persistence_failure_and_left_alone() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("jobs.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let err = SnapshotStore::open(&path).await.unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(std::fs::read(&path).unwrap(), b"{ not json");
    }
}
