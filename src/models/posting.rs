//! Job posting data structures.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A job posting that passed the filter pipeline.
///
/// Identity is the `id` alone (the listing's `externalPath`); every other
/// field is payload. Two postings with the same path compare equal even if
/// their titles differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    /// Opaque path string, the natural key
    #[serde(rename = "externalPath")]
    pub id: String,

    /// Job title
    pub title: String,

    /// One or more location strings
    pub locations: Vec<String>,

    /// Free-text posted-date string, e.g. "Posted 3 Days Ago"
    #[serde(rename = "postedOn")]
    pub posted_on: String,

    /// Path of the detail page, relative to the apply base URL
    #[serde(rename = "detailPath")]
    pub detail_path: String,
}

impl JobPosting {
    /// Locations joined for display.
    pub fn location_label(&self) -> String {
        self.locations.join(", ")
    }
}

impl PartialEq for JobPosting {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for JobPosting {}

impl Hash for JobPosting {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Location field as it appears on the wire: a single string or a list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Locations {
    One(String),
    Many(Vec<String>),
}

impl Locations {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Locations::One(s) => vec![s],
            Locations::Many(v) => v,
        }
    }
}

/// A listing record as returned by the remote service.
///
/// All fields are optional so that incomplete records reach the filter
/// pipeline and get rejected there instead of failing the whole page.
/// Each wire spelling has its own field; a record carrying both
/// `postedDate` and `postedOn` still decodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawListing {
    #[serde(rename = "externalPath", default)]
    pub external_path: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub locations: Option<Locations>,

    #[serde(rename = "locationsText", default)]
    pub locations_text: Option<String>,

    #[serde(rename = "postedDate", default)]
    pub posted_date: Option<String>,

    #[serde(rename = "postedOn", default)]
    pub posted_on: Option<String>,
}

impl RawListing {
    /// Decode one record of a listing page.
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Trimmed identifier, if present and non-empty.
    pub fn identifier(&self) -> Option<&str> {
        self.external_path
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Posted-date text, whichever spelling the service used.
    pub fn posted_text(&self) -> Option<&str> {
        self.posted_date.as_deref().or(self.posted_on.as_deref())
    }

    fn location_list(&self) -> Vec<String> {
        match (&self.locations, &self.locations_text) {
            (Some(locations), _) => locations.clone().into_vec(),
            (None, Some(text)) => vec![text.clone()],
            (None, None) => Vec::new(),
        }
    }

    /// All location strings concatenated, for substring matching.
    pub fn location_text(&self) -> String {
        self.location_list().join(" | ")
    }

    /// Convert into a posting. Returns `None` when the identifier is missing.
    pub fn into_posting(self) -> Option<JobPosting> {
        let id = self.identifier()?.to_string();
        Some(JobPosting {
            detail_path: id.clone(),
            locations: self.location_list(),
            posted_on: self.posted_text().unwrap_or_default().to_string(),
            title: self.title.unwrap_or_default().trim().to_string(),
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_uses_identifier_only() {
        let a = JobPosting {
            id: "/job/1".into(),
            title: "Data Analyst".into(),
            locations: vec!["Hyderabad".into()],
            posted_on: "Posted Today".into(),
            detail_path: "/job/1".into(),
        };
        let mut b = a.clone();
        b.title = "Senior Data Analyst".into();
        b.posted_on = "Posted Yesterday".into();

        assert_eq!(a, b);
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_raw_listing_accepts_search_shape() {
        let raw: RawListing = serde_json::from_str(
            r#"{"title":"BI Analyst","locations":["Hyderabad, India","Bengaluru"],
                "postedDate":"Posted 2 Days Ago","externalPath":"/job/R-1"}"#,
        )
        .unwrap();

        assert_eq!(raw.identifier(), Some("/job/R-1"));
        assert_eq!(raw.location_text(), "Hyderabad, India | Bengaluru");
        assert_eq!(raw.posted_text(), Some("Posted 2 Days Ago"));
    }

    #[test]
    fn test_raw_listing_accepts_cxs_shape() {
        let raw: RawListing = serde_json::from_str(
            r#"{"title":"ETL Developer","externalPath":"/job/Hyderabad/ETL_R-2",
                "locationsText":"Hyderabad, India","postedOn":"Posted Today",
                "bulletFields":["R-2"]}"#,
        )
        .unwrap();

        let posting = raw.into_posting().unwrap();
        assert_eq!(posting.id, "/job/Hyderabad/ETL_R-2");
        assert_eq!(posting.locations, vec!["Hyderabad, India".to_string()]);
        assert_eq!(posting.posted_on, "Posted Today");
        assert_eq!(posting.detail_path, posting.id);
    }

    #[test]
    fn test_blank_identifier_is_missing() {
        let raw = RawListing {
            external_path: Some("   ".into()),
            ..RawListing::default()
        };
        assert!(raw.identifier().is_none());
        assert!(raw.into_posting().is_none());
    }

    #[test]
    fn test_both_date_spellings_still_decode() {
        let raw = RawListing::from_value(serde_json::json!({
            "externalPath": "/job/R-3",
            "postedDate": "Posted Yesterday",
            "postedOn": "Posted 2 Days Ago"
        }))
        .unwrap();
        assert_eq!(raw.posted_text(), Some("Posted Yesterday"));
    }

    #[test]
    fn test_wrong_typed_field_fails_only_that_record() {
        let bad_title = serde_json::json!({"externalPath": "/job/1", "title": 42});
        let bad_locations = serde_json::json!({"externalPath": "/job/2", "locations": {"city": "Hyderabad"}});
        assert!(RawListing::from_value(bad_title).is_err());
        assert!(RawListing::from_value(bad_locations).is_err());
    }
}
