// src/services/listings.rs

//! Listing service clients.
//!
//! Both wire protocols are reduced to one capability:
//! `list_page(keyword, offset) -> (records, has_more)`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{ListingPage, ListingProtocol, PAGE_SIZE, SearchConfig};

/// A remote source of paginated job listings.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch one page. `offset` is a non-negative multiple of [`PAGE_SIZE`].
    ///
    /// Any transport, status, or decoding failure is `RemoteUnavailable`.
    async fn list_page(&self, keyword: &str, offset: usize) -> Result<ListingPage>;
}

/// Build the client matching the configured protocol.
pub fn listing_source(client: Client, search: &SearchConfig) -> Box<dyn ListingSource> {
    match search.protocol {
        ListingProtocol::SearchGet => Box::new(SearchPageClient::new(client, search)),
        ListingProtocol::CxsPost => Box::new(CxsClient::new(client, search)),
    }
}

// --- Query-string protocol ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    search_results: SearchResults,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResults {
    /// Absent means unknown; pagination then ends on an empty page or the cap
    #[serde(default)]
    total_pages: Option<usize>,
    #[serde(default)]
    jobs: Vec<serde_json::Value>,
}

/// `GET {endpoint}?keyword=..&location=..&page=N`, 1-based pages.
pub struct SearchPageClient {
    client: Client,
    endpoint: String,
    location: String,
}

impl SearchPageClient {
    pub fn new(client: Client, search: &SearchConfig) -> Self {
        Self {
            client,
            endpoint: search.endpoint.clone(),
            location: search.location.clone(),
        }
    }

    fn page_number(offset: usize) -> usize {
        offset / PAGE_SIZE + 1
    }
}

#[async_trait]
impl ListingSource for SearchPageClient {
    async fn list_page(&self, keyword: &str, offset: usize) -> Result<ListingPage> {
        let page = Self::page_number(offset);
        let page_param = page.to_string();
        log::debug!("GET {} keyword={:?} page={}", self.endpoint, keyword, page);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("keyword", keyword),
                ("location", self.location.as_str()),
                ("page", page_param.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::remote(keyword, offset, e))?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::remote(keyword, offset, format!("bad response body: {e}")))?;

        Ok(ListingPage {
            has_more: body
                .search_results
                .total_pages
                .is_none_or(|total| page < total),
            records: body.search_results.jobs,
        })
    }
}

// --- JSON POST protocol ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CxsRequest<'a> {
    applied_facets: serde_json::Map<String, serde_json::Value>,
    limit: usize,
    offset: usize,
    search_text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CxsResponse {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    job_postings: Vec<serde_json::Value>,
}

/// `POST {endpoint}` with a `{limit, offset, searchText}` body.
pub struct CxsClient {
    client: Client,
    endpoint: String,
}

impl CxsClient {
    pub fn new(client: Client, search: &SearchConfig) -> Self {
        Self {
            client,
            endpoint: search.endpoint.clone(),
        }
    }
}

#[async_trait]
impl ListingSource for CxsClient {
    async fn list_page(&self, keyword: &str, offset: usize) -> Result<ListingPage> {
        log::debug!("POST {} searchText={:?} offset={}", self.endpoint, keyword, offset);

        let request = CxsRequest {
            applied_facets: serde_json::Map::new(),
            limit: PAGE_SIZE,
            offset,
            search_text: keyword,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::remote(keyword, offset, e))?;

        let body: CxsResponse = response
            .json()
            .await
            .map_err(|e| AppError::remote(keyword, offset, format!("bad response body: {e}")))?;

        // Some deployments only report `total` on the first page.
        let returned = body.job_postings.len();
        let has_more = returned >= PAGE_SIZE || offset + returned < body.total;

        Ok(ListingPage {
            has_more,
            records: body.job_postings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawListing;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn search_config(endpoint: String, protocol: ListingProtocol) -> SearchConfig {
        SearchConfig {
            protocol,
            endpoint,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_page_number_from_offset() {
        assert_eq!(SearchPageClient::page_number(0), 1);
        assert_eq!(SearchPageClient::page_number(20), 2);
        assert_eq!(SearchPageClient::page_number(100), 6);
    }

    #[tokio::test]
    async fn test_search_get_maps_offset_to_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/en-US/search"))
            .and(query_param("keyword", "Power BI"))
            .and(query_param("location", "Hyderabad"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "searchResults": {
                    "totalPages": 3,
                    "jobs": [
                        {"title": "BI Developer", "locations": ["Hyderabad"],
                         "postedDate": "Posted Today", "externalPath": "/job/7"}
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = listing_source(
            Client::new(),
            &search_config(
                format!("{}/en-US/search", server.uri()),
                ListingProtocol::SearchGet,
            ),
        );
        let page = source.list_page("Power BI", 20).await.unwrap();

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0]["externalPath"], "/job/7");
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn test_search_get_last_page_has_no_more() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "searchResults": {"totalPages": 1, "jobs": []}
            })))
            .mount(&server)
            .await;

        let client = SearchPageClient::new(
            Client::new(),
            &search_config(server.uri(), ListingProtocol::SearchGet),
        );
        let page = client.list_page("SQL", 0).await.unwrap();
        assert!(page.is_empty());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_non_success_status_is_remote_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = SearchPageClient::new(
            Client::new(),
            &search_config(server.uri(), ListingProtocol::SearchGet),
        );
        let err = client.list_page("SQL", 40).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::RemoteUnavailable { ref keyword, offset: 40, .. } if keyword == "SQL"
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_remote_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let client = SearchPageClient::new(
            Client::new(),
            &search_config(server.uri(), ListingProtocol::SearchGet),
        );
        assert!(matches!(
            client.list_page("SQL", 0).await,
            Err(AppError::RemoteUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_cxs_post_sends_offset_body() {
        let server = MockServer::start().await;
        let postings: Vec<_> = (0..PAGE_SIZE)
            .map(|i| {
                json!({
                    "title": format!("Analyst {i}"),
                    "externalPath": format!("/job/{i}"),
                    "locationsText": "Hyderabad, India",
                    "postedOn": "Posted Today"
                })
            })
            .collect();

        Mock::given(method("POST"))
            .and(path("/wday/cxs/tenant/Site/jobs"))
            .and(body_json(json!({
                "appliedFacets": {},
                "limit": 20,
                "offset": 40,
                "searchText": "ETL"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"total": 0, "jobPostings": postings})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = CxsClient::new(
            Client::new(),
            &search_config(
                format!("{}/wday/cxs/tenant/Site/jobs", server.uri()),
                ListingProtocol::CxsPost,
            ),
        );
        let page = client.list_page("ETL", 40).await.unwrap();

        assert_eq!(page.records.len(), PAGE_SIZE);
        assert!(page.has_more, "a full page implies another may follow");
    }

    #[tokio::test]
    async fn test_cxs_partial_page_ends_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 3,
                "jobPostings": [
                    {"title": "A", "externalPath": "/job/a", "locationsText": "Hyderabad", "postedOn": "Posted Today"},
                    {"title": "B", "externalPath": "/job/b", "locationsText": "Hyderabad", "postedOn": "Posted Today"},
                    {"title": "C", "externalPath": "/job/c", "locationsText": "Hyderabad", "postedOn": "Posted Today"}
                ]
            })))
            .mount(&server)
            .await;

        let client = CxsClient::new(
            Client::new(),
            &search_config(server.uri(), ListingProtocol::CxsPost),
        );
        let page = client.list_page("SQL", 0).await.unwrap();
        assert_eq!(page.records.len(), 3);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_malformed_record_does_not_sink_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "searchResults": {
                    "totalPages": 1,
                    "jobs": [
                        {"title": "SQL Developer", "locations": ["Hyderabad"],
                         "postedDate": "Posted Today", "externalPath": "/job/1"},
                        {"title": 42, "locations": {"city": "Hyderabad"},
                         "postedDate": "Posted Today", "postedOn": "Posted Today",
                         "externalPath": "/job/2"}
                    ]
                }
            })))
            .mount(&server)
            .await;

        let client = SearchPageClient::new(
            Client::new(),
            &search_config(server.uri(), ListingProtocol::SearchGet),
        );
        let page = client.list_page("SQL", 0).await.unwrap();

        assert_eq!(page.records.len(), 2);
        assert!(RawListing::from_value(page.records[0].clone()).is_ok());
        assert!(RawListing::from_value(page.records[1].clone()).is_err());
    }

    #[tokio::test]
    async fn test_missing_total_pages_keeps_paginating() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "searchResults": {
                    "jobs": [{"title": "ETL", "externalPath": "/job/9"}]
                }
            })))
            .mount(&server)
            .await;

        let client = SearchPageClient::new(
            Client::new(),
            &search_config(server.uri(), ListingProtocol::SearchGet),
        );
        let page = client.list_page("ETL", 0).await.unwrap();
        assert!(page.has_more);
    }
}
