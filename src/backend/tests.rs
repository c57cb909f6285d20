//! Tests for backends

use super::*;
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::pagination::PageFetcher;
use crate::query::{PageRequest, PageToken, Query};
use crate::schema::ApiKind;
use crate::types::JsonValue;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use std::sync::{Arc, Mutex};

type Respond = Box<dyn Fn(&PageRequest) -> Result<JsonValue> + Send + Sync>;

/// Fetcher answering from a closure and recording every request
struct RecordingFetcher {
    respond: Respond,
    requests: Mutex<Vec<PageRequest>>,
}

impl RecordingFetcher {
    fn new(respond: impl Fn(&PageRequest) -> Result<JsonValue> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for RecordingFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<JsonValue> {
        self.requests.lock().unwrap().push(request.clone());
        (self.respond)(request)
    }
}

fn backend(api: ApiKind, fetcher: Arc<RecordingFetcher>) -> Backend {
    Backend::with_fetcher(&SourceConfig::default(), api, fetcher).unwrap()
}

fn project_page(request: &PageRequest) -> Result<JsonValue> {
    let cursor = match &request.token {
        PageToken::Cursor { cursor, .. } => cursor.clone(),
        _ => None,
    };
    Ok(match cursor.as_deref() {
        None => json!({
            "data": [
                {"id": "p-1", "attributes": {"name": "api", "type": "npm"}},
                {"id": "p-2", "attributes": {"name": "web", "type": "maven"}}
            ],
            "links": {"next": "/orgs/abc/projects?starting_after=xyz"}
        }),
        Some(_) => json!({
            "data": [{"id": "p-3", "attributes": {"name": "cli", "type": "pip"}}]
        }),
    })
}

#[tokio::test]
async fn test_rest_collect_routes_and_renames() {
    let fetcher = RecordingFetcher::new(project_page);
    let backend = backend(ApiKind::Rest, fetcher.clone());

    let query = Query::new().where_eq("org_id", "abc").page_size(2);
    let records = backend.collect("projects", &query).await.unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["project_type"], json!("npm"));
    assert!(!records[0].contains_key("type"));

    let requests = fetcher.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "orgs/abc/projects");
    assert_eq!(requests[0].query_string(), "limit=2");
    assert_eq!(requests[1].query_string(), "limit=2&starting_after=xyz");
}

#[tokio::test]
async fn test_query_fails_fast_on_translation_error() {
    let fetcher = RecordingFetcher::new(project_page);
    let backend = backend(ApiKind::Rest, fetcher.clone());

    let missing = backend.query("projects", &Query::new());
    assert!(matches!(missing, Err(Error::MissingRoutingParameter { .. })));

    let unsupported = backend.query(
        "projects",
        &Query::new().where_eq("org_id", "abc").where_eq("origin", "github"),
    );
    assert!(matches!(unsupported, Err(Error::UnsupportedFilter { .. })));

    let unknown = backend.query("nope", &Query::new());
    assert!(matches!(unknown, Err(Error::UnknownEndpoint { .. })));

    assert!(fetcher.requests().is_empty());
}

#[test]
fn test_endpoint_of_other_api_is_config_error() {
    let rest = backend(ApiKind::Rest, RecordingFetcher::new(project_page));
    let err = rest.translate("webhooks", &Query::new()).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));

    let v1 = backend(ApiKind::V1, RecordingFetcher::new(project_page));
    assert!(v1.endpoint("projects").is_err());
    assert!(v1.endpoint("webhooks").is_ok());
}

#[test]
fn test_endpoints_are_filtered_by_api() {
    let rest = backend(ApiKind::Rest, RecordingFetcher::new(project_page));
    let names = rest.endpoints();
    assert!(names.contains(&"projects"));
    assert!(!names.contains(&"webhooks"));

    let v1 = backend(ApiKind::V1, RecordingFetcher::new(project_page));
    let names = v1.endpoints();
    assert!(names.contains(&"webhooks"));
    assert!(!names.contains(&"orgs"));
}

#[tokio::test]
async fn test_v1_stream_pages_by_number() {
    let fetcher = RecordingFetcher::new(|request: &PageRequest| {
        let page = match &request.token {
            PageToken::PageNumber { page, .. } => *page,
            _ => 0,
        };
        Ok(match page {
            1 => json!({"results": [{"id": "w-1", "orgId": "o"}, {"id": "w-2", "orgId": "o"}]}),
            _ => json!({"results": []}),
        })
    });
    let backend = backend(ApiKind::V1, fetcher.clone());

    let query = Query::new().where_eq("org_id", "o").page_size(2);
    let records: Vec<_> = backend
        .query("webhooks", &query)
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
        .await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["org_id"], json!("o"));
    let requests = fetcher.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "org/o/webhooks");
    assert_eq!(requests[1].query_string(), "page=2&perPage=2");
}

#[tokio::test]
async fn test_max_pages_applies_to_walks() {
    let fetcher = RecordingFetcher::new(project_page);
    let backend = backend(ApiKind::Rest, fetcher.clone()).max_pages(1);

    let records = backend
        .collect("projects", &Query::new().where_eq("org_id", "abc"))
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(fetcher.requests().len(), 1);
}

// ============================================================================
// Find Tests
// ============================================================================

#[tokio::test]
async fn test_find_returns_single_record() {
    let fetcher = RecordingFetcher::new(|_: &PageRequest| {
        Ok(json!({
            "data": {
                "id": "t-1",
                "attributes": {"display_name": "repo"},
                "relationships": {"organization": {"data": {"id": "abc"}}}
            }
        }))
    });
    let backend = backend(ApiKind::Rest, fetcher.clone());

    let record = backend
        .find("targets", "t-1", &Query::new().where_eq("org_id", "abc"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record["display_name"], json!("repo"));
    assert_eq!(record["org_id"], json!("abc"));
    let requests = fetcher.requests();
    assert_eq!(requests[0].path, "orgs/abc/targets/t-1");
    assert_eq!(requests[0].token, PageToken::Single);
}

#[tokio::test]
async fn test_find_not_found_is_none() {
    let fetcher = RecordingFetcher::new(|_: &PageRequest| Err(Error::http_status(404, "")));
    let backend = backend(ApiKind::V1, fetcher);

    let found = backend
        .find("webhooks", "w-9", &Query::new().where_eq("org_id", "o"))
        .await
        .unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn test_find_propagates_other_failures() {
    let fetcher = RecordingFetcher::new(|_: &PageRequest| Err(Error::http_status(500, "boom")));
    let backend = backend(ApiKind::Rest, fetcher);

    let err = backend
        .find("targets", "t-1", &Query::new().where_eq("org_id", "abc"))
        .await
        .unwrap_err();

    match err {
        Error::PageFetch { request, source } => {
            assert_eq!(request.path, "orgs/abc/targets/t-1");
            assert_eq!(source.status(), Some(500));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_find_requires_routing() {
    let fetcher = RecordingFetcher::new(project_page);
    let backend = backend(ApiKind::Rest, fetcher.clone());

    let err = backend.find("targets", "t-1", &Query::new()).await.unwrap_err();

    assert!(matches!(err, Error::MissingRoutingParameter { .. }));
    assert!(fetcher.requests().is_empty());
}

#[test]
fn test_config_built_in_code_is_validated() {
    let mut config = SourceConfig::default();
    config.rest.max_page_size = 0;

    let fetcher = RecordingFetcher::new(project_page);
    let err = Backend::with_fetcher(&config, ApiKind::Rest, fetcher.clone()).unwrap_err();

    assert!(matches!(err, Error::InvalidConfigValue { .. }));
    assert!(fetcher.requests().is_empty());
}

#[test]
fn test_from_config_resolves_auth() {
    let config = crate::config::load_config_from_str("auth:\n  type: none\n").unwrap();
    let backend = Backend::from_config(&config, ApiKind::V1).unwrap();
    assert_eq!(backend.api(), ApiKind::V1);
    assert!(format!("{backend:?}").contains("Backend"));
}
