//! Tests for pagination module

use super::*;
use crate::decode::{RestResponseParser, V1ResponseParser};
use crate::error::{Error, Result};
use crate::query::{PageRequest, PageToken};
use crate::types::{ApiCasing, JsonValue};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Fetcher answering from a closure and recording every request
struct FnFetcher<F> {
    respond: F,
    requests: Mutex<Vec<PageRequest>>,
}

impl<F> FnFetcher<F>
where
    F: Fn(&PageRequest) -> Result<JsonValue> + Send + Sync,
{
    fn new(respond: F) -> Arc<Self> {
        Arc::new(Self {
            respond,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl<F> PageFetcher for FnFetcher<F>
where
    F: Fn(&PageRequest) -> Result<JsonValue> + Send + Sync,
{
    async fn fetch(&self, request: &PageRequest) -> Result<JsonValue> {
        self.requests.lock().unwrap().push(request.clone());
        (self.respond)(request)
    }
}

fn cursor_of(request: &PageRequest) -> Option<&str> {
    match &request.token {
        PageToken::Cursor { cursor, .. } => cursor.as_deref(),
        _ => None,
    }
}

fn page_of(request: &PageRequest) -> u32 {
    match &request.token {
        PageToken::PageNumber { page, .. } => *page,
        _ => 0,
    }
}

fn rest_request(limit: u32) -> PageRequest {
    PageRequest::new(
        "orgs",
        "orgs",
        vec![("filter[group_id]".to_string(), "g-1".to_string())],
        PageToken::Cursor {
            cursor_param: "starting_after".to_string(),
            limit_param: "limit".to_string(),
            limit,
            cursor: None,
        },
    )
}

fn v1_request(per_page: u32) -> PageRequest {
    PageRequest::new(
        "webhooks",
        "org/o-1/webhooks",
        Vec::new(),
        PageToken::PageNumber {
            page_param: "page".to_string(),
            per_page_param: "perPage".to_string(),
            page: 1,
            per_page,
        },
    )
}

fn rest_parser() -> Arc<RestResponseParser> {
    Arc::new(RestResponseParser::new(Vec::new(), "starting_after"))
}

fn v1_parser() -> Arc<V1ResponseParser> {
    Arc::new(V1ResponseParser::new(Vec::new(), None, ApiCasing::CamelCase))
}

fn ids(records: &[crate::types::Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r["id"].as_str().unwrap_or_default().to_string())
        .collect()
}

/// Two REST pages: a, b then c
fn two_rest_pages(request: &PageRequest) -> Result<JsonValue> {
    Ok(match cursor_of(request) {
        None => json!({
            "data": [{"id": "a"}, {"id": "b"}],
            "links": {"next": "/orgs?starting_after=xyz"}
        }),
        Some("xyz") => json!({"data": [{"id": "c"}], "links": {}}),
        Some(other) => panic!("unexpected cursor {other}"),
    })
}

// ============================================================================
// PageResult Tests
// ============================================================================

#[test]
fn test_page_result_helpers() {
    let last = PageResult::last(Vec::new());
    assert!(last.is_empty());
    assert!(!last.has_next());

    let more = PageResult::new(vec![crate::types::Record::new()], Some(NextToken::Advance));
    assert_eq!(more.len(), 1);
    assert!(more.has_next());
}

// ============================================================================
// Walker Tests
// ============================================================================

#[tokio::test]
async fn test_rest_walk_follows_cursor() {
    let fetcher = FnFetcher::new(two_rest_pages);
    let walker = PageWalker::new(fetcher.clone(), rest_parser(), rest_request(2));

    let records = walker.collect().await.unwrap();

    assert_eq!(ids(&records), vec!["a", "b", "c"]);
    let requests = fetcher.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(cursor_of(&requests[0]), None);
    assert_eq!(cursor_of(&requests[1]), Some("xyz"));
    assert_eq!(requests[1].params, requests[0].params);
}

#[tokio::test]
async fn test_v1_walk_stops_on_empty_page() {
    let fetcher = FnFetcher::new(|request: &PageRequest| {
        let records: Vec<JsonValue> = match page_of(request) {
            1 => (0..50).map(|i| json!({"id": format!("w-{i}")})).collect(),
            _ => Vec::new(),
        };
        Ok(JsonValue::Array(records))
    });
    let walker = PageWalker::new(fetcher.clone(), v1_parser(), v1_request(50));

    let records = walker.collect().await.unwrap();

    assert_eq!(records.len(), 50);
    let requests = fetcher.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(page_of(&requests[1]), 2);
}

#[tokio::test]
async fn test_v1_short_page_issues_no_further_request() {
    let fetcher = FnFetcher::new(|_: &PageRequest| Ok(json!({"results": [{"id": "a"}]})));
    let walker = PageWalker::new(fetcher.clone(), v1_parser(), v1_request(10));

    let records = walker.collect().await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(fetcher.requests().len(), 1);
}

#[tokio::test]
async fn test_malformed_first_page_yields_no_records() {
    let fetcher = FnFetcher::new(|_: &PageRequest| Ok(json!({"links": {}})));
    let walker = PageWalker::new(fetcher.clone(), rest_parser(), rest_request(2));

    let items: Vec<Result<crate::types::Record>> = walker.records().collect().await;

    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(Error::MalformedResponse { .. })));
    assert_eq!(fetcher.requests().len(), 1);
}

#[tokio::test]
async fn test_fetch_failure_keeps_earlier_records() {
    let fetcher = FnFetcher::new(|request: &PageRequest| match cursor_of(request) {
        None => Ok(json!({
            "data": [{"id": "a"}],
            "links": {"next": "/orgs?starting_after=p2"}
        })),
        Some(_) => Err(Error::http_status(503, "unavailable")),
    });
    let walker = PageWalker::new(fetcher, rest_parser(), rest_request(1));

    let items: Vec<Result<crate::types::Record>> = walker.records().collect().await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap()["id"], json!("a"));
    match &items[1] {
        Err(Error::PageFetch { request, source }) => {
            assert_eq!(cursor_of(request), Some("p2"));
            assert_eq!(source.status(), Some(503));
        }
        other => panic!("unexpected item: {other:?}"),
    }
}

#[tokio::test]
async fn test_repeated_cursor_ends_walk() {
    let fetcher = FnFetcher::new(|_: &PageRequest| {
        Ok(json!({
            "data": [{"id": "loop"}],
            "links": {"next": "/orgs?starting_after=same"}
        }))
    });
    let walker = PageWalker::new(fetcher.clone(), rest_parser(), rest_request(1));

    let records = walker.collect().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(fetcher.requests().len(), 2);
}

#[tokio::test]
async fn test_zero_records_with_next_token_ends_walk() {
    let fetcher = FnFetcher::new(|_: &PageRequest| {
        Ok(json!({"data": [], "links": {"next": "/orgs?starting_after=more"}}))
    });
    let walker = PageWalker::new(fetcher.clone(), rest_parser(), rest_request(10));

    let records = walker.collect().await.unwrap();

    assert!(records.is_empty());
    assert_eq!(fetcher.requests().len(), 1);
}

#[tokio::test]
async fn test_walk_is_restartable() {
    let fetcher = FnFetcher::new(two_rest_pages);
    let walker = PageWalker::new(fetcher.clone(), rest_parser(), rest_request(2));

    let first = walker.collect().await.unwrap();
    let second = walker.collect().await.unwrap();

    assert_eq!(first, second);
    let requests = fetcher.requests();
    assert_eq!(requests.len(), 4);
    assert_eq!(requests[0], requests[2]);
    assert_eq!(requests[1], requests[3]);
}

#[tokio::test]
async fn test_walk_is_lazy() {
    let fetcher = FnFetcher::new(two_rest_pages);
    let walker = PageWalker::new(fetcher.clone(), rest_parser(), rest_request(2));

    let mut records = walker.records();
    assert!(fetcher.requests().is_empty());

    let first = records.next().await.unwrap().unwrap();
    assert_eq!(first["id"], json!("a"));
    drop(records);

    assert_eq!(fetcher.requests().len(), 1);
}

#[tokio::test]
async fn test_max_pages() {
    let fetcher = FnFetcher::new(two_rest_pages);
    let walker = PageWalker::new(fetcher.clone(), rest_parser(), rest_request(2)).max_pages(1);

    let records = walker.collect().await.unwrap();

    assert_eq!(ids(&records), vec!["a", "b"]);
    assert_eq!(fetcher.requests().len(), 1);
}

#[tokio::test]
async fn test_zero_max_pages_fetches_nothing() {
    let fetcher = FnFetcher::new(two_rest_pages);
    let walker = PageWalker::new(fetcher.clone(), rest_parser(), rest_request(2)).max_pages(0);

    let records = walker.collect().await.unwrap();

    assert!(records.is_empty());
    assert!(fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_pages_stream() {
    let fetcher = FnFetcher::new(two_rest_pages);
    let walker = PageWalker::new(fetcher, rest_parser(), rest_request(2));

    let pages: Vec<PageResult> = walker
        .pages()
        .map(|page| page.unwrap())
        .collect()
        .await;

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].next, Some(NextToken::Cursor("xyz".to_string())));
    assert!(pages[1].next.is_none());
}

#[tokio::test]
async fn test_single_request_walk() {
    let fetcher = FnFetcher::new(|_: &PageRequest| {
        Ok(json!({"data": {"id": "me", "attributes": {"name": "Ada"}}}))
    });
    let request = PageRequest::new("self", "self", Vec::new(), PageToken::Single);
    let walker = PageWalker::new(fetcher.clone(), rest_parser(), request);

    let records = walker.collect().await.unwrap();

    assert_eq!(ids(&records), vec!["me"]);
    assert_eq!(fetcher.requests().len(), 1);
}
