//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: YAML config → Backend → HTTP requests → records

use futures::StreamExt;
use serde_json::json;
use snyk_source::config::load_config_from_str;
use snyk_source::{AuthConfig, Backend, Error, Query, SortSpec, SourceConfig};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn source_config(server: &MockServer, extra: &str) -> SourceConfig {
    init_tracing();
    let yaml = format!(
        r#"
rest:
  base_url: "{uri}/rest/"
v1:
  base_url: "{uri}/v1/"
http:
  max_retries: 0
  backoff:
    type: constant
    initial_ms: 1
  rate_limit: ~
{extra}
"#,
        uri = server.uri()
    );
    load_config_from_str(&yaml).unwrap()
}

fn query_of(request: &Request) -> Vec<(String, String)> {
    request
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

const APPS_ENDPOINT: &str = r#"
endpoints:
  - name: apps
    path: apps
    fields:
      - name: id
      - name: org_id
        searchable: true
      - name: name
        searchable: true
"#;

// ============================================================================
// REST Flow
// ============================================================================

#[tokio::test]
async fn test_rest_first_request_query_string() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/apps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let config = source_config(&server, APPS_ENDPOINT);
    let backend = Backend::rest(&config, AuthConfig::snyk_token("key")).unwrap();

    let query = Query::new()
        .where_eq("org_id", "abc123")
        .sort(SortSpec::asc("name"))
        .page_size(2);

    let request = backend.translate("apps", &query).unwrap();
    assert_eq!(request.query_string(), "filter[org_id]=abc123&sort=name&limit=2");

    let records = backend.collect("apps", &query).await.unwrap();
    assert!(records.is_empty());

    let received = server.received_requests().await.unwrap();
    assert_eq!(
        query_of(&received[0]),
        vec![
            ("filter[org_id]".to_string(), "abc123".to_string()),
            ("sort".to_string(), "name".to_string()),
            ("limit".to_string(), "2".to_string()),
            ("version".to_string(), "2025-11-05".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_rest_cursor_walk_yields_all_records() {
    let server = MockServer::start().await;

    // Second page, matched first
    Mock::given(method("GET"))
        .and(path("/rest/orgs/o-1/projects"))
        .and(query_param("starting_after", "xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "p-3", "type": "project", "attributes": {"name": "c"}}],
            "links": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/orgs/o-1/projects"))
        .and(query_param("version", "2025-11-05"))
        .and(header("Authorization", "token key"))
        .and(header("Accept", "application/vnd.api+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "p-1", "type": "project", "attributes": {"name": "a"}},
                {"id": "p-2", "type": "project", "attributes": {"name": "b"}}
            ],
            "links": {"next": "/rest/orgs/o-1/projects?version=2025-11-05&limit=2&starting_after=xyz"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = source_config(&server, "");
    let backend = Backend::rest(&config, AuthConfig::snyk_token("key")).unwrap();

    let query = Query::new().where_eq("org_id", "o-1").page_size(2);
    let records = backend.collect("projects", &query).await.unwrap();

    let names: Vec<_> = records.iter().map(|r| r["name"].clone()).collect();
    assert_eq!(names, vec![json!("a"), json!("b"), json!("c")]);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert!(query_of(&received[1]).contains(&("starting_after".to_string(), "xyz".to_string())));
}

#[tokio::test]
async fn test_rest_missing_data_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/orgs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errors": []})))
        .expect(1)
        .mount(&server)
        .await;

    let config = source_config(&server, "");
    let backend = Backend::rest(&config, AuthConfig::snyk_token("key")).unwrap();

    let items: Vec<_> = backend.query("orgs", &Query::new()).unwrap().collect().await;

    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(Error::MalformedResponse { .. })));
}

#[tokio::test]
async fn test_rest_http_error_is_wrapped_with_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/orgs"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let config = source_config(&server, "");
    let backend = Backend::rest(&config, AuthConfig::snyk_token("bad")).unwrap();

    let err = backend.collect("orgs", &Query::new()).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(err.to_string().contains("orgs?limit=100"));
}

#[tokio::test]
async fn test_rest_find_and_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/orgs/o-1/targets/t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "t-1", "type": "target", "attributes": {"display_name": "repo"}}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/orgs/o-1/targets/t-2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = source_config(&server, "");
    let backend = Backend::rest(&config, AuthConfig::snyk_token("key")).unwrap();
    let routing = Query::new().where_eq("org_id", "o-1");

    let found = backend.find("targets", "t-1", &routing).await.unwrap().unwrap();
    assert_eq!(found["display_name"], json!("repo"));

    assert!(backend.find("targets", "t-2", &routing).await.unwrap().is_none());
}

// ============================================================================
// V1 Flow
// ============================================================================

#[tokio::test]
async fn test_v1_full_page_then_empty_page() {
    let server = MockServer::start().await;

    let first: Vec<_> = (0..50)
        .map(|i| json!({"id": format!("w-{i}"), "url": "https://hooks.example.com"}))
        .collect();

    Mock::given(method("GET"))
        .and(path("/v1/org/o-1/webhooks"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/org/o-1/webhooks"))
        .and(query_param("page", "1"))
        .and(query_param("perPage", "50"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": first})))
        .expect(1)
        .mount(&server)
        .await;

    let config = source_config(&server, "");
    let backend = Backend::v1(&config, AuthConfig::snyk_token("key")).unwrap();

    let query = Query::new().where_eq("org_id", "o-1").page_size(50);
    let records = backend.collect("webhooks", &query).await.unwrap();

    assert_eq!(records.len(), 50);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);

    // No version parameter on v1
    let received = server.received_requests().await.unwrap();
    assert!(query_of(&received[0]).iter().all(|(k, _)| k != "version"));
}

#[tokio::test]
async fn test_v1_offset_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/org/o-1/integrations"))
        .respond_with(|request: &Request| {
            let offset = request
                .url
                .query_pairs()
                .find(|(k, _)| k == "offset")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default();
            let body = match offset.as_str() {
                "0" => json!([{"id": "i-1", "type": "github"}, {"id": "i-2", "type": "gitlab"}]),
                "2" => json!([{"id": "i-3", "type": "bitbucket"}]),
                _ => json!([]),
            };
            ResponseTemplate::new(200).set_body_json(body)
        })
        .mount(&server)
        .await;

    let mut config = source_config(&server, "");
    config.v1.pagination = snyk_source::config::V1Pagination::Offset;
    config.v1.limit_parameter_name = "limit".to_string();
    let backend = Backend::v1(&config, AuthConfig::None).unwrap();

    let query = Query::new().where_eq("org_id", "o-1").page_size(2);
    let records = backend.collect("integrations", &query).await.unwrap();

    let types: Vec<_> = records.iter().map(|r| r["integration_type"].clone()).collect();
    assert_eq!(types, vec![json!("github"), json!("gitlab"), json!("bitbucket")]);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_v1_single_object_and_empty_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/group/g-1/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessionLength": 30,
            "requestAccess": {"enabled": false}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/group/g-2/settings"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = source_config(&server, "");
    let backend = Backend::v1(&config, AuthConfig::None).unwrap();

    let settings = backend
        .collect("group_settings", &Query::new().where_eq("group_id", "g-1"))
        .await
        .unwrap();
    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0]["session_length"], json!(30));

    let empty = backend
        .collect("group_settings", &Query::new().where_eq("group_id", "g-2"))
        .await
        .unwrap();
    assert!(empty.is_empty());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_endpoint_of_wrong_api() {
    let config = SourceConfig::default();
    let backend = Backend::v1(&config, AuthConfig::None).unwrap();

    let err = backend.translate("projects", &Query::new()).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn test_config_rejects_bad_endpoint() {
    let err = load_config_from_str(
        r#"
endpoints:
  - name: broken
    path: orgs/{org_id}/broken
"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("org_id"));
}
