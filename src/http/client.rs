//! HTTP page fetcher
//!
//! Sends each [`PageRequest`] as a GET below the API base URL. Transient
//! failures (429, retryable 5xx, timeouts, refused connections) are
//! retried with the configured backoff, and every attempt first waits
//! on the rate limiter.

use super::rate_limit::RateLimiter;
use crate::auth::{AuthConfig, Authenticator};
use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::pagination::PageFetcher;
use crate::query::PageRequest;
use crate::types::{JsonObject, JsonValue, StringMap};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Wait used for a 429 without a usable `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Settings for the client of one API
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL that request paths are joined onto
    pub base_url: String,
    /// Headers sent with every request
    pub headers: StringMap,
    /// Query parameters appended after each request's own
    pub default_query: Vec<(String, String)>,
    /// Timeout, retry, backoff and rate limit settings
    pub http: HttpConfig,
    pub user_agent: String,
}

impl HttpClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: StringMap::new(),
            default_query: Vec::new(),
            http: HttpConfig::default(),
            user_agent: format!("snyk-source/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }
}

/// A failed attempt and whether another one is worthwhile
struct Failure {
    error: Error,
    retry: bool,
    /// Server-requested wait, overriding the backoff
    wait: Option<Duration>,
}

impl Failure {
    fn fatal(error: Error) -> Self {
        Self {
            error,
            retry: false,
            wait: None,
        }
    }
}

/// Fetches pages from one Snyk API
pub struct HttpClient {
    client: Client,
    base_url: Url,
    default_query: Vec<(String, String)>,
    http: HttpConfig,
    authenticator: Authenticator,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig, auth: AuthConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_seconds))
            .user_agent(&config.user_agent)
            .default_headers(header_map(&config.headers)?)
            .build()?;

        // A base without a trailing slash would lose its last segment on join
        let base_url = Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))?;
        let rate_limiter = config.http.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            base_url,
            default_query: config.default_query,
            http: config.http,
            authenticator: Authenticator::new(auth),
            rate_limiter,
        })
    }

    /// Absolute URL for a request path
    fn url_for(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Send the GET for `request`, retrying transient failures
    async fn send(&self, request: &PageRequest) -> Result<Response> {
        let url = self.url_for(&request.path)?;
        let mut query = request.query_pairs();
        query.extend(self.default_query.iter().cloned());

        let max_retries = self.http.max_retries;
        let mut attempt = 0;

        loop {
            if let Some(limiter) = &self.rate_limiter {
                limiter.wait().await;
            }

            let builder = self.client.get(url.clone()).query(&query);
            let failure = match self.authenticator.apply(builder).send().await {
                Ok(response) if is_success(response.status()) => {
                    debug!(
                        endpoint = %request.endpoint,
                        request = %request,
                        status = response.status().as_u16(),
                        "Page request succeeded"
                    );
                    return Ok(response);
                }
                Ok(response) => status_failure(response).await,
                Err(e) => self.transport_failure(e),
            };

            if !failure.retry || attempt >= max_retries {
                return Err(failure.error);
            }

            let delay = failure
                .wait
                .unwrap_or_else(|| self.http.backoff.delay(attempt));
            attempt += 1;
            warn!(
                endpoint = %request.endpoint,
                request = %request,
                attempt,
                max_retries,
                error = %failure.error,
                "Retrying page request in {delay:?}"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn transport_failure(&self, error: reqwest::Error) -> Failure {
        if error.is_timeout() {
            return Failure {
                error: Error::Timeout {
                    timeout_ms: self.http.timeout_seconds.saturating_mul(1000),
                },
                retry: true,
                wait: None,
            };
        }
        Failure {
            retry: error.is_connect(),
            error: Error::Http(error),
            wait: None,
        }
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, request: &PageRequest) -> Result<JsonValue> {
        let text = self.send(request).await?.text().await?;
        // Some v1 endpoints answer 200 with no body
        if text.trim().is_empty() {
            return Ok(JsonValue::Object(JsonObject::new()));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .field("default_query", &self.default_query)
            .field("http", &self.http)
            .field("auth", self.authenticator.config())
            .finish_non_exhaustive()
    }
}

fn header_map(headers: &StringMap) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::invalid_value("headers", format!("'{name}': {e}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| Error::invalid_value("headers", format!("'{name}': {e}")))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

fn is_success(status: StatusCode) -> bool {
    !status.is_client_error() && !status.is_server_error()
}

async fn status_failure(response: Response) -> Failure {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let seconds = retry_after_secs(&response).unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Failure {
            error: Error::RateLimited {
                retry_after_seconds: seconds,
            },
            retry: true,
            wait: Some(Duration::from_secs(seconds)),
        };
    }

    let body = response.text().await.unwrap_or_default();
    let error = Error::http_status(status.as_u16(), body);
    if error.is_retryable() {
        Failure {
            error,
            retry: true,
            wait: None,
        }
    } else {
        Failure::fatal(error)
    }
}

/// `Retry-After` in whole seconds; HTTP-date values are ignored
fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
