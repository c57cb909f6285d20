//! Error types for snyk-source
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use crate::query::PageRequest;
use thiserror::Error;

/// The main error type for snyk-source
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Query Errors (caller's fault, raised before any request is sent)
    // ============================================================================
    #[error("Unsupported filter on '{endpoint}.{field}': {message}")]
    UnsupportedFilter {
        endpoint: String,
        field: String,
        message: String,
    },

    #[error("Endpoint '{endpoint}' requires an equality filter on '{parameter}'")]
    MissingRoutingParameter { endpoint: String, parameter: String },

    #[error("Unknown endpoint: {endpoint}")]
    UnknownEndpoint { endpoint: String },

    // ============================================================================
    // Pagination Errors
    // ============================================================================
    #[error("Failed to fetch page {request}: {source}")]
    PageFetch {
        request: Box<PageRequest>,
        #[source]
        source: Box<Error>,
    },

    #[error("Malformed response from '{endpoint}': {message}")]
    MalformedResponse { endpoint: String, message: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create an unsupported filter error
    pub fn unsupported_filter(
        endpoint: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::UnsupportedFilter {
            endpoint: endpoint.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a missing routing parameter error
    pub fn missing_routing(endpoint: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::MissingRoutingParameter {
            endpoint: endpoint.into(),
            parameter: parameter.into(),
        }
    }

    /// Create an unknown endpoint error
    pub fn unknown_endpoint(endpoint: impl Into<String>) -> Self {
        Self::UnknownEndpoint {
            endpoint: endpoint.into(),
        }
    }

    /// Wrap a transport or decoding failure with the request that caused it
    pub fn page_fetch(request: PageRequest, source: Error) -> Self {
        Self::PageFetch {
            request: Box::new(request),
            source: Box::new(source),
        }
    }

    /// Create a malformed response error
    pub fn malformed(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimited { .. } | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// Check if this error was caused by invalid query input
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedFilter { .. }
                | Error::MissingRoutingParameter { .. }
                | Error::UnknownEndpoint { .. }
        )
    }

    /// The HTTP status behind this error, looking through page fetch wrappers
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::PageFetch { source, .. } => source.status(),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for snyk-source
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context built lazily from a closure
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::PageToken;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("SNYK_AUTH_KEY");
        assert_eq!(err.to_string(), "Missing required config field: SNYK_AUTH_KEY");

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");

        let err = Error::unsupported_filter("orgs", "slug", "field is not queryable");
        assert_eq!(
            err.to_string(),
            "Unsupported filter on 'orgs.slug': field is not queryable"
        );
    }

    #[test]
    fn test_page_fetch_display_includes_request() {
        let request = PageRequest::new("orgs", "orgs", Vec::new(), PageToken::Single);
        let err = Error::page_fetch(request, Error::http_status(502, "bad gateway"));
        assert_eq!(
            err.to_string(),
            "Failed to fetch page orgs: HTTP 502: bad gateway"
        );
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::RateLimited {
            retry_after_seconds: 60
        }
        .is_retryable());
        assert!(Error::Timeout { timeout_ms: 1000 }.is_retryable());
        assert!(Error::http_status(429, "").is_retryable());
        assert!(Error::http_status(500, "").is_retryable());
        assert!(Error::http_status(503, "").is_retryable());

        assert!(!Error::http_status(400, "").is_retryable());
        assert!(!Error::http_status(404, "").is_retryable());
        assert!(!Error::malformed("orgs", "missing data").is_retryable());
    }

    #[test]
    fn test_is_caller_error() {
        assert!(Error::unsupported_filter("orgs", "x", "unknown").is_caller_error());
        assert!(Error::missing_routing("projects", "org_id").is_caller_error());
        assert!(Error::unknown_endpoint("nope").is_caller_error());
        assert!(!Error::malformed("orgs", "missing data").is_caller_error());
        assert!(!Error::http_status(500, "").is_caller_error());
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = result.with_context(|| "reading secrets".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "reading secrets: IO error: gone");
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: Error = anyhow::anyhow!("custom fetcher failed").into();
        assert!(matches!(err, Error::Anyhow(_)));
        assert_eq!(err.to_string(), "custom fetcher failed");
    }
}
