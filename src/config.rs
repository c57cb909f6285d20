//! Configuration for the Snyk backends
//!
//! This module contains the configuration structures for both APIs, the
//! HTTP transport and authentication, plus loading from YAML. Every
//! section has defaults, so an empty document is a valid configuration.

use crate::auth::{AuthConfig, DEFAULT_KEY_VAR, DEFAULT_SECRET_PATH_VAR, SNYK_TOKEN_PREFIX};
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClientConfig;
use crate::schema::{ApiKind, EndpointSchema, Registry};
use crate::types::{ApiCasing, BackoffType, StringMap};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete configuration for snyk-source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// REST API settings
    #[serde(default)]
    pub rest: RestConfig,

    /// v1 API settings
    #[serde(default)]
    pub v1: V1Config,

    /// HTTP transport settings, shared by both APIs
    #[serde(default)]
    pub http: HttpConfig,

    /// Authentication
    #[serde(default)]
    pub auth: AuthDefinition,

    /// Extra endpoints, merged over the built-in catalogue
    #[serde(default)]
    pub endpoints: Vec<EndpointSchema>,
}

impl SourceConfig {
    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        validate_api("rest", &self.rest.base_url, self.rest.default_page_size, self.rest.max_page_size)?;
        validate_api("v1", &self.v1.base_url, self.v1.default_page_size, self.v1.max_page_size)?;

        if self.rest.api_version.trim().is_empty() {
            return Err(Error::invalid_value("rest.api_version", "must not be empty"));
        }

        let mut names = HashSet::new();
        for endpoint in &self.endpoints {
            endpoint.validate()?;
            if !names.insert(endpoint.name.as_str()) {
                return Err(Error::invalid_value(
                    "endpoints",
                    format!("duplicate endpoint '{}'", endpoint.name),
                ));
            }
        }

        Ok(())
    }

    /// Built-in endpoints plus the configured ones
    pub fn registry(&self) -> Result<Registry> {
        let mut registry = Registry::builtin();
        for endpoint in &self.endpoints {
            registry.register(endpoint.clone())?;
        }
        Ok(registry)
    }

    /// HTTP client settings for the given API
    ///
    /// REST clients also send `version` on every request.
    pub fn client_config(&self, api: ApiKind) -> HttpClientConfig {
        let (base_url, headers) = match api {
            ApiKind::Rest => (&self.rest.base_url, &self.rest.headers),
            ApiKind::V1 => (&self.v1.base_url, &self.v1.headers),
        };

        let mut config = HttpClientConfig::new(base_url).with_http(self.http.clone());
        config.headers.clone_from(headers);
        if api == ApiKind::Rest {
            config = config.with_query("version", &self.rest.api_version);
        }
        config
    }
}

fn validate_api(section: &str, base_url: &str, default_size: u32, max_size: u32) -> Result<()> {
    if base_url.trim().is_empty() {
        return Err(Error::invalid_value(
            format!("{section}.base_url"),
            "must not be empty",
        ));
    }
    url::Url::parse(base_url)?;
    if default_size == 0 || max_size == 0 {
        return Err(Error::invalid_value(
            format!("{section}.default_page_size"),
            "page sizes must be at least 1",
        ));
    }
    if default_size > max_size {
        return Err(Error::invalid_value(
            format!("{section}.default_page_size"),
            format!("{default_size} exceeds max_page_size {max_size}"),
        ));
    }
    Ok(())
}

// ============================================================================
// REST Config
// ============================================================================

/// REST API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    #[serde(default = "default_rest_base_url")]
    pub base_url: String,

    /// Sent as the `version` query parameter on every request
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Cursor query parameter
    #[serde(default = "default_cursor_param")]
    pub pagination_parameter_name: String,

    #[serde(default = "default_limit_param")]
    pub limit_parameter_name: String,

    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "default_page_size")]
    pub max_page_size: u32,

    #[serde(default = "default_rest_headers")]
    pub headers: StringMap,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: default_rest_base_url(),
            api_version: default_api_version(),
            pagination_parameter_name: default_cursor_param(),
            limit_parameter_name: default_limit_param(),
            default_page_size: default_page_size(),
            max_page_size: default_page_size(),
            headers: default_rest_headers(),
        }
    }
}

fn default_rest_base_url() -> String {
    "https://api.snyk.io/rest/".to_string()
}

fn default_api_version() -> String {
    "2025-11-05".to_string()
}

fn default_cursor_param() -> String {
    "starting_after".to_string()
}

fn default_limit_param() -> String {
    "limit".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_rest_headers() -> StringMap {
    StringMap::from([(
        "Accept".to_string(),
        "application/vnd.api+json".to_string(),
    )])
}

// ============================================================================
// V1 Config
// ============================================================================

/// Pagination style used by v1 endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum V1Pagination {
    /// `page` + `perPage`, first page 1
    #[default]
    Page,
    /// `offset` + limit, first offset 0
    Offset,
}

/// v1 API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct V1Config {
    #[serde(default = "default_v1_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub pagination: V1Pagination,

    /// Page number parameter (page style)
    #[serde(default = "default_page_param")]
    pub pagination_parameter_name: String,

    /// Offset parameter (offset style)
    #[serde(default = "default_offset_param")]
    pub offset_parameter_name: String,

    /// Page size parameter, used by both styles
    #[serde(default = "default_per_page_param")]
    pub limit_parameter_name: String,

    #[serde(default = "default_sort_param")]
    pub sort_parameter_name: String,

    #[serde(default = "default_order_param")]
    pub order_parameter_name: String,

    /// Field name casing on the wire
    #[serde(default)]
    pub api_casing: ApiCasing,

    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "default_v1_max_page_size")]
    pub max_page_size: u32,

    #[serde(default = "default_v1_headers")]
    pub headers: StringMap,
}

impl Default for V1Config {
    fn default() -> Self {
        Self {
            base_url: default_v1_base_url(),
            pagination: V1Pagination::default(),
            pagination_parameter_name: default_page_param(),
            offset_parameter_name: default_offset_param(),
            limit_parameter_name: default_per_page_param(),
            sort_parameter_name: default_sort_param(),
            order_parameter_name: default_order_param(),
            api_casing: ApiCasing::default(),
            default_page_size: default_page_size(),
            max_page_size: default_v1_max_page_size(),
            headers: default_v1_headers(),
        }
    }
}

fn default_v1_base_url() -> String {
    "https://api.snyk.io/v1/".to_string()
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_offset_param() -> String {
    "offset".to_string()
}

fn default_per_page_param() -> String {
    "perPage".to_string()
}

fn default_sort_param() -> String {
    "sortBy".to_string()
}

fn default_order_param() -> String {
    "order".to_string()
}

fn default_v1_max_page_size() -> u32 {
    1000
}

fn default_v1_headers() -> StringMap {
    StringMap::from([("Content-Type".to_string(), "application/json".to_string())])
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff configuration
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Client-side rate limit, `None` to disable
    #[serde(default = "default_rate_limit")]
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            backoff: BackoffConfig::default(),
            rate_limit: default_rate_limit(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_rate_limit() -> Option<RateLimitConfig> {
    Some(RateLimitConfig::default())
}

/// Backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

impl BackoffConfig {
    /// Delay before the retry following `attempt` (0-based), capped at `max_ms`
    pub fn delay(&self, attempt: u32) -> Duration {
        let initial = Duration::from_millis(self.initial_ms);
        let delay = match self.backoff_type {
            BackoffType::Constant => initial,
            BackoffType::Linear => initial.saturating_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => initial.saturating_mul(2u32.saturating_pow(attempt)),
        };
        delay.min(Duration::from_millis(self.max_ms))
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60000
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests per second limit
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,

    /// Burst size
    #[serde(default = "default_rps")]
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rps(),
            burst_size: default_rps(),
        }
    }
}

fn default_rps() -> u32 {
    10
}

// ============================================================================
// Auth Config
// ============================================================================

/// Authentication as declared in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthDefinition {
    /// Read the key from the environment
    Env {
        /// Variable naming a file that contains the key, checked first
        #[serde(default = "default_secret_path_var")]
        secret_path_var: String,
        /// Variable holding the key itself
        #[serde(default = "default_key_var")]
        key_var: String,
        #[serde(default = "default_token_prefix")]
        prefix: String,
    },

    /// A literal API key
    Token {
        value: String,
        #[serde(default = "default_token_prefix")]
        prefix: String,
    },

    /// A bearer token (OAuth access tokens)
    Bearer { token: String },

    /// No authentication
    None,
}

impl Default for AuthDefinition {
    fn default() -> Self {
        Self::Env {
            secret_path_var: default_secret_path_var(),
            key_var: default_key_var(),
            prefix: default_token_prefix(),
        }
    }
}

impl AuthDefinition {
    /// Resolve into runtime auth, reading the environment when needed
    pub fn resolve(&self) -> Result<AuthConfig> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve using a custom variable lookup
    pub fn resolve_with<F>(&self, lookup: F) -> Result<AuthConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            AuthDefinition::Env {
                secret_path_var,
                key_var,
                prefix,
            } => AuthConfig::from_lookup(lookup, secret_path_var, key_var, prefix),
            AuthDefinition::Token { value, prefix } => Ok(AuthConfig::token(value, prefix)),
            AuthDefinition::Bearer { token } => Ok(AuthConfig::Bearer {
                token: token.clone(),
            }),
            AuthDefinition::None => Ok(AuthConfig::None),
        }
    }
}

fn default_secret_path_var() -> String {
    DEFAULT_SECRET_PATH_VAR.to_string()
}

fn default_key_var() -> String {
    DEFAULT_KEY_VAR.to_string()
}

fn default_token_prefix() -> String {
    SNYK_TOKEN_PREFIX.to_string()
}

// ============================================================================
// Loading
// ============================================================================

/// Load configuration from a YAML file
pub fn load_config(path: impl AsRef<Path>) -> Result<SourceConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    load_config_from_str(&content)
}

/// Load configuration from a YAML string
pub fn load_config_from_str(yaml: &str) -> Result<SourceConfig> {
    // serde_yaml rejects an empty document as a struct
    let config: SourceConfig = if yaml.trim().is_empty() {
        SourceConfig::default()
    } else {
        serde_yaml::from_str(yaml)?
    };

    config.validate()?;
    Ok(config)
}
