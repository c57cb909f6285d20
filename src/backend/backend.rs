//! Backend implementation

use crate::auth::AuthConfig;
use crate::config::SourceConfig;
use crate::decode::{ResponseParser, RestResponseParser, V1ResponseParser};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::pagination::{PageFetcher, PageWalker, RecordStream};
use crate::query::{PageRequest, Query, QueryTranslator, RestTranslator, V1Translator};
use crate::schema::{ApiKind, EndpointSchema, Registry};
use crate::types::{ApiCasing, Record};
use std::sync::Arc;
use tracing::debug;

/// How records of an endpoint are decoded
#[derive(Debug, Clone)]
enum Dialect {
    Rest { cursor_param: String },
    V1 { casing: ApiCasing },
}

impl Dialect {
    fn parser(&self, endpoint: &EndpointSchema) -> Arc<dyn ResponseParser> {
        match self {
            Dialect::Rest { cursor_param } => Arc::new(RestResponseParser::for_endpoint(
                endpoint,
                cursor_param.as_str(),
            )),
            Dialect::V1 { casing } => Arc::new(V1ResponseParser::for_endpoint(endpoint, *casing)),
        }
    }
}

/// Query entry point for one Snyk API
///
/// Owns the endpoint registry, a translator and a shared page fetcher.
/// Cloning is cheap and clones share the HTTP client.
#[derive(Clone)]
pub struct Backend {
    api: ApiKind,
    registry: Arc<Registry>,
    translator: Arc<dyn QueryTranslator>,
    fetcher: Arc<dyn PageFetcher>,
    dialect: Dialect,
    max_pages: Option<usize>,
}

impl Backend {
    /// Backend for the REST API
    pub fn rest(config: &SourceConfig, auth: AuthConfig) -> Result<Self> {
        let client = HttpClient::new(config.client_config(ApiKind::Rest), auth)?;
        Self::with_fetcher(config, ApiKind::Rest, Arc::new(client))
    }

    /// Backend for the v1 API
    pub fn v1(config: &SourceConfig, auth: AuthConfig) -> Result<Self> {
        let client = HttpClient::new(config.client_config(ApiKind::V1), auth)?;
        Self::with_fetcher(config, ApiKind::V1, Arc::new(client))
    }

    /// Backend using the auth declared in `config`
    pub fn from_config(config: &SourceConfig, api: ApiKind) -> Result<Self> {
        let auth = config.auth.resolve()?;
        match api {
            ApiKind::Rest => Self::rest(config, auth),
            ApiKind::V1 => Self::v1(config, auth),
        }
    }

    /// Backend with a caller-supplied page fetcher
    ///
    /// `config` is validated first, so configs built in code get the same
    /// checks as loaded ones.
    pub fn with_fetcher(
        config: &SourceConfig,
        api: ApiKind,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self> {
        config.validate()?;
        let registry = config.registry()?;
        let (translator, dialect): (Arc<dyn QueryTranslator>, Dialect) = match api {
            ApiKind::Rest => (
                Arc::new(RestTranslator::new(&config.rest)),
                Dialect::Rest {
                    cursor_param: config.rest.pagination_parameter_name.clone(),
                },
            ),
            ApiKind::V1 => (
                Arc::new(V1Translator::new(&config.v1)),
                Dialect::V1 {
                    casing: config.v1.api_casing,
                },
            ),
        };

        Ok(Self {
            api,
            registry: Arc::new(registry),
            translator,
            fetcher,
            dialect,
            max_pages: None,
        })
    }

    /// Stop every walk after this many pages
    #[must_use]
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// The API this backend talks to
    pub fn api(&self) -> ApiKind {
        self.api
    }

    /// The endpoint registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Names of the endpoints served by this backend
    pub fn endpoints(&self) -> Vec<&str> {
        self.registry
            .names()
            .into_iter()
            .filter(|name| {
                self.registry
                    .get(name)
                    .is_ok_and(|endpoint| endpoint.api == self.api)
            })
            .collect()
    }

    /// Look up an endpoint, rejecting ones that belong to the other API
    pub fn endpoint(&self, name: &str) -> Result<&EndpointSchema> {
        let endpoint = self.registry.get(name)?;
        if endpoint.api != self.api {
            return Err(Error::config(format!(
                "Endpoint '{}' belongs to the {} API, not {}",
                endpoint.name, endpoint.api, self.api
            )));
        }
        Ok(endpoint)
    }

    /// Translate a query into the first page request
    pub fn translate(&self, endpoint: &str, query: &Query) -> Result<PageRequest> {
        let schema = self.endpoint(endpoint)?;
        let request = self.translator.translate(schema, query)?;
        debug!(endpoint, request = %request, "Translated query");
        Ok(request)
    }

    /// Build a walker over every page of a query
    pub fn walker(&self, endpoint: &str, query: &Query) -> Result<PageWalker> {
        let schema = self.endpoint(endpoint)?;
        let request = self.translator.translate(schema, query)?;
        debug!(endpoint, request = %request, "Translated query");

        let walker = PageWalker::new(
            Arc::clone(&self.fetcher),
            self.dialect.parser(schema),
            request,
        );
        Ok(match self.max_pages {
            Some(max) => walker.max_pages(max),
            None => walker,
        })
    }

    /// Stream every record matching a query
    ///
    /// Translation errors are returned before any request is sent.
    pub fn query(&self, endpoint: &str, query: &Query) -> Result<RecordStream> {
        Ok(self.walker(endpoint, query)?.records())
    }

    /// Collect every record matching a query
    pub async fn collect(&self, endpoint: &str, query: &Query) -> Result<Vec<Record>> {
        self.walker(endpoint, query)?.collect().await
    }

    /// Fetch one record by id
    ///
    /// `routing` supplies the path parameters (`org_id` and so on). A 404
    /// response is `Ok(None)`.
    pub async fn find(&self, endpoint: &str, id: &str, routing: &Query) -> Result<Option<Record>> {
        let schema = self.endpoint(endpoint)?;
        let request = self.translator.detail(schema, id, routing)?;
        debug!(endpoint, id, request = %request, "Fetching record");

        let body = match self.fetcher.fetch(&request).await {
            Ok(body) => body,
            Err(e) if e.status() == Some(404) => return Ok(None),
            Err(e) => return Err(Error::page_fetch(request, e)),
        };

        let page = self.dialect.parser(schema).parse(&body, &request)?;
        Ok(page.records.into_iter().next())
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("api", &self.api)
            .field("endpoints", &self.registry.len())
            .field("dialect", &self.dialect)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}
