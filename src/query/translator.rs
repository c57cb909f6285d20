//! Query translators
//!
//! Turn a caller [`Query`] into the first [`PageRequest`] for an endpoint.
//! Translation is pure: the same endpoint and query always produce the
//! same request, independent of the order filters were added in.

use super::request::{PageRequest, PageToken};
use super::types::{FilterCondition, FilterOperator, Query, SortDirection, SortSpec};
use crate::config::{RestConfig, V1Config, V1Pagination};
use crate::error::{Error, Result};
use crate::schema::{ApiKind, EndpointSchema};
use crate::types::ApiCasing;

/// Trait for translating queries into page requests
pub trait QueryTranslator: Send + Sync {
    /// The API this translator targets
    fn api(&self) -> ApiKind;

    /// Build the first page request for a list query
    fn translate(&self, endpoint: &EndpointSchema, query: &Query) -> Result<PageRequest>;

    /// Build a one-shot request for `<path>/<id>`
    fn detail(&self, endpoint: &EndpointSchema, id: &str, query: &Query) -> Result<PageRequest> {
        ensure_api(endpoint, self.api())?;
        let path = resolve_routing(endpoint, query, self.api())?;
        let path = endpoint.detail_path(&path, id)?;
        Ok(PageRequest::new(
            &endpoint.name,
            path,
            Vec::new(),
            PageToken::Single,
        ))
    }
}

// ============================================================================
// Shared Helpers
// ============================================================================

fn ensure_api(endpoint: &EndpointSchema, api: ApiKind) -> Result<()> {
    if endpoint.api == api {
        Ok(())
    } else {
        Err(Error::config(format!(
            "Endpoint '{}' belongs to the {} API, not {}",
            endpoint.name, endpoint.api, api
        )))
    }
}

/// Reject filters on unknown fields or with operators the field does not allow
fn check_filter(endpoint: &EndpointSchema, condition: &FilterCondition, api: ApiKind) -> Result<()> {
    let Some(field) = endpoint.get_field(&condition.field) else {
        return Err(Error::unsupported_filter(
            &endpoint.name,
            &condition.field,
            "unknown field",
        ));
    };

    if !field.searchable {
        return Err(Error::unsupported_filter(
            &endpoint.name,
            &condition.field,
            "field is not searchable",
        ));
    }

    if !field.allows(condition.operator, api) {
        return Err(Error::unsupported_filter(
            &endpoint.name,
            &condition.field,
            format!(
                "operator '{}' is not supported on the {} API for this field",
                condition.operator, api
            ),
        ));
    }

    Ok(())
}

fn resolve_routing(endpoint: &EndpointSchema, query: &Query, api: ApiKind) -> Result<String> {
    for parameter in endpoint.routing_parameters() {
        if let Some(condition) = query
            .filters
            .iter()
            .find(|c| c.field == parameter && c.value.as_single().is_some())
        {
            check_filter(endpoint, condition, api)?;
        }
    }
    endpoint.resolve_path(|name| query.equality(name))
}

/// Validated filters that become query parameters, in (field, operator) order
fn query_filters<'q>(
    endpoint: &EndpointSchema,
    query: &'q Query,
    api: ApiKind,
) -> Result<Vec<&'q FilterCondition>> {
    let mut filters = Vec::with_capacity(query.filters.len());
    for condition in &query.filters {
        check_filter(endpoint, condition, api)?;
        let routed = endpoint.is_routing_parameter(&condition.field)
            && condition.operator == FilterOperator::Equals;
        if !routed {
            filters.push(condition);
        }
    }
    filters.sort_by(|a, b| (&a.field, a.operator).cmp(&(&b.field, b.operator)));
    Ok(filters)
}

fn resolve_sort<'a>(endpoint: &'a EndpointSchema, query: &'a Query) -> Result<Option<&'a SortSpec>> {
    let Some(sort) = query.sort.as_ref().or(endpoint.default_sort.as_ref()) else {
        return Ok(None);
    };

    match endpoint.get_field(&sort.field) {
        Some(field) if !field.temporary => Ok(Some(sort)),
        _ => Err(Error::unsupported_filter(
            &endpoint.name,
            &sort.field,
            "unknown sort field",
        )),
    }
}

/// Requested size, falling back to the default for `None` or 0, capped at `max`
pub fn resolve_page_size(requested: Option<u32>, default: u32, max: u32) -> u32 {
    match requested {
        None | Some(0) => default.min(max),
        Some(size) => size.min(max),
    }
}

// ============================================================================
// REST Translator
// ============================================================================

/// Translator for the JSON:API REST endpoints
#[derive(Debug, Clone)]
pub struct RestTranslator {
    cursor_param: String,
    limit_param: String,
    default_page_size: u32,
    max_page_size: u32,
}

impl RestTranslator {
    pub fn new(config: &RestConfig) -> Self {
        Self {
            cursor_param: config.pagination_parameter_name.clone(),
            limit_param: config.limit_parameter_name.clone(),
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }
}

impl Default for RestTranslator {
    fn default() -> Self {
        Self::new(&RestConfig::default())
    }
}

impl QueryTranslator for RestTranslator {
    fn api(&self) -> ApiKind {
        ApiKind::Rest
    }

    fn translate(&self, endpoint: &EndpointSchema, query: &Query) -> Result<PageRequest> {
        ensure_api(endpoint, ApiKind::Rest)?;
        let path = resolve_routing(endpoint, query, ApiKind::Rest)?;

        let mut params: Vec<(String, String)> = query_filters(endpoint, query, ApiKind::Rest)?
            .into_iter()
            .map(|c| {
                let name = endpoint.api_field_name(&c.field);
                let key = match c.operator.rest_suffix() {
                    Some(suffix) => format!("filter[{name}][{suffix}]"),
                    None => format!("filter[{name}]"),
                };
                (key, c.value.render())
            })
            .collect();

        if let Some(sort) = resolve_sort(endpoint, query)? {
            let name = endpoint.api_field_name(&sort.field);
            let value = match sort.direction {
                SortDirection::Asc => name.to_string(),
                SortDirection::Desc => format!("-{name}"),
            };
            params.push(("sort".to_string(), value));
        }

        let token = PageToken::Cursor {
            cursor_param: self.cursor_param.clone(),
            limit_param: self.limit_param.clone(),
            limit: resolve_page_size(query.page_size, self.default_page_size, self.max_page_size),
            cursor: None,
        };

        Ok(PageRequest::new(&endpoint.name, path, params, token))
    }
}

// ============================================================================
// V1 Translator
// ============================================================================

/// Translator for the legacy v1 endpoints
#[derive(Debug, Clone)]
pub struct V1Translator {
    pagination: V1Pagination,
    page_param: String,
    offset_param: String,
    limit_param: String,
    sort_param: String,
    order_param: String,
    casing: ApiCasing,
    default_page_size: u32,
    max_page_size: u32,
}

impl V1Translator {
    pub fn new(config: &V1Config) -> Self {
        Self {
            pagination: config.pagination,
            page_param: config.pagination_parameter_name.clone(),
            offset_param: config.offset_parameter_name.clone(),
            limit_param: config.limit_parameter_name.clone(),
            sort_param: config.sort_parameter_name.clone(),
            order_param: config.order_parameter_name.clone(),
            casing: config.api_casing,
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }
}

impl Default for V1Translator {
    fn default() -> Self {
        Self::new(&V1Config::default())
    }
}

impl QueryTranslator for V1Translator {
    fn api(&self) -> ApiKind {
        ApiKind::V1
    }

    fn translate(&self, endpoint: &EndpointSchema, query: &Query) -> Result<PageRequest> {
        ensure_api(endpoint, ApiKind::V1)?;
        let path = resolve_routing(endpoint, query, ApiKind::V1)?;

        let mut params: Vec<(String, String)> = query_filters(endpoint, query, ApiKind::V1)?
            .into_iter()
            .map(|c| {
                let name = self.casing.to_api(endpoint.api_field_name(&c.field));
                (name, c.value.render())
            })
            .collect();

        if let Some(sort) = resolve_sort(endpoint, query)? {
            let name = self.casing.to_api(endpoint.api_field_name(&sort.field));
            params.push((self.sort_param.clone(), name));
            params.push((
                self.order_param.clone(),
                sort.direction.as_str().to_string(),
            ));
        }

        let size = resolve_page_size(query.page_size, self.default_page_size, self.max_page_size);
        let token = match self.pagination {
            V1Pagination::Page => PageToken::PageNumber {
                page_param: self.page_param.clone(),
                per_page_param: self.limit_param.clone(),
                page: 1,
                per_page: size,
            },
            V1Pagination::Offset => PageToken::Offset {
                offset_param: self.offset_param.clone(),
                limit_param: self.limit_param.clone(),
                offset: 0,
                limit: size,
            },
        };

        Ok(PageRequest::new(&endpoint.name, path, params, token))
    }
}
