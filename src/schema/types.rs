//! Endpoint schema types

use crate::error::{Error, Result};
use crate::query::{FilterOperator, SortSpec};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Matches `{name}` routing placeholders in endpoint paths
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("valid regex"));

/// Percent-encode `value` as one URL path segment
///
/// Empty values and dot segments cannot name a resource and are rejected.
fn path_segment(endpoint: &str, field: &str, value: &str) -> Result<String> {
    if matches!(value, "" | "." | "..") {
        return Err(Error::unsupported_filter(
            endpoint,
            field,
            format!("'{value}' is not a valid path segment"),
        ));
    }
    // form encoding writes spaces as '+', which a path would keep literally
    let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
    Ok(encoded.replace('+', "%20"))
}

/// Which Snyk API an endpoint belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKind {
    /// JSON:API, cursor paginated
    #[default]
    Rest,
    /// Legacy v1, page or offset paginated
    V1,
}

impl std::fmt::Display for ApiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiKind::Rest => write!(f, "rest"),
            ApiKind::V1 => write!(f, "v1"),
        }
    }
}

/// Value kind of an endpoint field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    String,
    Integer,
    Boolean,
    Datetime,
    Json,
    Email,
    /// One of a fixed set of values
    Select { values: Vec<String> },
    /// Identifier of a record on another endpoint
    BelongsTo { endpoint: String },
}

/// A field exposed by an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Model field name (snake_case)
    pub name: String,

    #[serde(default)]
    pub kind: FieldKind,

    /// Field may be used in filters
    #[serde(default)]
    pub searchable: bool,

    /// Field is accepted as a filter but never present in records
    #[serde(default)]
    pub temporary: bool,

    /// Field accepts range (gt/lt) and contains filters on the REST API
    #[serde(default)]
    pub range: bool,
}

impl FieldSpec {
    /// Create a field of the given kind
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            searchable: false,
            temporary: false,
            range: false,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Datetime)
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Json)
    }

    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Email)
    }

    pub fn select(name: impl Into<String>, values: &[&str]) -> Self {
        Self::new(
            name,
            FieldKind::Select {
                values: values.iter().map(|v| (*v).to_string()).collect(),
            },
        )
    }

    pub fn belongs_to(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::BelongsTo {
                endpoint: endpoint.into(),
            },
        )
    }

    /// Mark the field as filterable
    #[must_use]
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Mark the field as filter-only
    #[must_use]
    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    /// Allow range and contains operators on this field
    #[must_use]
    pub fn range(mut self) -> Self {
        self.range = true;
        self
    }

    /// Check whether a filter operator is valid for this field on the given API
    pub fn allows(&self, operator: FilterOperator, api: ApiKind) -> bool {
        if !self.searchable {
            return false;
        }

        match (api, operator) {
            (ApiKind::V1, FilterOperator::Equals) => true,
            (ApiKind::V1, _) => false,
            (ApiKind::Rest, FilterOperator::Equals | FilterOperator::In) => true,
            (ApiKind::Rest, FilterOperator::GreaterThan | FilterOperator::LessThan) => self.range,
            (ApiKind::Rest, FilterOperator::Contains) => {
                self.range && matches!(self.kind, FieldKind::String | FieldKind::Email)
            }
        }
    }
}

/// Maps an API field name to a model field name
///
/// A dotted `api` name (`scan_item.type`) addresses a nested value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRename {
    pub api: String,
    pub model: String,
}

impl FieldRename {
    pub fn new(api: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            model: model.into(),
        }
    }

    /// Whether the API side addresses a nested value
    pub fn is_nested(&self) -> bool {
        self.api.contains('.')
    }
}

fn default_id_field() -> String {
    "id".to_string()
}

/// Metadata for a single queryable endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSchema {
    /// Registry name of the endpoint
    pub name: String,

    #[serde(default)]
    pub api: ApiKind,

    /// Path relative to the API base URL, may contain `{field}` placeholders
    pub path: String,

    #[serde(default = "default_id_field")]
    pub id_field: String,

    #[serde(default)]
    pub fields: Vec<FieldSpec>,

    #[serde(default)]
    pub renames: Vec<FieldRename>,

    /// v1 wrapper key holding the record list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_key: Option<String>,

    /// Sort applied when the query carries none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sort: Option<SortSpec>,
}

impl EndpointSchema {
    /// Create an endpoint with only an `id` field
    pub fn new(name: impl Into<String>, api: ApiKind, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api,
            path: path.into(),
            id_field: default_id_field(),
            fields: Vec::new(),
            renames: Vec::new(),
            records_key: None,
            default_sort: None,
        }
    }

    /// Create a REST endpoint
    pub fn rest(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, ApiKind::Rest, path)
    }

    /// Create a v1 endpoint
    pub fn v1(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, ApiKind::V1, path)
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(fields);
        self
    }

    #[must_use]
    pub fn with_rename(mut self, api: impl Into<String>, model: impl Into<String>) -> Self {
        self.renames.push(FieldRename::new(api, model));
        self
    }

    #[must_use]
    pub fn with_records_key(mut self, key: impl Into<String>) -> Self {
        self.records_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    #[must_use]
    pub fn with_default_sort(mut self, sort: SortSpec) -> Self {
        self.default_sort = Some(sort);
        self
    }

    /// Look up a field by model name
    pub fn get_field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of the `{placeholder}` routing parameters in path order
    pub fn routing_parameters(&self) -> Vec<&str> {
        PLACEHOLDER_REGEX
            .captures_iter(&self.path)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Whether a field is consumed by path routing
    pub fn is_routing_parameter(&self, name: &str) -> bool {
        self.routing_parameters().contains(&name)
    }

    /// Substitute routing values into the path
    ///
    /// `lookup` returns the value for a placeholder, or `None` when the
    /// caller supplied no equality filter for it. Each value is encoded as
    /// a single path segment.
    pub fn resolve_path<'a, F>(&self, mut lookup: F) -> Result<String>
    where
        F: FnMut(&str) -> Option<&'a str>,
    {
        let mut failure = None;
        let resolved = PLACEHOLDER_REGEX.replace_all(&self.path, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            let Some(value) = lookup(name) else {
                failure.get_or_insert_with(|| Error::missing_routing(&self.name, name));
                return String::new();
            };
            match path_segment(&self.name, name, value) {
                Ok(segment) => segment,
                Err(e) => {
                    failure.get_or_insert(e);
                    String::new()
                }
            }
        });

        match failure {
            Some(err) => Err(err),
            None => Ok(resolved.into_owned()),
        }
    }

    /// Path of the single resource `id` below the resolved list path
    pub fn detail_path(&self, list_path: &str, id: &str) -> Result<String> {
        let segment = path_segment(&self.name, &self.id_field, id)?;
        Ok(format!("{}/{}", list_path.trim_end_matches('/'), segment))
    }

    /// Name a model field is sent under, reversing top-level renames
    pub fn api_field_name<'a>(&'a self, model: &'a str) -> &'a str {
        self.renames
            .iter()
            .find(|r| r.model == model && !r.is_nested())
            .map_or(model, |r| r.api.as_str())
    }

    /// Check the endpoint definition is well formed
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_value("endpoints.name", "must not be empty"));
        }
        if self.path.trim().is_empty() {
            return Err(Error::invalid_value(
                format!("endpoints.{}.path", self.name),
                "must not be empty",
            ));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(Error::invalid_value(
                    format!("endpoints.{}.fields", self.name),
                    format!("duplicate field '{}'", field.name),
                ));
            }
        }

        for parameter in self.routing_parameters() {
            if self.get_field(parameter).is_none() {
                return Err(Error::invalid_value(
                    format!("endpoints.{}.path", self.name),
                    format!("placeholder '{{{parameter}}}' is not a declared field"),
                ));
            }
        }

        if let Some(sort) = &self.default_sort {
            if self.get_field(&sort.field).is_none() {
                return Err(Error::invalid_value(
                    format!("endpoints.{}.default_sort", self.name),
                    format!("unknown field '{}'", sort.field),
                ));
            }
        }

        Ok(())
    }
}
