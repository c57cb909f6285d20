//! Parser implementations
//!
//! One parser per API dialect: JSON:API documents for REST and the looser
//! wrapper shapes returned by v1.

use super::types::ResponseParser;
use crate::error::{Error, Result};
use crate::pagination::{NextToken, PageResult};
use crate::query::{PageRequest, PageToken};
use crate::schema::{EndpointSchema, FieldRename};
use crate::types::{ApiCasing, JsonObject, JsonValue, Record};
use std::sync::LazyLock;
use tracing::warn;
use url::Url;

/// Base used to resolve relative `links.next` values
static LINK_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://api.snyk.io/").expect("valid base url"));

/// v1 wrapper keys checked when an endpoint names none
pub const V1_WRAPPER_KEYS: &[&str] = &[
    "orgs",
    "projects",
    "snapshots",
    "members",
    "integrations",
    "results",
];

// ============================================================================
// Shared Helpers
// ============================================================================

/// Walk a dotted path through nested objects
fn lookup_path<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    path.split('.').try_fold(value, |current, key| current.get(key))
}

fn expect_object(endpoint: &str, index: usize, value: &JsonValue) -> Result<JsonObject> {
    match value {
        JsonValue::Object(map) => Ok(map.clone()),
        other => Err(Error::malformed(
            endpoint,
            format!("record {index} is not an object (got {})", type_name(other)),
        )),
    }
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

// ============================================================================
// REST Parser
// ============================================================================

/// Parser for JSON:API documents returned by the REST API
#[derive(Debug, Clone)]
pub struct RestResponseParser {
    renames: Vec<FieldRename>,
    cursor_param: String,
}

impl RestResponseParser {
    pub fn new(renames: Vec<FieldRename>, cursor_param: impl Into<String>) -> Self {
        Self {
            renames,
            cursor_param: cursor_param.into(),
        }
    }

    /// Create a parser using an endpoint's renames
    pub fn for_endpoint(endpoint: &EndpointSchema, cursor_param: impl Into<String>) -> Self {
        Self::new(endpoint.renames.clone(), cursor_param)
    }

    /// Flatten one JSON:API resource object into a record
    ///
    /// `id` and the attributes are merged, then each relationship with a
    /// `data` object adds a `<name>_id` field.
    pub fn flatten(&self, resource: &JsonObject) -> Record {
        let mut record = Record::new();
        record.insert(
            "id".to_string(),
            resource.get("id").cloned().unwrap_or(JsonValue::Null),
        );

        if let Some(JsonValue::Object(attributes)) = resource.get("attributes") {
            for (key, value) in attributes {
                record.insert(key.clone(), value.clone());
            }
        }

        if let Some(JsonValue::Object(relationships)) = resource.get("relationships") {
            for (name, relationship) in relationships {
                if let Some(JsonValue::Object(data)) = relationship.get("data") {
                    let id = data.get("id").cloned().unwrap_or(JsonValue::Null);
                    record.insert(format!("{}_id", relationship_alias(name)), id);
                }
            }
        }

        self.apply_renames(&mut record, resource);
        record
    }

    fn apply_renames(&self, record: &mut Record, resource: &JsonObject) {
        for rename in &self.renames {
            if rename.is_nested() {
                if let Some(value) = self.nested_value(record, resource, &rename.api) {
                    record.insert(rename.model.clone(), value);
                }
            } else if let Some(value) = record.remove(&rename.api) {
                record.insert(rename.model.clone(), value);
            }
        }
    }

    /// Resolve a dotted source against the record, then the relationship data
    fn nested_value(&self, record: &Record, resource: &JsonObject, path: &str) -> Option<JsonValue> {
        let (head, rest) = path.split_once('.')?;
        if let Some(value) = record.get(head).and_then(|v| lookup_path(v, rest)) {
            return Some(value.clone());
        }
        resource
            .get("relationships")
            .and_then(|r| r.get(head))
            .and_then(|r| r.get("data"))
            .and_then(|d| lookup_path(d, rest))
            .cloned()
    }

    /// Extract the cursor from `links.next`
    fn next_cursor(&self, body: &JsonValue, endpoint: &str) -> Option<String> {
        let next = body.get("links")?.get("next")?;
        let link = match next {
            JsonValue::String(s) => s.as_str(),
            JsonValue::Object(obj) => obj.get("href")?.as_str()?,
            _ => return None,
        };
        if link.is_empty() {
            return None;
        }

        let url = match LINK_BASE.join(link) {
            Ok(url) => url,
            Err(e) => {
                warn!(endpoint, link, "Ignoring unparseable next link: {e}");
                return None;
            }
        };

        url.query_pairs()
            .find(|(key, _)| key == self.cursor_param.as_str())
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }
}

fn relationship_alias(name: &str) -> &str {
    match name {
        "organization" => "org",
        other => other,
    }
}

impl ResponseParser for RestResponseParser {
    fn parse(&self, body: &JsonValue, request: &PageRequest) -> Result<PageResult> {
        let endpoint = request.endpoint.as_str();
        let Some(data) = body.get("data") else {
            return Err(Error::malformed(endpoint, "missing 'data' field"));
        };

        let records = match data {
            JsonValue::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| expect_object(endpoint, i, item).map(|r| self.flatten(&r)))
                .collect::<Result<Vec<_>>>()?,
            JsonValue::Object(resource) => vec![self.flatten(resource)],
            other => {
                return Err(Error::malformed(
                    endpoint,
                    format!("'data' is neither an array nor an object (got {})", type_name(other)),
                ))
            }
        };

        let next = match request.token {
            PageToken::Single => None,
            _ => self.next_cursor(body, endpoint).map(NextToken::Cursor),
        };

        Ok(PageResult::new(records, next))
    }
}

// ============================================================================
// V1 Parser
// ============================================================================

/// Parser for v1 responses
#[derive(Debug, Clone)]
pub struct V1ResponseParser {
    renames: Vec<FieldRename>,
    records_key: Option<String>,
    casing: ApiCasing,
}

impl V1ResponseParser {
    pub fn new(renames: Vec<FieldRename>, records_key: Option<String>, casing: ApiCasing) -> Self {
        Self {
            renames,
            records_key,
            casing,
        }
    }

    /// Create a parser using an endpoint's renames and wrapper key
    pub fn for_endpoint(endpoint: &EndpointSchema, casing: ApiCasing) -> Self {
        Self::new(
            endpoint.renames.clone(),
            endpoint.records_key.clone(),
            casing,
        )
    }

    /// Convert keys to snake_case and apply renames
    pub fn normalize(&self, raw: &JsonObject) -> Record {
        let mut record: Record = raw
            .iter()
            .map(|(key, value)| (self.casing.to_model(key), value.clone()))
            .collect();

        for rename in &self.renames {
            let value = match rename.api.split_once('.') {
                Some((head, rest)) => raw.get(head).and_then(|v| lookup_path(v, rest)).cloned(),
                None => record.remove(&rename.api),
            };
            if let Some(value) = value {
                record.insert(rename.model.clone(), value);
            }
        }

        record
    }

    /// Locate the record list, `Ok(None)` for a single-record body
    fn container<'a>(&self, body: &'a JsonValue, endpoint: &str) -> Result<Option<&'a Vec<JsonValue>>> {
        let map = match body {
            JsonValue::Array(items) => return Ok(Some(items)),
            JsonValue::Object(map) => map,
            other => {
                return Err(Error::malformed(
                    endpoint,
                    format!("expected an array or object body (got {})", type_name(other)),
                ))
            }
        };

        if let Some(key) = &self.records_key {
            return match map.get(key) {
                Some(JsonValue::Array(items)) => Ok(Some(items)),
                Some(other) => Err(Error::malformed(
                    endpoint,
                    format!("'{key}' is not an array (got {})", type_name(other)),
                )),
                None => Err(Error::malformed(endpoint, format!("missing '{key}' field"))),
            };
        }

        for key in V1_WRAPPER_KEYS {
            if let Some(JsonValue::Array(items)) = map.get(*key) {
                return Ok(Some(items));
            }
        }

        if map.len() == 1 {
            if let Some(JsonValue::Array(items)) = map.values().next() {
                return Ok(Some(items));
            }
        }

        Ok(None)
    }
}

impl ResponseParser for V1ResponseParser {
    fn parse(&self, body: &JsonValue, request: &PageRequest) -> Result<PageResult> {
        let endpoint = request.endpoint.as_str();

        let Some(items) = self.container(body, endpoint)? else {
            // Single record bodies never paginate; an empty object carries nothing
            let records = match body.as_object() {
                Some(map) if !map.is_empty() => vec![self.normalize(map)],
                _ => Vec::new(),
            };
            return Ok(PageResult::last(records));
        };

        let records = items
            .iter()
            .enumerate()
            .map(|(i, item)| expect_object(endpoint, i, item).map(|r| self.normalize(&r)))
            .collect::<Result<Vec<_>>>()?;

        // A short page is the last one
        let next = match request.token.page_size() {
            Some(size) if size > 0 && records.len() >= size as usize => Some(NextToken::Advance),
            _ => None,
        };

        Ok(PageResult::new(records, next))
    }
}
