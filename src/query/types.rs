//! Query types: filters, sorting and the caller-facing query builder

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static IN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([a-z_][a-z0-9_]*)\s+in\s*\((.*)\)\s*$").expect("valid regex")
});

static LIKE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([a-z_][a-z0-9_]*)\s+like\s+(.+?)\s*$").expect("valid regex")
});

static COMPARE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*(>=|<=|!=|==|=|>|<)\s*(.*?)\s*$").expect("valid regex")
});

// ============================================================================
// Filters
// ============================================================================

/// Comparison applied by a filter condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    In,
    GreaterThan,
    LessThan,
    Contains,
}

impl FilterOperator {
    /// Suffix used in REST `filter[field][suffix]` keys
    pub fn rest_suffix(self) -> Option<&'static str> {
        match self {
            FilterOperator::Equals | FilterOperator::In => None,
            FilterOperator::GreaterThan => Some("gt"),
            FilterOperator::LessThan => Some("lt"),
            FilterOperator::Contains => Some("contains"),
        }
    }
}

impl std::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterOperator::Equals => write!(f, "="),
            FilterOperator::In => write!(f, "IN"),
            FilterOperator::GreaterThan => write!(f, ">"),
            FilterOperator::LessThan => write!(f, "<"),
            FilterOperator::Contains => write!(f, "LIKE"),
        }
    }
}

/// Value side of a filter condition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Single(String),
    List(Vec<String>),
}

impl FilterValue {
    /// Render as a single query parameter value, lists comma-joined
    pub fn render(&self) -> String {
        match self {
            FilterValue::Single(v) => v.clone(),
            FilterValue::List(values) => values.join(","),
        }
    }

    /// The value if it is a single value
    pub fn as_single(&self) -> Option<&str> {
        match self {
            FilterValue::Single(v) => Some(v.as_str()),
            FilterValue::List(_) => None,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Single(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Single(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        FilterValue::List(values)
    }
}

/// A single `field <op> value` condition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterCondition {
    pub field: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl FilterCondition {
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Equals, FilterValue::Single(value.into()))
    }

    pub fn one_of<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        Self::new(field, FilterOperator::In, FilterValue::List(values))
    }

    /// Parse a condition string
    ///
    /// Accepts `field=value`, `field>value`, `field<value`,
    /// `field IN (a, b)` and `field LIKE value`.
    pub fn parse(condition: &str) -> Result<Self> {
        if let Some(caps) = IN_REGEX.captures(condition) {
            let values: Vec<String> = caps[2]
                .split(',')
                .map(|v| strip_quotes(v.trim()).to_string())
                .filter(|v| !v.is_empty())
                .collect();
            if values.is_empty() {
                return Err(Error::invalid_value(
                    "condition",
                    format!("empty IN list in '{condition}'"),
                ));
            }
            return Ok(Self::new(&caps[1], FilterOperator::In, FilterValue::List(values)));
        }

        if let Some(caps) = LIKE_REGEX.captures(condition) {
            let value = strip_quotes(&caps[2]).trim_matches('%');
            return Ok(Self::new(&caps[1], FilterOperator::Contains, value));
        }

        if let Some(caps) = COMPARE_REGEX.captures(condition) {
            let operator = match &caps[2] {
                "=" => FilterOperator::Equals,
                ">" => FilterOperator::GreaterThan,
                "<" => FilterOperator::LessThan,
                other => {
                    return Err(Error::invalid_value(
                        "condition",
                        format!("unsupported operator '{other}' in '{condition}'"),
                    ))
                }
            };
            return Ok(Self::new(&caps[1], operator, strip_quotes(&caps[3])));
        }

        Err(Error::invalid_value(
            "condition",
            format!("cannot parse '{condition}'"),
        ))
    }
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

// ============================================================================
// Sorting
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort on a single field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// Parse `name`, `name desc` or `-name`
    pub fn parse(sort: &str) -> Result<Self> {
        let sort = sort.trim();
        if let Some(field) = sort.strip_prefix('-') {
            return Ok(Self::desc(field.trim()));
        }

        let mut parts = sort.split_whitespace();
        let field = parts
            .next()
            .ok_or_else(|| Error::invalid_value("sort", "must not be empty"))?;
        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(other) => {
                return Err(Error::invalid_value(
                    "sort",
                    format!("unknown direction '{other}'"),
                ))
            }
        };
        if parts.next().is_some() {
            return Err(Error::invalid_value("sort", format!("cannot parse '{sort}'")));
        }

        Ok(Self::new(field, direction))
    }
}

// ============================================================================
// Query
// ============================================================================

/// A read query against one endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Filter conditions, at most one per (field, operator)
    pub filters: Vec<FilterCondition>,
    /// Optional sort
    pub sort: Option<SortSpec>,
    /// Requested page size, `None` or 0 for the configured default
    pub page_size: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition, replacing one with the same field and operator
    #[must_use]
    pub fn filter(mut self, condition: FilterCondition) -> Self {
        self.filters
            .retain(|c| !(c.field == condition.field && c.operator == condition.operator));
        self.filters.push(condition);
        self
    }

    /// Add an equality condition
    #[must_use]
    pub fn where_eq(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(FilterCondition::equals(field, value))
    }

    /// Add an IN condition
    #[must_use]
    pub fn where_in<I, S>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter(FilterCondition::one_of(field, values))
    }

    /// Add a condition given as a string, see [`FilterCondition::parse`]
    pub fn where_str(self, condition: &str) -> Result<Self> {
        Ok(self.filter(FilterCondition::parse(condition)?))
    }

    #[must_use]
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Value of the equality filter on `field`, if any
    pub fn equality(&self, field: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|c| c.field == field && c.operator == FilterOperator::Equals)
            .and_then(|c| c.value.as_single())
    }
}
