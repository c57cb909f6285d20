//! Common types used throughout snyk-source
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// A flattened record: model field name to value
pub type Record = JsonObject;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

// ============================================================================
// API Casing
// ============================================================================

/// Field name casing used on the wire by an API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiCasing {
    /// `org_id`
    SnakeCase,
    /// `orgId`
    #[default]
    CamelCase,
    /// `OrgId`
    TitleCase,
}

impl ApiCasing {
    /// Convert a snake_case model name to this casing
    pub fn to_api(self, name: &str) -> String {
        match self {
            ApiCasing::SnakeCase => name.to_string(),
            ApiCasing::CamelCase => name.to_case(Case::Camel),
            ApiCasing::TitleCase => name.to_case(Case::Pascal),
        }
    }

    /// Convert a name in this casing back to snake_case
    pub fn to_model(self, name: &str) -> String {
        match self {
            ApiCasing::SnakeCase => name.to_string(),
            ApiCasing::CamelCase | ApiCasing::TitleCase => name.to_case(Case::Snake),
        }
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}
