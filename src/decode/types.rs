//! Parser traits
//!
//! Defines the core response parsing abstraction.

use crate::error::Result;
use crate::pagination::PageResult;
use crate::query::PageRequest;
use crate::types::JsonValue;

/// Trait for turning a response body into records and a next-page indicator
pub trait ResponseParser: Send + Sync {
    /// Parse the body returned for `request`
    fn parse(&self, body: &JsonValue, request: &PageRequest) -> Result<PageResult>;
}
