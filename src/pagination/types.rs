//! Pagination types and traits
//!
//! Defines the abstractions shared by the walker, the parsers and the
//! HTTP transport.

use crate::error::Result;
use crate::query::PageRequest;
use crate::types::{JsonValue, Record};
use async_trait::async_trait;

/// Indicator that another page exists
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NextToken {
    /// Cursor to send with the next request
    Cursor(String),
    /// Move to the following page or offset
    Advance,
}

/// Records of one page plus the next-page indicator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
    /// Records in API order
    pub records: Vec<Record>,
    /// `None` on the last page
    pub next: Option<NextToken>,
}

impl PageResult {
    /// Create a result for a page with more pages after it
    pub fn new(records: Vec<Record>, next: Option<NextToken>) -> Self {
        Self { records, next }
    }

    /// Create a result for the last page
    pub fn last(records: Vec<Record>) -> Self {
        Self {
            records,
            next: None,
        }
    }

    /// Check if another page is indicated
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Number of records on this page
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the page carried no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Transport seam: fetch the body for one page request
///
/// Implementations own timeouts, retries and rate limiting. Bodies that
/// are empty should be returned as an empty JSON object.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request: &PageRequest) -> Result<JsonValue>;
}
