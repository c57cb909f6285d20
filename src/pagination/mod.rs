//! Pagination module
//!
//! Supports: Cursor (REST), Page Number and Offset (v1)
//!
//! # Overview
//!
//! A [`PageWalker`] turns an initial [`crate::query::PageRequest`] into a
//! lazy stream of records. Each step fetches one page through a
//! [`PageFetcher`], hands the body to a [`crate::decode::ResponseParser`]
//! and derives the next request from the returned [`NextToken`].
//!
//! A walk ends when the parser reports no next page, when a page carries
//! zero records, or when the next request would repeat one already issued.

mod types;
mod walker;

pub use types::{NextToken, PageFetcher, PageResult};
pub use walker::{PageStream, PageWalker, RecordStream};

#[cfg(test)]
mod tests;
