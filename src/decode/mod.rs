//! Response parser module
//!
//! Supports: JSON:API (REST), v1 wrapper shapes
//!
//! # Overview
//!
//! A parser extracts the records of one page from a response body, maps
//! them onto model field names and reports whether another page exists.
//!
//! - REST records are flattened from JSON:API resources: `id`, the
//!   attributes and one `<relationship>_id` per relationship. The next
//!   cursor is read from `links.next`.
//! - v1 records come from a top-level array or a wrapper key, keys are
//!   converted to snake_case, and a full page implies another one.

mod parsers;
mod types;

pub use parsers::{RestResponseParser, V1ResponseParser, V1_WRAPPER_KEYS};
pub use types::ResponseParser;
