//! HTTP transport
//!
//! [`HttpClient`] is the production [`PageFetcher`](crate::pagination::PageFetcher)
//! for both backends: auth headers, the REST `version` parameter, retries
//! with backoff and a governor rate limit.

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig};
pub use rate_limit::RateLimiter;
