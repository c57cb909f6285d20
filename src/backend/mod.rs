//! Backends
//!
//! A [`Backend`] serves the endpoints of one Snyk API. It looks the
//! endpoint up in the registry, translates the query, and walks the pages
//! through the HTTP client with the matching response parser.
//!
//! ```rust,ignore
//! use snyk_source::{AuthConfig, Backend, Query, SourceConfig};
//!
//! let backend = Backend::rest(&SourceConfig::default(), AuthConfig::from_env()?)?;
//! let query = Query::new().where_eq("org_id", "abc123").page_size(2);
//! let projects = backend.collect("projects", &query).await?;
//! ```

#[allow(clippy::module_inception)]
mod backend;

pub use backend::Backend;

#[cfg(test)]
mod tests;
