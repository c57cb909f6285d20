// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # snyk-source
//!
//! Query the Snyk REST and v1 APIs as lazily paginated record sources.
//!
//! ## Features
//!
//! - **Query Translation**: filters, sort and page size become REST
//!   `filter[...]` parameters or v1 query parameters
//! - **Page Walking**: cursor (REST) and page/offset (v1) traversal, one
//!   request in flight, stopping on the last page
//! - **Response Parsing**: JSON:API resources flattened into records, v1
//!   wrapper shapes unwrapped, field renames applied
//! - **Endpoint Registry**: built-in Snyk endpoints, extensible from YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use snyk_source::{AuthConfig, Backend, Query, SourceConfig};
//!
//! #[tokio::main]
//! async fn main() -> snyk_source::Result<()> {
//!     let backend = Backend::rest(&SourceConfig::default(), AuthConfig::from_env()?)?;
//!
//!     let query = Query::new().where_eq("org_id", "abc123").page_size(50);
//!     let mut projects = backend.query("projects", &query)?;
//!     while let Some(project) = projects.try_next().await? {
//!         println!("{}", project["name"]);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            Backend                              │
//! │  translate() → PageRequest   query() → Stream<Record>   find()  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌───────────┬──────────────┬───┴──────────┬───────────┬──────────┐
//! │  Schema   │    Query     │  Pagination  │  Decode   │   HTTP   │
//! ├───────────┼──────────────┼──────────────┼───────────┼──────────┤
//! │ Endpoints │ REST filter[]│ Cursor       │ JSON:API  │ Retry    │
//! │ Fields    │ v1 params    │ Page number  │ v1 shapes │ Rate lim.│
//! │ Renames   │ Sort, size   │ Offset       │ Renames   │ Auth     │
//! └───────────┴──────────────┴──────────────┴───────────┴──────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Endpoint schemas and the registry
pub mod schema;

/// Queries, page requests and translators
pub mod query;

/// Page walking
pub mod pagination;

/// Response parsers
pub mod decode;

/// Configuration loading
pub mod config;

/// Backends tying the pieces together
pub mod backend;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use auth::AuthConfig;
pub use backend::Backend;
pub use config::{load_config, load_config_from_str, SourceConfig};
pub use pagination::{PageWalker, RecordStream};
pub use query::{FilterCondition, FilterOperator, PageRequest, Query, SortSpec};
pub use schema::{ApiKind, EndpointSchema, Registry};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
