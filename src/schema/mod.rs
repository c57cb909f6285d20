//! Endpoint schema module
//!
//! Describes the endpoints a backend can query: their path, the fields
//! they expose, which fields can be filtered and how API field names
//! map onto model field names.
//!
//! # Features
//!
//! - **Routing Parameters**: `{org_id}` style placeholders resolved from equality filters
//! - **Field Metadata**: kind, searchable, filter-only and range flags
//! - **Renames**: API to model field names, including nested sources
//! - **Registry**: built-in Snyk catalogue plus runtime registration

mod registry;
mod types;

pub use registry::{Registry, BUILTIN_ENDPOINTS};
pub use types::{ApiKind, EndpointSchema, FieldKind, FieldRename, FieldSpec};
