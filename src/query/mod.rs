//! Query translation module
//!
//! Converts caller queries (filters, sort, page size) into API-specific
//! page requests.
//!
//! # Translation
//!
//! | Query            | REST                        | v1                         |
//! |------------------|-----------------------------|----------------------------|
//! | `org_id = x`     | `filter[org_id]=x`          | `orgId=x`                  |
//! | `type IN (a, b)` | `filter[type]=a,b`          | rejected                   |
//! | `created > t`    | `filter[created][gt]=t`     | rejected                   |
//! | sort `name desc` | `sort=-name`                | `sortBy=name&order=desc`   |
//! | page size 50     | `limit=50`                  | `page=1&perPage=50`        |
//!
//! Fields named by `{placeholder}` path segments are substituted into the
//! path and never sent as query parameters.

mod request;
mod translator;
mod types;

pub use request::{PageRequest, PageToken};
pub use translator::{resolve_page_size, QueryTranslator, RestTranslator, V1Translator};
pub use types::{FilterCondition, FilterOperator, FilterValue, Query, SortDirection, SortSpec};
