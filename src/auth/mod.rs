//! Authentication module
//!
//! Supports: Snyk API token, Bearer, Custom Headers
//!
//! The key is read from a mounted secret file (`SNYK_AUTH_SECRET_PATH`) or
//! from `SNYK_AUTH_KEY`, and sent as `Authorization: token <key>`.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, DEFAULT_KEY_VAR, DEFAULT_SECRET_PATH_VAR, SNYK_TOKEN_PREFIX};
