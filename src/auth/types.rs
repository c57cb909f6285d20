//! Auth configuration types
//!
//! These types represent the runtime auth configuration, after the key has
//! been read from wherever it lives.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::fs;

/// Variable naming a mounted secret file holding the API key
pub const DEFAULT_SECRET_PATH_VAR: &str = "SNYK_AUTH_SECRET_PATH";

/// Variable holding the API key itself
pub const DEFAULT_KEY_VAR: &str = "SNYK_AUTH_KEY";

/// Prefix Snyk expects in front of API keys
pub const SNYK_TOKEN_PREFIX: &str = "token ";

/// Authentication configuration
#[derive(Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// `Authorization: <prefix><value>`
    Token {
        /// The API key
        value: String,
        /// Prefix placed before the key (`token ` for Snyk)
        prefix: String,
    },

    /// Bearer token authentication
    Bearer {
        /// The bearer token
        token: String,
    },

    /// Custom headers
    CustomHeaders {
        /// Headers to add to each request
        headers: HashMap<String, String>,
    },
}

impl AuthConfig {
    /// Token auth with an explicit prefix
    pub fn token(value: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::Token {
            value: value.into(),
            prefix: prefix.into(),
        }
    }

    /// Token auth with the Snyk `token ` prefix
    pub fn snyk_token(value: impl Into<String>) -> Self {
        Self::token(value, SNYK_TOKEN_PREFIX)
    }

    /// Read the API key from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(
            |name| std::env::var(name).ok(),
            DEFAULT_SECRET_PATH_VAR,
            DEFAULT_KEY_VAR,
            SNYK_TOKEN_PREFIX,
        )
    }

    /// Read the API key through `lookup`
    ///
    /// `secret_path_var` wins when set: the file it names is read and its
    /// trimmed content used as the key. Otherwise `key_var` holds the key.
    pub fn from_lookup<F>(
        lookup: F,
        secret_path_var: &str,
        key_var: &str,
        prefix: &str,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(secret_path_var).filter(|p| !p.trim().is_empty()) {
            let content = fs::read_to_string(path.trim()).map_err(|e| {
                Error::auth(format!("Failed to read secret file '{}': {e}", path.trim()))
            })?;
            let key = content.trim();
            if key.is_empty() {
                return Err(Error::auth(format!("Secret file '{}' is empty", path.trim())));
            }
            return Ok(Self::token(key, prefix));
        }

        match lookup(key_var).filter(|k| !k.trim().is_empty()) {
            Some(key) => Ok(Self::token(key.trim(), prefix)),
            None => Err(Error::missing_field(key_var)),
        }
    }

    /// The `Authorization` value, if this auth uses one
    pub fn authorization(&self) -> Option<String> {
        match self {
            AuthConfig::Token { value, prefix } => Some(format!("{prefix}{value}")),
            AuthConfig::Bearer { token } => Some(format!("Bearer {token}")),
            AuthConfig::None | AuthConfig::CustomHeaders { .. } => None,
        }
    }
}

// Keys never reach logs
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthConfig::None => f.write_str("None"),
            AuthConfig::Token { prefix, .. } => f
                .debug_struct("Token")
                .field("prefix", prefix)
                .field("value", &"<redacted>")
                .finish(),
            AuthConfig::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
            AuthConfig::CustomHeaders { headers } => {
                let mut names: Vec<&String> = headers.keys().collect();
                names.sort();
                f.debug_struct("CustomHeaders")
                    .field("headers", &names)
                    .finish()
            }
        }
    }
}
