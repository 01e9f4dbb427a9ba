use std::collections::HashMap;
use std::path::Path;

use anyhow::Context as _;
use hyper::header::{AUTHORIZATION, HeaderMap};

/// Why a request was not authenticated; `Display` is the message returned to the client.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthError {
    #[error("Missing Authorization header")]
    Missing,
    #[error("Invalid Authorization header format")]
    Malformed,
    #[error("Invalid authentication token")]
    UnknownToken,
}

/// Bearer tokens accepted by the server, each mapped to the user id it authenticates.
#[derive(Clone, Debug, Default)]
pub(crate) struct TokenTable {
    users: HashMap<String, String>,
}

impl TokenTable {
    #[cfg(test)]
    pub(crate) fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            users: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Load a JSON object of `{"<token>": "<user id>"}`.
    pub(crate) fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read tokens file '{}'", path.display()))?;
        let users: HashMap<String, String> = serde_json::from_str(&raw)
            .with_context(|| format!("parse tokens file '{}'", path.display()))?;
        Ok(Self { users })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Resolve the `Authorization: Bearer <token>` header to a user id.
    pub(crate) fn authenticate(&self, headers: &HeaderMap) -> Result<&str, AuthError> {
        let value = headers.get(AUTHORIZATION).ok_or(AuthError::Missing)?;
        let value = value.to_str().map_err(|_| AuthError::Malformed)?;
        let token = match value.split(' ').collect::<Vec<_>>().as_slice() {
            ["Bearer", token] if !token.is_empty() => *token,
            _ => return Err(AuthError::Malformed),
        };
        self.users
            .get(token)
            .map(String::as_str)
            .ok_or(AuthError::UnknownToken)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/server/auth.rs"]
mod tests;
