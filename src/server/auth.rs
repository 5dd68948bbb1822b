use crate::Result;
use crate::config::AuthConfig;
use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use std::collections::HashMap;

/// Maps a bearer token to an owner id.
///
/// The server only ever needs "who is this token"; swapping in a different
/// identity backend means implementing this one method.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, token: Option<&str>) -> Result<Option<String>>;
}

/// Identity provider backed by the static token table in the config file.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    tokens: HashMap<String, String>,
}

impl StaticTokenProvider {
    #[inline]
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            tokens: config.tokens.clone(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    #[inline]
    async fn resolve(&self, token: Option<&str>) -> Result<Option<String>> {
        Ok(token.and_then(|token| self.tokens.get(token).cloned()))
    }
}

/// Extract the bearer token from an Authorization header, if present.
#[inline]
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
