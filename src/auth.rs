//! # Authentication
//!
//! Token providers resolve the current session's bearer token at request time.
//! The loader never caches a token across pages, so a provider may refresh or
//! drop its token between requests.

use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while resolving a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no signed-in session")]
    NoSession,
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Source of the id token attached to every page request
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Resolve the token for the request about to be sent.
    async fn current_token(&self) -> Result<String, AuthError>;
}

/// Provider holding a fixed token, or none
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Provider that always reports a missing session
    pub fn signed_out() -> Self {
        Self { token: None }
    }

    pub fn from_option(token: Option<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn current_token(&self) -> Result<String, AuthError> {
        non_blank(self.token.as_deref())
    }
}

/// Provider backed by a swappable session token.
///
/// Models an identity session that may be refreshed or signed out while a
/// list is being paged.
#[derive(Debug, Default)]
pub struct SessionTokenProvider {
    token: RwLock<Option<String>>,
}

impl SessionTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token<S: Into<String>>(token: S) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    /// Replace the session token (sign-in or refresh)
    pub fn set_token<S: Into<String>>(&self, token: S) {
        let mut guard = self
            .token
            .write()
            .unwrap_or_else(|poison| poison.into_inner());
        *guard = Some(token.into());
    }

    /// Drop the session token (sign-out)
    pub fn clear(&self) {
        let mut guard = self
            .token
            .write()
            .unwrap_or_else(|poison| poison.into_inner());
        *guard = None;
    }
}

#[async_trait]
impl TokenProvider for SessionTokenProvider {
    async fn current_token(&self) -> Result<String, AuthError> {
        let guard = self
            .token
            .read()
            .map_err(|_| AuthError::Provider("session lock poisoned".to_string()))?;
        non_blank(guard.as_deref())
    }
}

/// Format an `Authorization` header value for a token
pub fn bearer_header(token: &str) -> String {
    format!("Bearer {}", token)
}

fn non_blank(token: Option<&str>) -> Result<String, AuthError> {
    match token.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(AuthError::NoSession),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticTokenProvider::new("abc");
        assert_eq!(provider.current_token().await.unwrap(), "abc");

        let provider = StaticTokenProvider::signed_out();
        assert_eq!(provider.current_token().await, Err(AuthError::NoSession));
    }

    #[tokio::test]
    async fn test_blank_token_is_no_session() {
        let provider = StaticTokenProvider::from_option(Some("   ".to_string()));
        assert_eq!(provider.current_token().await, Err(AuthError::NoSession));
    }

    #[tokio::test]
    async fn test_session_provider_swaps_token() {
        let provider = SessionTokenProvider::new();
        assert_eq!(provider.current_token().await, Err(AuthError::NoSession));

        provider.set_token("first");
        assert_eq!(provider.current_token().await.unwrap(), "first");

        provider.set_token("refreshed");
        assert_eq!(provider.current_token().await.unwrap(), "refreshed");

        provider.clear();
        assert_eq!(provider.current_token().await, Err(AuthError::NoSession));
    }

    #[test]
    fn test_bearer_header() {
        assert_eq!(bearer_header("tkn"), "Bearer tkn");
    }
}
