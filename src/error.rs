//! # Error Handling
//!
//! This module provides the error taxonomy for page fetches. Every failure is
//! scoped to a single page of a single list session: the loader records it in
//! its state instead of propagating it, so errors here are cloneable values.

use thiserror::Error;

use crate::auth::AuthError;

/// Longest upstream body snippet kept in an error (bytes, cut on a char boundary)
const BODY_SNIPPET_LIMIT: usize = 512;

/// Failure of one page fetch
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// No current session or token when the request was about to be sent
    #[error("authentication unavailable: {details}")]
    AuthUnavailable { details: String },

    /// Transport-level failure (connect, TLS, reset, body read)
    #[error("network error: {details}")]
    Network { details: String },

    /// The request did not complete within the configured deadline
    #[error("request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Upstream answered with a non-2xx status
    #[error("HTTP error {status}: {}", .body.as_deref().unwrap_or("No body"))]
    Http { status: u16, body: Option<String> },

    /// Envelope `status` was something other than `"success"`
    #[error("unsuccessful response status '{status}'{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Unsuccessful {
        status: String,
        message: Option<String>,
    },

    /// Envelope or items could not be decoded
    #[error("malformed response: {details}")]
    Malformed { details: String },

    /// Request could not be built from configuration or query
    #[error("configuration error: {details}")]
    Configuration { details: String },
}

/// Coarse classification used for metrics labels and rendering decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Token could not be resolved
    Authentication,
    /// Transport or deadline failure
    Network,
    /// The server answered, but not with a usable page
    Response,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Authentication => "authentication",
            FailureKind::Network => "network",
            FailureKind::Response => "response",
        }
    }
}

impl LoadError {
    pub fn network<S: Into<String>>(details: S) -> Self {
        LoadError::Network {
            details: details.into(),
        }
    }

    pub fn malformed<S: Into<String>>(details: S) -> Self {
        LoadError::Malformed {
            details: details.into(),
        }
    }

    pub fn configuration<S: Into<String>>(details: S) -> Self {
        LoadError::Configuration {
            details: details.into(),
        }
    }

    /// Build an HTTP error, truncating the body to a short snippet
    pub fn http(status: u16, body: Option<String>) -> Self {
        LoadError::Http {
            status,
            body: body
                .filter(|b| !b.trim().is_empty())
                .map(|b| truncate_snippet(&b)),
        }
    }

    /// Classify the error
    pub fn kind(&self) -> FailureKind {
        match self {
            LoadError::AuthUnavailable { .. } => FailureKind::Authentication,
            LoadError::Http { status: 401, .. } => FailureKind::Authentication,
            LoadError::Network { .. } | LoadError::Timeout { .. } => FailureKind::Network,
            LoadError::Http { .. }
            | LoadError::Unsuccessful { .. }
            | LoadError::Malformed { .. }
            | LoadError::Configuration { .. } => FailureKind::Response,
        }
    }

    /// Whether a manual retry has a reasonable chance of succeeding.
    ///
    /// Nothing retries automatically; this only informs the retry affordance.
    pub fn is_retryable(&self) -> bool {
        match self {
            LoadError::Network { .. } | LoadError::Timeout { .. } => true,
            LoadError::Http { status, .. } => *status == 429 || *status >= 500,
            LoadError::AuthUnavailable { .. } => true,
            LoadError::Unsuccessful { .. }
            | LoadError::Malformed { .. }
            | LoadError::Configuration { .. } => false,
        }
    }

    /// Short message suitable for an inline error row
    pub fn user_message(&self) -> String {
        match self.kind() {
            FailureKind::Authentication => "Please sign in again to load this list.".to_string(),
            FailureKind::Network => {
                "Couldn't reach the server. Check your connection and try again.".to_string()
            }
            FailureKind::Response => "Something went wrong while loading this list.".to_string(),
        }
    }
}

impl From<AuthError> for LoadError {
    fn from(err: AuthError) -> Self {
        LoadError::AuthUnavailable {
            details: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LoadError::malformed(err.to_string())
        } else if err.is_builder() {
            LoadError::configuration(err.to_string())
        } else {
            LoadError::network(err.to_string())
        }
    }
}

impl From<url::ParseError> for LoadError {
    fn from(err: url::ParseError) -> Self {
        LoadError::configuration(format!("invalid request URL: {err}"))
    }
}

fn truncate_snippet(body: &str) -> String {
    if body.len() <= BODY_SNIPPET_LIMIT {
        return body.to_string();
    }
    let mut end = BODY_SNIPPET_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            LoadError::AuthUnavailable {
                details: "no session".into()
            }
            .kind(),
            FailureKind::Authentication
        );
        assert_eq!(LoadError::http(401, None).kind(), FailureKind::Authentication);
        assert_eq!(
            LoadError::Timeout { after_ms: 20_000 }.kind(),
            FailureKind::Network
        );
        assert_eq!(LoadError::http(500, None).kind(), FailureKind::Response);
        assert_eq!(LoadError::malformed("x").kind(), FailureKind::Response);
    }

    #[test]
    fn test_retryable() {
        assert!(LoadError::network("reset").is_retryable());
        assert!(LoadError::http(503, None).is_retryable());
        assert!(LoadError::http(429, None).is_retryable());
        assert!(!LoadError::http(404, None).is_retryable());
        assert!(
            !LoadError::Unsuccessful {
                status: "error".into(),
                message: None
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_http_body_is_truncated() {
        let body = "é".repeat(600);
        let err = LoadError::http(502, Some(body));
        let LoadError::Http { body: Some(snippet), .. } = err else {
            panic!("expected http error with body");
        };
        assert!(snippet.len() <= BODY_SNIPPET_LIMIT + '…'.len_utf8());
        assert!(snippet.ends_with('…'));
    }

    #[test]
    fn test_blank_body_is_dropped() {
        assert_eq!(
            LoadError::http(500, Some("  ".to_string())),
            LoadError::Http {
                status: 500,
                body: None
            }
        );
    }

    #[test]
    fn test_display_messages() {
        let err = LoadError::Unsuccessful {
            status: "error".into(),
            message: Some("category not found".into()),
        };
        assert_eq!(
            err.to_string(),
            "unsuccessful response status 'error': category not found"
        );
        assert_eq!(
            LoadError::http(500, None).to_string(),
            "HTTP error 500: No body"
        );
    }
}
