//! Error types for article-dl
//!
//! This module provides the error taxonomy for the library:
//! - Authentication failures (login handshake, missing session)
//! - Malformed article URLs, detected before any network call
//! - Non-success responses for authenticated fetches, carrying the status code
//! - Transport, filesystem and configuration errors

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for article-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for article-dl
///
/// Transport errors from reqwest are carried unchanged in [`Error::Network`];
/// nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// Login failed or an operation needed an authenticated session
    #[error("authentication error: {0}")]
    Authentication(#[from] AuthError),

    /// The article URL does not match the expected shape
    #[error("invalid article URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL as supplied by the caller
        url: String,
        /// Why the URL was rejected
        reason: String,
    },

    /// An authenticated request returned a non-success status
    #[error("fetching {url} failed with HTTP {status}")]
    Fetch {
        /// The URL that was requested
        url: String,
        /// HTTP status code returned by the server
        status: u16,
    },

    /// The logout request at scope exit returned a non-success status
    #[error("logout failed with HTTP {status}")]
    Logout {
        /// HTTP status code returned by the logout endpoint
        status: u16,
    },

    /// The client has already been closed
    #[error("session is closed")]
    SessionClosed,

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "login_path")
        key: Option<String>,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Authentication-related errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// The login page or the credential submission returned a non-success status
    #[error("login rejected with HTTP {status}")]
    Rejected {
        /// HTTP status code returned by the login endpoint
        status: u16,
    },

    /// No login form could be found in the login page
    #[error("login form not found (selector: {selector})")]
    FormNotFound {
        /// The CSS selector that matched nothing
        selector: String,
    },

    /// The login round trip succeeded but the session cookie was not set
    #[error("session cookie '{name}' missing after login; check your credentials")]
    MissingSessionCookie {
        /// Name of the expected cookie
        name: String,
    },

    /// An authenticated operation was attempted before logging in
    #[error("not authenticated; log in before fetching")]
    NotAuthenticated,

    /// The session is already authenticated for another account
    #[error("session already authenticated as {email}")]
    SessionInUse {
        /// Email the active session belongs to
        email: String,
    },
}

impl Error {
    /// Create a configuration error for the given key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    pub(crate) fn invalid_url(url: &str, reason: impl Into<String>) -> Self {
        Error::InvalidUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn fetch(url: &url::Url, status: StatusCode) -> Self {
        Error::Fetch {
            url: url.to_string(),
            status: status.as_u16(),
        }
    }

    /// HTTP status carried by this error, if any
    ///
    /// Returns the status of a failed fetch, a rejected login, a failed
    /// logout or a reqwest status error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Fetch { status, .. } => Some(*status),
            Error::Authentication(AuthError::Rejected { status }) => Some(*status),
            Error::Logout { status } => Some(*status),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this is an authentication failure
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication(_))
    }
}
