//! Session lifecycle shared by both clients
//!
//! ```text
//! Unauthenticated --login--> Authenticated --fetch*--> ... --close--> Closed
//! ```
//!
//! `Closed` is terminal. A failed login leaves the state `Unauthenticated`.

use crate::error::{AuthError, Error, Result};
use crate::types::Credentials;

/// Where a client is in its lifecycle
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No successful login yet
    #[default]
    Unauthenticated,
    /// Logged in; the cookie jar holds the session
    Authenticated {
        /// Account the session belongs to
        email: String,
    },
    /// Scope exited; nothing can be done with this client anymore
    Closed,
}

/// What closing a client has to do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Teardown {
    /// An authenticated session must be logged out
    Logout,
    /// Never authenticated: drop local state only
    Discard,
    /// Already closed earlier
    AlreadyClosed,
}

impl SessionState {
    /// Fail with [`Error::SessionClosed`] once closed
    pub fn ensure_open(&self) -> Result<()> {
        match self {
            SessionState::Closed => Err(Error::SessionClosed),
            _ => Ok(()),
        }
    }

    /// Whether a login round trip is needed for `credentials`
    ///
    /// An authenticated session is reused for the same account and refused
    /// for any other.
    pub fn needs_login(&self, credentials: &Credentials) -> Result<bool> {
        match self {
            SessionState::Unauthenticated => Ok(true),
            SessionState::Authenticated { email } if *email == credentials.email => Ok(false),
            SessionState::Authenticated { email } => Err(AuthError::SessionInUse {
                email: email.clone(),
            }
            .into()),
            SessionState::Closed => Err(Error::SessionClosed),
        }
    }

    /// Fail unless an authenticated session is active
    pub fn require_authenticated(&self) -> Result<&str> {
        match self {
            SessionState::Authenticated { email } => Ok(email.as_str()),
            SessionState::Unauthenticated => Err(AuthError::NotAuthenticated.into()),
            SessionState::Closed => Err(Error::SessionClosed),
        }
    }

    /// Record a successful login
    pub fn authenticated(&mut self, credentials: &Credentials) {
        *self = SessionState::Authenticated {
            email: credentials.email.clone(),
        };
    }

    /// Whether a login succeeded and the scope is still open
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    /// Move to `Closed` and report what the caller still has to do
    ///
    /// Only the first call can return [`Teardown::Logout`].
    pub fn close(&mut self) -> Teardown {
        match std::mem::replace(self, SessionState::Closed) {
            SessionState::Authenticated { .. } => Teardown::Logout,
            SessionState::Unauthenticated => Teardown::Discard,
            SessionState::Closed => Teardown::AlreadyClosed,
        }
    }
}

/// Combine the result of a scope body with the result of closing the scope
///
/// The body's result is returned unchanged. A teardown failure is logged and
/// never replaces it: a PDF that was saved stays a success.
pub(crate) fn finish_scope<T>(outcome: Result<T>, closed: Result<()>) -> Result<T> {
    if let Err(close_err) = closed {
        tracing::warn!(
            error = %close_err,
            body_failed = outcome.is_err(),
            "closing session failed"
        );
    }
    outcome
}
