//! Session store.
//!
//! Holds the current token pair for the process. The store is an injected
//! handle: clones share the same session, and there is no global instance.
//! Only a successful token exchange replaces the session; every failure or
//! cancellation clears it.

use std::sync::{Arc, PoisonError, RwLock};

/// The authenticated identity state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    access_token: String,
    refresh_token: Option<String>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }

    /// True iff the access token is non-empty.
    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.is_authenticated().then_some(self.access_token.as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

/// Shared handle to the process session.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Session>>,
}

impl SessionStore {
    /// Creates an empty (unauthenticated) store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds a session.
    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    /// Returns a copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_authenticated()
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .access_token()
            .map(str::to_string)
    }

    /// Replaces the session wholesale with a new token pair.
    pub(crate) fn replace(&self, access_token: String, refresh_token: Option<String>) {
        let mut session = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *session = Session {
            access_token,
            refresh_token,
        };
    }

    /// Clears the session (signed out).
    pub fn clear(&self) {
        let mut session = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *session = Session::default();
    }
}

/// Masks a token for display, keeping only its edges.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
