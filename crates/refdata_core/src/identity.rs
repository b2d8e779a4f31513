//! Identity collaborator: session token to acting user id.
//!
//! # Responsibility
//! - Define the lookup contract used to populate `creator_id`.
//! - Provide an in-process lookup keyed by the session cookie value.
//!
//! # Invariants
//! - The cookie name comes from [`IdentityConfig`] passed at construction.
//! - The returned user id is opaque; core never parses it.

use crate::config::IdentityConfig;
use crate::model::CreatorId;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Caller presented an empty session token.
    MissingSession,
    /// Session did not resolve to a user.
    UserNotFound,
    /// Identity backend could not be reached.
    Unavailable(String),
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSession => write!(f, "session token is missing"),
            Self::UserNotFound => write!(f, "user not found for session"),
            Self::Unavailable(reason) => write!(f, "identity lookup unavailable: {reason}"),
        }
    }
}

impl Error for IdentityError {}

/// Resolves the acting user for a session token.
pub trait IdentityLookup {
    fn current_user(&self, session_token: &str) -> Result<CreatorId, IdentityError>;
}

impl<T: IdentityLookup + ?Sized> IdentityLookup for &T {
    fn current_user(&self, session_token: &str) -> Result<CreatorId, IdentityError> {
        (**self).current_user(session_token)
    }
}

/// Formats the cookie header an identity backend is queried with.
pub fn session_cookie_header(config: &IdentityConfig, session_token: &str) -> String {
    format!("{}={}", config.session_cookie_name, session_token.trim())
}

/// Lookup backed by an in-memory cookie-header table.
#[derive(Debug, Clone)]
pub struct StaticIdentityLookup {
    config: IdentityConfig,
    users: HashMap<String, CreatorId>,
}

impl StaticIdentityLookup {
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            config,
            users: HashMap::new(),
        }
    }

    /// Registers the user a session token resolves to.
    pub fn register(&mut self, session_token: &str, user_id: impl Into<CreatorId>) {
        let header = session_cookie_header(&self.config, session_token);
        self.users.insert(header, user_id.into());
    }

    pub fn with_user(mut self, session_token: &str, user_id: impl Into<CreatorId>) -> Self {
        self.register(session_token, user_id);
        self
    }
}

impl IdentityLookup for StaticIdentityLookup {
    fn current_user(&self, session_token: &str) -> Result<CreatorId, IdentityError> {
        if session_token.trim().is_empty() {
            return Err(IdentityError::MissingSession);
        }
        let header = session_cookie_header(&self.config, session_token);
        self.users
            .get(&header)
            .cloned()
            .ok_or(IdentityError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::{session_cookie_header, IdentityError, IdentityLookup, StaticIdentityLookup};
    use crate::config::IdentityConfig;

    fn config(name: &str) -> IdentityConfig {
        IdentityConfig {
            session_cookie_name: name.to_string(),
        }
    }

    #[test]
    fn cookie_header_uses_configured_name() {
        assert_eq!(session_cookie_header(&config("sso"), " abc "), "sso=abc");
    }

    #[test]
    fn registered_token_resolves_to_user() {
        let lookup = StaticIdentityLookup::new(config("sso")).with_user("tok-1", "user-42");
        assert_eq!(lookup.current_user("tok-1").unwrap(), "user-42");
        assert_eq!(
            lookup.current_user("tok-2").unwrap_err(),
            IdentityError::UserNotFound
        );
        assert_eq!(
            lookup.current_user("  ").unwrap_err(),
            IdentityError::MissingSession
        );
    }

    #[test]
    fn lookups_with_different_cookie_names_do_not_share_sessions() {
        let first = StaticIdentityLookup::new(config("a")).with_user("tok", "u1");
        let second = StaticIdentityLookup::new(config("b"));
        assert!(first.current_user("tok").is_ok());
        assert!(second.current_user("tok").is_err());
    }
}
