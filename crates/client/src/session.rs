//! Session mode and token persistence.
//!
//! A session is either anonymous or authenticated; exactly one mode is
//! active at a time. Login and logout are the only transition events, and
//! the caller forwards them to
//! [`CartReconciler::on_mode_transition`](crate::cart::CartReconciler::on_mode_transition)
//! so the cart can follow.
//!
//! The bearer token is the durable record of an authenticated session: it
//! is written to local storage on login, removed on logout, and its
//! presence decides the starting mode of a new process.

use secrecy::SecretString;

use crate::storage::{LocalStore, StoreError, keys};

/// Whether the active session has a logged-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// No user; the cart lives in local storage.
    Anonymous,
    /// Logged-in user; the remote cart is authoritative.
    Authenticated,
}

impl SessionMode {
    /// Whether this is the authenticated mode.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// Read the persisted bearer token, if a user is logged in.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn stored_token(store: &impl LocalStore) -> Result<Option<SecretString>, StoreError> {
    Ok(store.get(keys::AUTH_TOKEN)?.map(SecretString::from))
}

/// The session mode implied by the persisted token.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn stored_mode(store: &impl LocalStore) -> Result<SessionMode, StoreError> {
    Ok(if store.get(keys::AUTH_TOKEN)?.is_some() {
        SessionMode::Authenticated
    } else {
        SessionMode::Anonymous
    })
}

/// Persist the bearer token after a successful login or registration.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn remember_token(store: &mut impl LocalStore, token: &str) -> Result<(), StoreError> {
    store.set(keys::AUTH_TOKEN, token)
}

/// Drop the persisted bearer token on logout.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn forget_token(store: &mut impl LocalStore) -> Result<(), StoreError> {
    store.remove(keys::AUTH_TOKEN)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use secrecy::ExposeSecret;

    #[test]
    fn test_token_lifecycle() {
        let mut store = MemoryStore::new();
        assert!(stored_token(&store).unwrap().is_none());
        assert_eq!(stored_mode(&store).unwrap(), SessionMode::Anonymous);

        remember_token(&mut store, "jwt-abc").unwrap();
        assert_eq!(
            stored_token(&store).unwrap().unwrap().expose_secret(),
            "jwt-abc"
        );
        assert_eq!(stored_mode(&store).unwrap(), SessionMode::Authenticated);

        forget_token(&mut store).unwrap();
        assert!(stored_token(&store).unwrap().is_none());
        assert_eq!(stored_mode(&store).unwrap(), SessionMode::Anonymous);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(SessionMode::Anonymous.to_string(), "anonymous");
        assert_eq!(SessionMode::Authenticated.to_string(), "authenticated");
    }
}
