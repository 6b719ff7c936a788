//! Session store: who is logged in, and which credential authorizes backend calls.
//!
//! The identity record and the credential only ever exist as a pair. They are
//! set together on login, cleared together on logout, and written to durable
//! storage together. A lone leftover value in storage (a user record without a
//! token, or a token without a user) is never trusted on hydrate.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smartsales_core::{Credential, UserId, UserRole};

use crate::storage::{Storage, StorageError, keys};

/// Identity record of the logged-in user, as returned by the Users API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub role_display: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, rename = "ciudad", alias = "city")]
    pub city: String,
}

impl SessionUser {
    /// Name to greet the user with: first name if set, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.first_name.trim().is_empty() {
            &self.username
        } else {
            &self.first_name
        }
    }
}

/// A logged-in user together with the credential issued for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSession {
    user: SessionUser,
    credential: Credential,
}

impl AuthenticatedSession {
    /// Pair a user with their credential.
    #[must_use]
    pub const fn new(user: SessionUser, credential: Credential) -> Self {
        Self { user, credential }
    }

    #[must_use]
    pub const fn user(&self) -> &SessionUser {
        &self.user
    }

    #[must_use]
    pub const fn credential(&self) -> &Credential {
        &self.credential
    }
}

/// Single source of truth for the current session.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    current: Option<AuthenticatedSession>,
}

impl SessionStore {
    /// Create an empty (logged-out) store backed by `storage`.
    ///
    /// Call [`hydrate`](Self::hydrate) to pick up a persisted session.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            current: None,
        }
    }

    /// Load the persisted session, if both halves of it are present.
    ///
    /// A missing user record, missing token, blank token or unreadable user
    /// record all leave the store logged out. Does no network I/O and can be
    /// called more than once.
    ///
    /// # Errors
    ///
    /// Returns an error only if the storage itself cannot be read.
    pub fn hydrate(&mut self) -> Result<(), StorageError> {
        let saved_user = self.storage.get(keys::USER)?;
        let saved_token = self.storage.get(keys::AUTH_TOKEN)?;

        self.current = match (saved_user, saved_token) {
            (Some(user_json), Some(token)) => Self::restore(&user_json, &token),
            (Some(_), None) | (None, Some(_)) => {
                tracing::debug!("Ignoring incomplete persisted session");
                None
            }
            (None, None) => None,
        };

        if let Some(session) = &self.current {
            tracing::debug!(user_id = %session.user.id, "Session hydrated from storage");
        }
        Ok(())
    }

    fn restore(user_json: &str, token: &str) -> Option<AuthenticatedSession> {
        let user = match serde_json::from_str::<SessionUser>(user_json) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Persisted user record is unreadable, ignoring session");
                return None;
            }
        };
        let credential = Credential::parse(token).ok()?;
        Some(AuthenticatedSession::new(user, credential))
    }

    /// Replace the session with a freshly authenticated user and credential.
    ///
    /// Both values are persisted in one storage write before the in-memory
    /// session changes, so a failed write leaves the previous session intact.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted.
    pub fn login(&mut self, user: SessionUser, credential: Credential) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(&user)?;
        self.storage.set_all(&[
            (keys::USER, user_json.as_str()),
            (keys::AUTH_TOKEN, credential.expose()),
        ])?;

        tracing::info!(user_id = %user.id, username = %user.username, "Logged in");
        self.current = Some(AuthenticatedSession::new(user, credential));
        Ok(())
    }

    /// Clear the session from memory and storage.
    ///
    /// Logging out while logged out is a no-op. The in-memory session is
    /// cleared even if removing the persisted copy fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted session cannot be removed.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        if let Some(session) = self.current.take() {
            tracing::info!(user_id = %session.user.id, "Logged out");
        }
        self.storage.remove_all(&[keys::USER, keys::AUTH_TOKEN])
    }

    /// True iff a user and a credential are both present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// The current session, if authenticated.
    #[must_use]
    pub const fn session(&self) -> Option<&AuthenticatedSession> {
        self.current.as_ref()
    }

    /// The logged-in user, if authenticated.
    #[must_use]
    pub fn user(&self) -> Option<&SessionUser> {
        self.current.as_ref().map(AuthenticatedSession::user)
    }

    /// The credential for backend calls, if authenticated.
    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        self.current.as_ref().map(AuthenticatedSession::credential)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}
