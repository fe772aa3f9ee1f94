//! Session record types and the derived session status.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::token::User;

/// Composite session record exposed to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self::initial()
    }
}

impl AuthState {
    /// State at process start and after logout: nothing known yet, check pending.
    pub fn initial() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
            error: None,
        }
    }

    pub fn authenticated(user: User) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
            is_loading: false,
            error: None,
        }
    }

    pub fn merge(&mut self, patch: AuthPatch) {
        if let Some(user) = patch.user {
            self.user = user;
        }
        if let Some(is_authenticated) = patch.is_authenticated {
            self.is_authenticated = is_authenticated;
        }
        if let Some(is_loading) = patch.is_loading {
            self.is_loading = is_loading;
        }
        if let Some(error) = patch.error {
            self.error = error;
        }
    }
}

/// Partial update of an [`AuthState`]. `None` leaves a field untouched;
/// `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthPatch {
    pub user: Option<Option<User>>,
    pub is_authenticated: Option<bool>,
    pub is_loading: Option<bool>,
    pub error: Option<Option<String>>,
}

impl AuthPatch {
    pub fn loaded() -> Self {
        Self {
            is_loading: Some(false),
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            is_loading: Some(false),
            error: Some(Some(message.into())),
            ..Self::default()
        }
    }
}

/// Coarse session status derived from the record and the token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Point-in-time view published to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub auth: AuthState,
    pub has_access_token: bool,
    pub has_refresh_token: bool,
    /// Bumped whenever either token changes.
    pub token_revision: u64,
}

impl SessionSnapshot {
    /// A stale flag without a live access token (or without a user) does
    /// not count as authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated && self.auth.user.is_some() && self.has_access_token
    }

    pub fn status(&self) -> SessionStatus {
        if self.auth.is_loading {
            SessionStatus::Loading
        } else if self.is_authenticated() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Unauthenticated
        }
    }
}
