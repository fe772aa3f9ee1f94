//! Owned session record with controlled mutations and change events.
//!
//! [`SessionState`] is the single holder of the auth record and the token
//! pair. Every mutation is persisted to the backing [`SessionStore`] and
//! published as a [`SessionSnapshot`] on a `watch` channel, so the route
//! guard and the mounted controller react to changes by subscription.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, warn};

use super::state::{AuthPatch, AuthState, SessionSnapshot, SessionStatus};
use super::store::{keys, SessionStore};
use super::token::{TokenPair, User};

#[derive(Debug, Clone, Default)]
struct SessionRecord {
    auth: AuthState,
    tokens: TokenPair,
    token_revision: u64,
}

impl SessionRecord {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            auth: self.auth.clone(),
            has_access_token: self.tokens.access_token.is_some(),
            has_refresh_token: self.tokens.refresh_token.is_some(),
            token_revision: self.token_revision,
        }
    }

    fn replace_tokens(&mut self, tokens: TokenPair) -> bool {
        if self.tokens == tokens {
            return false;
        }
        self.tokens = tokens;
        self.token_revision += 1;
        true
    }
}

/// What a mutation touched, so only those keys are written back.
#[derive(Debug, Clone, Copy, Default)]
struct Dirty {
    tokens: bool,
    auth: bool,
}

/// Session state shared by the controller, the guard and the UI layer.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use fanhub_session::auth::{MemorySessionStore, SessionState, SessionStatus, TokenPair};
///
/// let session = SessionState::restore(Arc::new(MemorySessionStore::new()));
/// assert_eq!(session.status(), SessionStatus::Loading);
///
/// session.set_tokens(TokenPair::new("T1", "R1"));
/// assert_eq!(session.tokens().access_token.as_deref(), Some("T1"));
/// ```
pub struct SessionState {
    store: Arc<dyn SessionStore>,
    record: Mutex<SessionRecord>,
    events: watch::Sender<SessionSnapshot>,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("snapshot", &self.snapshot())
            .field("store", &"..")
            .finish()
    }
}

impl SessionState {
    /// Initialization hook: rebuild the session from persisted values.
    ///
    /// A restored record always starts in the loading state with no error,
    /// so nothing is trusted until the next `check_auth` has run. Unreadable
    /// entries are skipped.
    pub fn restore(store: Arc<dyn SessionStore>) -> Self {
        let tokens = TokenPair {
            access_token: load_or_warn(store.as_ref(), keys::ACCESS_TOKEN),
            refresh_token: load_or_warn(store.as_ref(), keys::REFRESH_TOKEN),
        };

        let mut auth = load_or_warn(store.as_ref(), keys::AUTH_STATE)
            .and_then(|raw| decode_or_warn::<AuthState>(keys::AUTH_STATE, &raw))
            .unwrap_or_default();
        if let Some(user) = load_or_warn(store.as_ref(), keys::USER)
            .and_then(|raw| decode_or_warn::<User>(keys::USER, &raw))
        {
            auth.user = Some(user);
        }
        auth.is_loading = true;
        auth.error = None;

        debug!(
            has_access_token = tokens.access_token.is_some(),
            has_refresh_token = tokens.refresh_token.is_some(),
            "Restored session from storage"
        );

        let record = SessionRecord {
            auth,
            tokens,
            token_revision: 0,
        };
        let (events, _) = watch::channel(record.snapshot());
        Self {
            store,
            record: Mutex::new(record),
            events,
        }
    }

    /// Subscribe to session changes. The receiver starts at the current
    /// snapshot; `changed().await` resolves on the next mutation.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    pub fn auth_state(&self) -> AuthState {
        self.lock().auth.clone()
    }

    pub fn tokens(&self) -> TokenPair {
        self.lock().tokens.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.snapshot().status()
    }

    /// Derived flag: the record says authenticated, a user is present and an
    /// access token is held right now.
    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    /// Value for an `Authorization` header, if an access token is held.
    pub fn bearer(&self) -> Option<String> {
        self.lock()
            .tokens
            .access_token
            .as_ref()
            .map(|token| format!("Bearer {token}"))
    }

    pub fn set_tokens(&self, tokens: TokenPair) {
        self.mutate(|record| Dirty {
            tokens: record.replace_tokens(tokens),
            auth: false,
        });
    }

    /// Swap the access token, keeping the refresh token.
    pub fn set_access_token(&self, access_token: impl Into<String>) {
        let access_token = access_token.into();
        self.mutate(|record| {
            let tokens = TokenPair {
                access_token: Some(access_token),
                refresh_token: record.tokens.refresh_token.clone(),
            };
            Dirty {
                tokens: record.replace_tokens(tokens),
                auth: false,
            }
        });
    }

    pub fn replace_auth(&self, auth: AuthState) {
        self.mutate(|record| {
            record.auth = auth;
            Dirty {
                tokens: false,
                auth: true,
            }
        });
    }

    pub fn merge_auth(&self, patch: AuthPatch) {
        self.mutate(|record| {
            record.auth.merge(patch);
            Dirty {
                tokens: false,
                auth: true,
            }
        });
    }

    /// Install a fresh token pair and an authenticated record in one step.
    pub fn begin(&self, tokens: TokenPair, user: User) {
        self.mutate(|record| {
            let tokens_changed = record.replace_tokens(tokens);
            record.auth = AuthState::authenticated(user);
            Dirty {
                tokens: tokens_changed,
                auth: true,
            }
        });
    }

    /// Install a new access token and an authenticated record in one step.
    pub fn resume(&self, access_token: String, user: User) {
        self.mutate(|record| {
            let tokens = TokenPair {
                access_token: Some(access_token),
                refresh_token: record.tokens.refresh_token.clone(),
            };
            let tokens_changed = record.replace_tokens(tokens);
            record.auth = AuthState::authenticated(user);
            Dirty {
                tokens: tokens_changed,
                auth: true,
            }
        });
    }

    /// Teardown hook: forget both tokens, reset the record to its initial
    /// value and wipe everything the store holds.
    pub fn reset(&self) {
        let mut record = self.lock();
        let previous = record.snapshot().status();
        record.replace_tokens(TokenPair::default());
        record.auth = AuthState::initial();

        if let Err(err) = self.store.clear() {
            warn!(error = %err, "Failed to clear persisted session");
        }
        self.publish(previous, record.snapshot());
    }

    fn lock(&self) -> MutexGuard<'_, SessionRecord> {
        self.record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Applies a change, writes the touched keys and publishes the result
    /// without releasing the record, so the store and the channel always
    /// end on the same value as the record.
    fn mutate<F>(&self, apply: F)
    where
        F: FnOnce(&mut SessionRecord) -> Dirty,
    {
        let mut record = self.lock();
        let previous = record.snapshot().status();
        let dirty = apply(&mut record);

        if dirty.tokens {
            self.persist_tokens(&record.tokens);
        }
        if dirty.auth {
            self.persist_auth(&record.auth);
        }
        self.publish(previous, record.snapshot());
    }

    fn publish(&self, previous: SessionStatus, snapshot: SessionSnapshot) {
        let current = snapshot.status();
        if previous != current {
            debug!(from = %previous, to = %current, "Session status transition");
        }
        self.events.send_replace(snapshot);
    }

    fn persist_tokens(&self, tokens: &TokenPair) {
        self.persist_optional(keys::ACCESS_TOKEN, tokens.access_token.as_deref());
        self.persist_optional(keys::REFRESH_TOKEN, tokens.refresh_token.as_deref());
    }

    fn persist_auth(&self, auth: &AuthState) {
        match serde_json::to_string(auth) {
            Ok(raw) => self.persist_optional(keys::AUTH_STATE, Some(&raw)),
            Err(err) => warn!(key = keys::AUTH_STATE, error = %err, "Failed to encode session value"),
        }
        let user = auth.user.as_ref().map(serde_json::to_string).transpose();
        match user {
            Ok(raw) => self.persist_optional(keys::USER, raw.as_deref()),
            Err(err) => warn!(key = keys::USER, error = %err, "Failed to encode session value"),
        }
    }

    fn persist_optional(&self, key: &str, value: Option<&str>) {
        let result = match value {
            Some(value) => self.store.save(key, value),
            None => self.store.remove(key),
        };
        if let Err(err) = result {
            warn!(key, error = %err, "Failed to persist session value");
        }
    }
}

fn load_or_warn(store: &dyn SessionStore, key: &str) -> Option<String> {
    match store.load(key) {
        Ok(value) => value,
        Err(err) => {
            warn!(key, error = %err, "Failed to read persisted session value");
            None
        }
    }
}

fn decode_or_warn<T: serde::de::DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "Ignoring malformed persisted session value");
            None
        }
    }
}
