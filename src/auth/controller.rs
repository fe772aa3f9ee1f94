//! Login, logout, refresh and the mount-time session check.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::endpoint::{AuthEndpoint, Credentials};
use super::error::AuthError;
use super::navigation::{Navigator, Route};
use super::session::SessionState;
use super::state::{AuthPatch, SessionStatus};
use super::token::{TokenPair, User};

/// Message stored in the session record when a login attempt fails.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";

/// Drives the session through the remote auth endpoints.
///
/// Overlapping calls are not serialized: whichever finishes last decides the
/// final record.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use fanhub_session::auth::{AuthController, HttpAuthEndpoint, MemorySessionStore, SessionState};
///
/// # async fn example() -> Result<(), fanhub_session::auth::AuthError> {
/// let session = Arc::new(SessionState::restore(Arc::new(MemorySessionStore::new())));
/// let endpoint = Arc::new(HttpAuthEndpoint::new("http://localhost:3000"));
/// let controller = AuthController::new(session, endpoint);
/// let user = controller.login("a@b.com", "pw").await?;
/// println!("signed in as {}", user.label());
/// # Ok(())
/// # }
/// ```
pub struct AuthController {
    session: Arc<SessionState>,
    endpoint: Arc<dyn AuthEndpoint>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl AuthController {
    pub fn new(session: Arc<SessionState>, endpoint: Arc<dyn AuthEndpoint>) -> Self {
        Self {
            session,
            endpoint,
            navigator: None,
        }
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    /// Exchange credentials for a token pair.
    ///
    /// On failure the record carries [`INVALID_CREDENTIALS_MESSAGE`] and the
    /// endpoint error is handed back for the UI to act on.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let credentials = Credentials::new(email, password);
        match self.endpoint.login(&credentials).await {
            Ok(resp) => {
                info!(user_id = %resp.user.id, "Login succeeded");
                let tokens = TokenPair::new(resp.access_token, resp.refresh_token);
                self.session.begin(tokens, resp.user.clone());
                self.navigate(Route::Dashboard);
                Ok(resp.user)
            }
            Err(err) => {
                warn!(error = %err, "Login failed");
                self.session
                    .merge_auth(AuthPatch::failed(INVALID_CREDENTIALS_MESSAGE));
                Err(err)
            }
        }
    }

    /// Mint a new access token from the held refresh token.
    ///
    /// Returns `false` without a request when no refresh token is held. Any
    /// other failure ends the session.
    pub async fn refresh_auth(&self) -> bool {
        match self.try_refresh().await {
            Ok(user) => {
                info!(user_id = %user.id, "Session refreshed");
                true
            }
            Err(AuthError::NotLoggedIn) => {
                debug!("No refresh token held, skipping refresh");
                false
            }
            Err(err) => {
                // TODO: keep the session on transient failures once product
                // signs off on an offline mode; today every failure logs out.
                warn!(
                    error = %err,
                    transient = err.is_transient(),
                    "Token refresh failed, ending session"
                );
                self.logout();
                false
            }
        }
    }

    async fn try_refresh(&self) -> Result<User, AuthError> {
        let refresh_token = self
            .session
            .tokens()
            .refresh_token
            .ok_or(AuthError::NotLoggedIn)?;
        let resp = self.endpoint.refresh(&refresh_token).await?;
        let user = resp
            .user
            .or_else(|| self.session.auth_state().user)
            .ok_or_else(|| {
                AuthError::InvalidResponse("refresh response carried no user".to_string())
            })?;
        self.session.resume(resp.access_token, user.clone());
        Ok(user)
    }

    /// End the session: both tokens and every persisted session value are
    /// dropped and the record returns to its initial value. Safe to repeat.
    pub fn logout(&self) {
        info!("Logging out");
        self.session.reset();
        self.navigate(Route::Login);
    }

    /// Reconcile the held tokens with the server.
    ///
    /// Always leaves the record settled: a session that cannot be verified
    /// or refreshed ends as unauthenticated, not loading.
    pub async fn check_auth(&self) -> SessionStatus {
        let tokens = self.session.tokens();
        match (tokens.access_token, tokens.refresh_token) {
            (None, None) => {
                debug!("No tokens held, staying logged out");
                self.session.merge_auth(AuthPatch::loaded());
            }
            (None, Some(_)) => {
                debug!("Only a refresh token held, attempting refresh");
                self.fall_back_to_refresh().await;
            }
            (Some(access_token), _) => match self.endpoint.verify(&access_token).await {
                Ok(user) => {
                    debug!(user_id = %user.id, "Access token verified");
                    let mut auth = self.session.auth_state();
                    auth.merge(AuthPatch {
                        user: Some(Some(user)),
                        is_authenticated: Some(true),
                        is_loading: Some(false),
                        error: Some(None),
                    });
                    self.session.replace_auth(auth);
                }
                Err(err) => {
                    debug!(error = %err, "Access token rejected, attempting refresh");
                    self.fall_back_to_refresh().await;
                }
            },
        }
        self.session.status()
    }

    /// Refresh, or end the session once when no refresh is possible, then
    /// settle the record out of the loading state.
    async fn fall_back_to_refresh(&self) {
        if self.session.tokens().refresh_token.is_some() {
            if self.refresh_auth().await {
                return;
            }
        } else {
            self.logout();
        }
        self.session.merge_auth(AuthPatch::loaded());
    }

    /// Run `check_auth` now and again whenever either token changes, until
    /// the returned handle is unmounted or dropped.
    pub fn mount(self: &Arc<Self>) -> MountHandle {
        let controller = Arc::clone(self);
        let mut events = controller.session.subscribe();
        let task = tokio::spawn(async move {
            let mut seen = events.borrow_and_update().token_revision;
            let mut own_rotation = controller.recheck(seen).await;
            while events.changed().await.is_ok() {
                let revision = events.borrow_and_update().token_revision;
                if revision == seen {
                    continue;
                }
                seen = revision;
                debug!(revision, "Tokens changed, re-checking session");
                let after_own_refresh = own_rotation == Some(revision);
                own_rotation = controller.recheck(revision).await;
                if after_own_refresh
                    && own_rotation.is_some()
                    && controller.session.is_authenticated()
                {
                    warn!(
                        revision,
                        "Freshly refreshed access token was rejected by verify; \
                         the server may be looping verify and refresh"
                    );
                }
            }
        });
        MountHandle { task }
    }

    /// Runs `check_auth` for the watcher and returns the token revision it
    /// left behind when the check itself replaced the tokens.
    async fn recheck(&self, before: u64) -> Option<u64> {
        self.check_auth().await;
        let after = self.session.snapshot().token_revision;
        (after != before).then_some(after)
    }

    fn navigate(&self, route: Route) {
        if let Some(navigator) = &self.navigator {
            debug!(%route, "Navigating");
            navigator.navigate(route);
        }
    }
}

/// Keeps a mounted controller listening for token changes.
#[derive(Debug)]
pub struct MountHandle {
    task: JoinHandle<()>,
}

impl MountHandle {
    pub fn unmount(self) {
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
