//! Route guard for protected views.

use std::time::Duration;

use strum::Display;
use tokio::sync::watch;

use super::state::SessionSnapshot;
use crate::error::SessionError;

/// What a protected view should do for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum GuardDecision {
    /// Initial check still running: show a placeholder, do not redirect.
    Pending,
    Render,
    RedirectToLogin,
}

/// Pure decision from the loading flag and the derived authenticated flag.
pub fn decide(snapshot: &SessionSnapshot) -> GuardDecision {
    if snapshot.auth.is_loading {
        GuardDecision::Pending
    } else if snapshot.is_authenticated() {
        GuardDecision::Render
    } else {
        GuardDecision::RedirectToLogin
    }
}

/// Subscribed view over the session used by protected subtrees.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use fanhub_session::auth::{GuardDecision, MemorySessionStore, RouteGuard, SessionState};
///
/// let session = SessionState::restore(Arc::new(MemorySessionStore::new()));
/// let guard = RouteGuard::new(session.subscribe());
/// assert_eq!(guard.decision(), GuardDecision::Pending);
/// ```
#[derive(Debug, Clone)]
pub struct RouteGuard {
    events: watch::Receiver<SessionSnapshot>,
}

impl RouteGuard {
    pub fn new(events: watch::Receiver<SessionSnapshot>) -> Self {
        Self { events }
    }

    pub fn decision(&self) -> GuardDecision {
        decide(&self.events.borrow())
    }

    /// Wait for the first decision that is not [`GuardDecision::Pending`].
    pub async fn resolved(&mut self) -> Result<GuardDecision, SessionError> {
        let snapshot = self
            .events
            .wait_for(|snapshot| !snapshot.auth.is_loading)
            .await
            .map_err(|_| SessionError::SessionClosed)?;
        Ok(decide(&snapshot))
    }

    /// Like [`RouteGuard::resolved`], giving up after `limit`.
    pub async fn resolved_within(&mut self, limit: Duration) -> Result<GuardDecision, SessionError> {
        tokio::time::timeout(limit, self.resolved())
            .await
            .map_err(|_| SessionError::Timeout(limit.as_millis() as u64))?
    }

    /// Wait for the next change and return the decision it implies.
    pub async fn changed(&mut self) -> Result<GuardDecision, SessionError> {
        self.events
            .changed()
            .await
            .map_err(|_| SessionError::SessionClosed)?;
        Ok(decide(&self.events.borrow_and_update()))
    }
}
