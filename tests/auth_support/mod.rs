#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use fanhub_session::auth::{
    AuthController, HttpAuthEndpoint, MemorySessionStore, Navigator, Route, SessionState,
    TokenPair,
};
use wiremock::MockServer;

/// Navigator that remembers every route it was sent to.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().expect("navigator lock poisoned").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes
            .lock()
            .expect("navigator lock poisoned")
            .push(route);
    }
}

pub struct Harness {
    pub store: Arc<MemorySessionStore>,
    pub session: Arc<SessionState>,
    pub navigator: Arc<RecordingNavigator>,
    pub controller: Arc<AuthController>,
}

/// Controller wired to a mock server, seeded with `tokens`.
pub fn harness(server: &MockServer, tokens: TokenPair) -> Harness {
    let store = Arc::new(MemorySessionStore::new());
    let session = Arc::new(SessionState::restore(store.clone()));
    session.set_tokens(tokens);
    let navigator = Arc::new(RecordingNavigator::new());
    let endpoint = Arc::new(HttpAuthEndpoint::new(server.uri()));
    let controller = Arc::new(
        AuthController::new(session.clone(), endpoint).with_navigator(navigator.clone()),
    );
    Harness {
        store,
        session,
        navigator,
        controller,
    }
}

pub fn refresh_only(refresh_token: &str) -> TokenPair {
    TokenPair {
        access_token: None,
        refresh_token: Some(refresh_token.to_string()),
    }
}
