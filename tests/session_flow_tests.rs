//! End-to-end auth flows against a mock `/auth/*` backend.

mod auth_support;

use fanhub_session::auth::{
    AuthError, AuthState, GuardDecision, Route, RouteGuard, SessionStatus, SessionStore,
    TokenPair, User, UserId, INVALID_CREDENTIALS_MESSAGE,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{any, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_support::{harness, refresh_only};

fn user(id: i64) -> User {
    User::new(UserId::Number(id))
}

fn settled_logged_out() -> AuthState {
    AuthState {
        is_loading: false,
        ..AuthState::initial()
    }
}

async fn forbid_all_requests(server: &MockServer) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// check_auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn check_auth_without_tokens_stays_logged_out_offline() {
    let server = MockServer::start().await;
    forbid_all_requests(&server).await;
    let h = harness(&server, TokenPair::default());

    let status = h.controller.check_auth().await;

    assert_eq!(status, SessionStatus::Unauthenticated);
    let auth = h.session.auth_state();
    assert!(!auth.is_authenticated);
    assert!(!auth.is_loading);
}

#[tokio::test]
async fn check_auth_with_only_refresh_token_refreshes_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "R1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "T2",
            "user": { "id": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server, refresh_only("R1"));

    let status = h.controller.check_auth().await;

    assert_eq!(status, SessionStatus::Authenticated);
    assert_eq!(h.session.tokens(), TokenPair::new("T2", "R1"));
    assert_eq!(h.session.auth_state(), AuthState::authenticated(user(1)));
}

#[tokio::test]
async fn check_auth_with_only_refresh_token_logs_out_when_refresh_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server, refresh_only("R1"));

    let status = h.controller.check_auth().await;

    assert_eq!(status, SessionStatus::Unauthenticated);
    assert_eq!(h.session.tokens(), TokenPair::default());
    assert_eq!(h.session.auth_state(), settled_logged_out());
    assert_eq!(
        RouteGuard::new(h.session.subscribe()).decision(),
        GuardDecision::RedirectToLogin
    );
    assert_eq!(h.navigator.routes(), vec![Route::Login]);
}

#[tokio::test]
async fn check_auth_adopts_verified_user_and_keeps_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/verify"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": 1, "username": "ada" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server, TokenPair::new("T1", "R1"));

    let status = h.controller.check_auth().await;

    assert_eq!(status, SessionStatus::Authenticated);
    assert_eq!(h.session.tokens(), TokenPair::new("T1", "R1"));
    let auth = h.session.auth_state();
    assert!(auth.is_authenticated);
    assert!(!auth.is_loading);
    assert_eq!(auth.user.and_then(|u| u.username).as_deref(), Some("ada"));
}

#[tokio::test]
async fn check_auth_falls_back_to_refresh_when_verify_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/verify"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "T2",
            "user": { "id": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server, TokenPair::new("T1", "R1"));

    let status = h.controller.check_auth().await;

    assert_eq!(status, SessionStatus::Authenticated);
    assert_eq!(h.session.tokens(), TokenPair::new("T2", "R1"));
}

#[tokio::test]
async fn check_auth_logs_out_when_verify_and_refresh_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/verify"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server, TokenPair::new("T1", "R1"));

    let status = h.controller.check_auth().await;

    assert_eq!(status, SessionStatus::Unauthenticated);
    assert_eq!(h.session.tokens(), TokenPair::default());
    assert_eq!(h.session.auth_state(), settled_logged_out());
    assert_eq!(
        RouteGuard::new(h.session.subscribe()).decision(),
        GuardDecision::RedirectToLogin
    );
    assert_eq!(h.store.load("accessToken").unwrap(), None);
    assert_eq!(h.store.load("refreshToken").unwrap(), None);
    assert_eq!(h.navigator.routes(), vec![Route::Login]);
}

// ---------------------------------------------------------------------------
// login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_stores_tokens_and_authenticates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "a@b.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "T1",
            "refreshToken": "R1",
            "user": { "id": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server, TokenPair::default());

    let signed_in = h.controller.login("a@b.com", "pw").await.expect("login");

    assert_eq!(signed_in, user(1));
    assert_eq!(
        h.session.auth_state(),
        AuthState {
            user: Some(user(1)),
            is_authenticated: true,
            is_loading: false,
            error: None,
        }
    );
    assert_eq!(h.session.tokens(), TokenPair::new("T1", "R1"));
    assert_eq!(h.navigator.routes(), vec![Route::Dashboard]);
}

#[tokio::test]
async fn login_failure_sets_message_and_returns_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid email or password"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server, TokenPair::default());

    let err = h.controller.login("a@b.com", "nope").await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidCredentials));
    let auth = h.session.auth_state();
    assert_eq!(auth.error.as_deref(), Some(INVALID_CREDENTIALS_MESSAGE));
    assert!(!auth.is_loading);
    assert!(!auth.is_authenticated);
    assert!(h.navigator.routes().is_empty());
}

// ---------------------------------------------------------------------------
// refresh_auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_rejected_logs_out_completely() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "R1" })))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server, TokenPair::new("T1", "R1"));
    h.session.begin(TokenPair::new("T1", "R1"), user(1));

    assert!(!h.controller.refresh_auth().await);

    assert_eq!(h.session.tokens(), TokenPair::default());
    assert_eq!(h.session.auth_state(), AuthState::initial());
    assert_eq!(h.store.load("accessToken").unwrap(), None);
    assert_eq!(h.store.load("refreshToken").unwrap(), None);
}

#[tokio::test]
async fn refresh_with_malformed_body_logs_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server, refresh_only("R1"));

    assert!(!h.controller.refresh_auth().await);
    assert_eq!(h.session.tokens(), TokenPair::default());
}

#[tokio::test]
async fn refresh_without_token_is_a_silent_noop() {
    let server = MockServer::start().await;
    forbid_all_requests(&server).await;
    let h = harness(&server, TokenPair::default());

    assert!(!h.controller.refresh_auth().await);
    assert!(h.navigator.routes().is_empty());
}

// ---------------------------------------------------------------------------
// logout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logout_resets_any_session_to_initial_state() {
    let server = MockServer::start().await;
    forbid_all_requests(&server).await;
    let h = harness(&server, TokenPair::default());
    h.session.begin(TokenPair::new("T1", "R1"), user(1));

    h.controller.logout();

    assert_eq!(h.session.auth_state(), AuthState::initial());
    assert_eq!(h.session.tokens(), TokenPair::default());
    assert!(h.store.is_empty());
    assert_eq!(h.navigator.routes(), vec![Route::Login]);
}

#[tokio::test]
async fn logout_twice_matches_logout_once() {
    let server = MockServer::start().await;
    forbid_all_requests(&server).await;
    let h = harness(&server, TokenPair::new("T1", "R1"));

    h.controller.logout();
    let once = (h.session.auth_state(), h.session.tokens());
    h.controller.logout();
    let twice = (h.session.auth_state(), h.session.tokens());

    assert_eq!(once, twice);
    assert_eq!(once, (AuthState::initial(), TokenPair::default()));
}
