use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::AuthError;
use super::token::User;
use crate::config::SessionConfig;

const DEFAULT_LOGIN_PATH: &str = "/auth/login";
const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
const DEFAULT_VERIFY_PATH: &str = "/auth/verify";

/// Email/password pair submitted to the login endpoint.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// The refresh endpoint may omit the user; callers fall back to the one
/// already held by the session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    pub user: User,
}

/// Remote auth endpoints used by the controller.
#[async_trait]
pub trait AuthEndpoint: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError>;
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AuthError>;
    async fn verify(&self, access_token: &str) -> Result<User, AuthError>;
}

/// HTTP client for the platform's `/auth/*` routes.
///
/// # Example
/// ```no_run
/// use fanhub_session::auth::HttpAuthEndpoint;
///
/// let endpoint = HttpAuthEndpoint::new("https://api.fanhub.example")
///     .with_verify_path("/auth/me");
/// ```
#[derive(Debug, Clone)]
pub struct HttpAuthEndpoint {
    client: reqwest::Client,
    base_url: String,
    login_path: String,
    refresh_path: String,
    verify_path: String,
}

impl HttpAuthEndpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            verify_path: DEFAULT_VERIFY_PATH.to_string(),
        }
    }

    /// Build from configuration, applying the configured request timeout.
    pub fn from_config(config: &SessionConfig) -> Result<Self, crate::error::SessionError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout.min(Duration::from_secs(10)))
            .build()?;
        Ok(Self::with_client(client, config.api_base_url.clone()))
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_verify_path(mut self, path: impl Into<String>) -> Self {
        self.verify_path = path.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AuthEndpoint for HttpAuthEndpoint {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError> {
        let resp = self
            .client
            .post(self.url(&self.login_path))
            .header("Accept", "application/json")
            .json(credentials)
            .send()
            .await?;
        let resp = check_status(resp, "login").map_err(|err| match err {
            AuthError::Rejected { .. } => AuthError::InvalidCredentials,
            other => other,
        })?;
        Ok(resp.json().await?)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AuthError> {
        let resp = self
            .client
            .post(self.url(&self.refresh_path))
            .header("Accept", "application/json")
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;
        let resp = check_status(resp, "refresh")?;
        Ok(resp.json().await?)
    }

    async fn verify(&self, access_token: &str) -> Result<User, AuthError> {
        let resp = self
            .client
            .get(self.url(&self.verify_path))
            .header("Accept", "application/json")
            .bearer_auth(access_token)
            .send()
            .await?;
        let resp = check_status(resp, "verify")?;
        let payload: VerifyResponse = resp.json().await?;
        Ok(payload.user)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

fn check_status(resp: reqwest::Response, operation: &str) -> Result<reqwest::Response, AuthError> {
    let status = resp.status();
    debug!(operation, status = status.as_u16(), "Auth endpoint responded");
    if status.is_success() {
        return Ok(resp);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::Rejected {
            status: status.as_u16(),
        }),
        s if s.is_server_error() => Err(AuthError::Server { status: s.as_u16() }),
        s => Err(AuthError::InvalidResponse(format!(
            "{operation} request failed with status {s}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let endpoint = HttpAuthEndpoint::new("http://localhost:3000/api/");
        assert_eq!(endpoint.base_url(), "http://localhost:3000/api");
        assert_eq!(endpoint.url(DEFAULT_LOGIN_PATH), "http://localhost:3000/api/auth/login");
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("a@b.com", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("a@b.com"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn refresh_request_uses_camel_case() {
        let body = serde_json::to_value(RefreshRequest { refresh_token: "R1" }).unwrap();
        assert_eq!(body, serde_json::json!({ "refreshToken": "R1" }));
    }

    #[test]
    fn refresh_response_user_is_optional() {
        let resp: RefreshResponse =
            serde_json::from_value(serde_json::json!({ "accessToken": "T2" })).unwrap();
        assert_eq!(resp.access_token, "T2");
        assert!(resp.user.is_none());
    }
}
