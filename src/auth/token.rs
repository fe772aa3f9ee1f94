use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access/refresh credential pair held by a session.
///
/// Each half is persisted independently. Neither present means logged out;
/// only a refresh token present means the session can still be recovered.
///
/// # Example
/// ```
/// use fanhub_session::auth::TokenPair;
///
/// let tokens = TokenPair::new("access", "refresh");
/// assert!(tokens.is_complete());
/// assert!(!TokenPair::default().has_any());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    pub fn has_any(&self) -> bool {
        self.access_token.is_some() || self.refresh_token.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some()
    }

    /// Expiry of the access token, read from the `exp` claim when the token
    /// is a JWT. Opaque tokens yield `None`.
    pub fn access_expires_at(&self) -> Option<DateTime<Utc>> {
        self.access_token.as_deref().and_then(jwt_expiry)
    }
}

/// Identifier of a platform account. The backend issues integer ids; some
/// deployments use string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// Account record returned by the auth endpoints.
///
/// Fields the session core does not interpret are kept in `extra` so they
/// survive a persist/restore cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            email: None,
            username: None,
            display_name: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Best human-readable label for the account.
    pub fn label(&self) -> String {
        self.display_name
            .clone()
            .or_else(|| self.username.clone())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| format!("user {}", self.id))
    }
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: Option<i64>,
}

fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claim: ExpiryClaim = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claim.exp?, 0)
}
