//! Configuration (layered: defaults > config file > environment).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bon::Builder;
use serde::Deserialize;

use crate::auth::store::{FileSessionStore, SessionStoreConfig};
use crate::error::SessionError;

pub const API_URL_ENV: &str = "FANHUB_API_URL";
pub const STATE_DIR_ENV: &str = "FANHUB_STATE_DIR";
pub const REQUEST_TIMEOUT_ENV: &str = "FANHUB_REQUEST_TIMEOUT_MS";

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const CONFIG_FILE_NAME: &str = "config.toml";

/// Settings for the session core.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use fanhub_session::config::SessionConfig;
///
/// let config = SessionConfig::builder()
///     .api_base_url("https://api.fanhub.example")
///     .request_timeout(Duration::from_secs(5))
///     .build();
/// assert_eq!(config.api_base_url, "https://api.fanhub.example");
/// ```
#[derive(Debug, Clone, Builder)]
pub struct SessionConfig {
    /// Base URL the `/auth/*` routes are resolved against.
    #[builder(into, default = DEFAULT_API_BASE_URL.to_string())]
    pub api_base_url: String,
    /// Directory holding `session.toml` and the optional `config.toml`.
    #[builder(into, default = default_state_dir())]
    pub state_dir: PathBuf,
    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    pub request_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// On-disk form of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub api_base_url: Option<String>,
    pub request_timeout_ms: Option<u64>,
}

impl SessionConfig {
    /// Resolve from defaults, `<state_dir>/config.toml` and the process
    /// environment (a `.env` file is loaded first when present).
    pub fn from_env() -> Result<Self, SessionError> {
        let _ = dotenvy::dotenv();
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Same as [`SessionConfig::from_env`] with an explicit variable lookup.
    pub fn resolve<F>(lookup: F) -> Result<Self, SessionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = lookup(STATE_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            config.state_dir = PathBuf::from(dir);
        }
        if let Some(file) = Self::load_file(&config.config_path())? {
            config.apply_file(file);
        }
        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Read a config file. A missing file is not an error.
    pub fn load_file(path: &Path) -> Result<Option<ConfigFile>, SessionError> {
        let raw = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(SessionError::Io(err)),
        };
        toml::from_str(&raw).map(Some).map_err(|err| {
            SessionError::Configuration(format!("Invalid config file {}: {err}", path.display()))
        })
    }

    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(url) = file.api_base_url {
            self.api_base_url = url;
        }
        if let Some(ms) = file.request_timeout_ms {
            self.request_timeout = Duration::from_millis(ms);
        }
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), SessionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(raw) = lookup(REQUEST_TIMEOUT_ENV) {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                SessionError::Configuration(format!(
                    "{REQUEST_TIMEOUT_ENV} must be a whole number of milliseconds, got {raw:?}"
                ))
            })?;
            self.request_timeout = Duration::from_millis(ms);
        }
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.state_dir.join(CONFIG_FILE_NAME)
    }

    /// File-backed session store rooted at the state directory.
    pub fn session_store(&self) -> FileSessionStore {
        FileSessionStore::new(SessionStoreConfig::new(self.state_dir.clone()))
    }
}

fn default_state_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".fanhub"))
        .unwrap_or_else(|| PathBuf::from(".fanhub"))
}
