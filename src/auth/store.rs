use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// Storage keys used by the session core.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const AUTH_STATE: &str = "authState";
    pub const USER: &str = "user";
}

const SESSION_FILE_VERSION: u32 = 1;

/// Persistent key-value storage for session-scoped values.
///
/// `clear` drops every key the store holds, not only the well-known ones.
pub trait SessionStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, AuthError>;
    fn save(&self, key: &str, value: &str) -> Result<(), AuthError>;
    fn remove(&self, key: &str) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// Configuration for file-backed session storage.
#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    pub base_dir: PathBuf,
}

impl SessionStoreConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }
}

/// File-backed session store: one TOML document holding every key.
///
/// Writes go through a temp file and a rename, and the file is readable by
/// the owner only.
///
/// # Example
/// ```no_run
/// use fanhub_session::auth::{FileSessionStore, SessionStore, SessionStoreConfig};
///
/// let store = FileSessionStore::new(SessionStoreConfig::new("/tmp/fanhub".into()));
/// store.save("accessToken", "T1")?;
/// assert_eq!(store.load("accessToken")?.as_deref(), Some("T1"));
/// # Ok::<(), fanhub_session::auth::AuthError>(())
/// ```
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(config: SessionStoreConfig) -> Self {
        Self {
            path: config.base_dir.join("session.toml"),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: SessionFile = toml::from_str(&raw)?;
        if file.version != SESSION_FILE_VERSION {
            return Err(AuthError::Serialization(format!(
                "Unsupported session file version {} at {}",
                file.version,
                self.path.display()
            )));
        }
        Ok(file.entries)
    }

    fn write_entries(&self, entries: BTreeMap<String, String>) -> Result<(), AuthError> {
        let file = SessionFile {
            version: SESSION_FILE_VERSION,
            saved_at: Utc::now(),
            entries,
        };
        let serialized = toml::to_string(&file)?;
        atomic_write(&self.path, serialized.as_bytes())
    }

    fn update<F>(&self, apply: F) -> Result<(), AuthError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut entries = self.read_entries()?;
        apply(&mut entries);
        self.write_entries(entries)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, key: &str) -> Result<Option<String>, AuthError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(self.read_entries()?.remove(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> Result<(), AuthError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

/// Volatile store for sessions that must not outlive the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.entries().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        self.entries().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        self.entries().clear();
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    saved_at: DateTime<Utc>,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AuthError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file_name = path.file_name().ok_or_else(|| {
        AuthError::Io(format!("Session path {} has no file name", path.display()))
    })?;

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_path = path.with_file_name(format!(
        ".{}.tmp-{}-{nonce}",
        file_name.to_string_lossy(),
        std::process::id()
    ));

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let write_result = (|| -> std::io::Result<()> {
        let mut temp_file = options.open(&temp_path)?;
        temp_file.write_all(data)?;
        temp_file.sync_all()?;
        Ok(())
    })();

    if let Err(err) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }

    #[cfg(unix)]
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;

    Ok(())
}
