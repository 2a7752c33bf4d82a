//! Persisted token storage behind a common trait, with three backends:
//! in-memory (tests only), file (`${XDG_CONFIG_HOME}/<cliName>/auth.json`,
//! mode 0600, atomic writes), and the OS keyring.
//!
//! Resolution order is keyring -> file -> memory unless overridden, e.g. by
//! [`constants::ENV_ROSA_DISABLE_KEYRING`].

use crate::atomic::atomic_write_sync;
use crate::constants;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The persisted shape of a resolved login: an access token for
/// `Authorization` headers, an optional refresh token, and the username
/// extracted from the access token's claims (if any).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredAuth {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub username: Option<String>,
}

impl StoredAuth {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

pub trait AuthStorage: Send + Sync {
    /// # Errors
    /// Returns an error if the backend exists but cannot be read.
    fn load(&self) -> Result<Option<StoredAuth>, Error>;

    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn save(&self, auth: &StoredAuth) -> Result<(), Error>;

    /// # Errors
    /// Returns an error if the backend exists but cannot be cleared.
    fn clear(&self) -> Result<(), Error>;
}

/// In-memory backend. Used by tests; never selected by [`default_storage`].
#[derive(Default)]
pub struct MemoryAuthStorage {
    inner: Mutex<Option<StoredAuth>>,
}

impl MemoryAuthStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthStorage for MemoryAuthStorage {
    fn load(&self) -> Result<Option<StoredAuth>, Error> {
        Ok(self.inner.lock().unwrap().clone())
    }

    fn save(&self, auth: &StoredAuth) -> Result<(), Error> {
        *self.inner.lock().unwrap() = Some(auth.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.inner.lock().unwrap() = None;
        Ok(())
    }
}

/// File-backed storage at a fixed path, written atomically with mode 0600
/// on Unix.
pub struct FileAuthStorage {
    path: PathBuf,
}

impl FileAuthStorage {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn restrict_permissions(path: &Path) {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(metadata) = std::fs::metadata(path) {
                let mut perms = metadata.permissions();
                perms.set_mode(0o600);
                let _ = std::fs::set_permissions(path, perms);
            }
        }
        #[cfg(not(unix))]
        {
            let _ = path;
        }
    }
}

impl AuthStorage for FileAuthStorage {
    fn load(&self) -> Result<Option<StoredAuth>, Error> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let auth: StoredAuth = serde_json::from_str(&content)?;
        Ok(Some(auth))
    }

    fn save(&self, auth: &StoredAuth) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_vec_pretty(auth)?;
        atomic_write_sync(&self.path, &content)?;
        Self::restrict_permissions(&self.path);
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// OS keyring-backed storage, gated behind the `keyring-storage` feature
/// (on by default).
#[cfg(feature = "keyring-storage")]
pub struct KeyringAuthStorage {
    service: String,
    user: String,
}

#[cfg(feature = "keyring-storage")]
impl KeyringAuthStorage {
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            user: "default".to_string(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, Error> {
        keyring::Entry::new(&self.service, &self.user)
            .map_err(|e| Error::internal(format!("failed to open keyring entry: {e}")))
    }
}

#[cfg(feature = "keyring-storage")]
impl AuthStorage for KeyringAuthStorage {
    fn load(&self) -> Result<Option<StoredAuth>, Error> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(serialized) => {
                let auth: StoredAuth = serde_json::from_str(&serialized)?;
                Ok(Some(auth))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::internal(format!("keyring read failed: {e}"))),
        }
    }

    fn save(&self, auth: &StoredAuth) -> Result<(), Error> {
        let entry = self.entry()?;
        let serialized = serde_json::to_string(auth)?;
        entry
            .set_password(&serialized)
            .map_err(|e| Error::internal(format!("keyring write failed: {e}")))
    }

    fn clear(&self) -> Result<(), Error> {
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::internal(format!("keyring delete failed: {e}"))),
        }
    }
}

/// Name used as the keyring service identifier.
const KEYRING_SERVICE: &str = "cliforge";

/// Picks the best available backend: keyring (unless disabled), else file,
/// rooted at `config_dir`.
#[must_use]
pub fn default_storage(config_dir: &Path) -> Box<dyn AuthStorage> {
    let keyring_disabled = std::env::var(constants::ENV_ROSA_DISABLE_KEYRING).is_ok();

    #[cfg(feature = "keyring-storage")]
    if !keyring_disabled {
        return Box::new(KeyringAuthStorage::new(KEYRING_SERVICE));
    }
    #[cfg(not(feature = "keyring-storage"))]
    let _ = keyring_disabled;

    Box::new(FileAuthStorage::new(config_dir.join(constants::AUTH_FILENAME)))
}
