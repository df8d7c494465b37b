//! Cached bearer token and profile, persisted as a small JSON file.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::models::auth::UserProfile;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoredAuth {
    pub token: String,
    pub user: UserProfile,
}

/// Shared by the API client (reads the token, purges on 401) and the GUI.
#[derive(Debug, Default)]
pub struct AuthStore {
    path: Option<PathBuf>,
    current: RwLock<Option<StoredAuth>>,
}

impl AuthStore {
    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the cache file, starting signed out if it is missing or unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<StoredAuth>(&contents) {
                Ok(auth) => {
                    info!("Restored cached login for {}", auth.user.name);
                    Some(auth)
                }
                Err(e) => {
                    warn!("Ignoring unreadable token cache {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read token cache {}: {}", path.display(), e);
                None
            }
        };
        Self {
            path: Some(path),
            current: RwLock::new(current),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|auth| auth.token.clone())
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().as_ref().map(|auth| auth.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    pub fn store(&self, auth: StoredAuth) {
        if let Some(path) = &self.path {
            if let Err(e) = write_cache(path, &auth) {
                warn!("Failed to persist token cache {}: {}", path.display(), e);
            }
        }
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(auth);
    }

    /// Forget the token, in memory and on disk.
    pub fn purge(&self) {
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_none() {
            return;
        }
        debug!("Purging cached token");
        if let Some(path) = &self.path {
            if let Err(e) = fs::remove_file(path) {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Failed to remove token cache {}: {}", path.display(), e);
                }
            }
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<StoredAuth>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn write_cache(path: &Path, auth: &StoredAuth) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec(auth)?)?;
    Ok(())
}
