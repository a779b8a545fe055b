//! JSON-file backends so state outlives the process, the way a browser
//! profile outlives a page load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use sk_domain::clock::Clock;
use sk_domain::error::Result;

use super::jar::{CookieJar, StoredCookie};
use super::{CookieBackend, ItemBackend};
use crate::error::BackendError;

fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    if !path.exists() {
        return Ok(T::default());
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "discarding unreadable state file");
        T::default()
    }))
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> std::result::Result<(), BackendError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| BackendError::Io(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| BackendError::Io(e.to_string()))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cookie jar
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cookie jar persisted to a JSON file after every write.
pub struct FileCookieJar {
    path: PathBuf,
    jar: Mutex<CookieJar>,
    clock: Arc<dyn Clock>,
}

impl FileCookieJar {
    pub fn open(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self> {
        let path = path.into();
        let mut jar: CookieJar = load_json(&path)?;
        jar.purge_expired(clock.now_ms());

        tracing::debug!(cookies = jar.len(), path = %path.display(), "cookie jar loaded");

        Ok(Self {
            path,
            jar: Mutex::new(jar),
            clock,
        })
    }

    pub fn cookie(&self, name: &str) -> Option<StoredCookie> {
        self.jar.lock().get(name, self.clock.now_ms()).cloned()
    }

    /// Remove every cookie and persist the empty jar.
    pub fn clear(&self) -> std::result::Result<(), BackendError> {
        let mut jar = self.jar.lock();
        jar.clear();
        save_json(&self.path, &*jar)
    }
}

impl CookieBackend for FileCookieJar {
    fn read_all(&self) -> std::result::Result<String, BackendError> {
        Ok(self.jar.lock().render(self.clock.now_ms()))
    }

    fn write(&self, name: &str, value: &str) -> std::result::Result<(), BackendError> {
        let now = self.clock.now_ms();
        let mut jar = self.jar.lock();
        jar.apply(name, value, now);
        jar.purge_expired(now);
        save_json(&self.path, &*jar)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Item store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Key-value items persisted to a JSON file after every change.
pub struct FileItemStore {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileItemStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items: BTreeMap<String, String> = load_json(&path)?;
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }
}

impl ItemBackend for FileItemStore {
    fn get_item(&self, key: &str) -> std::result::Result<Option<String>, BackendError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> std::result::Result<(), BackendError> {
        let mut items = self.items.lock();
        items.insert(key.to_owned(), value.to_owned());
        save_json(&self.path, &*items)
    }

    fn remove_item(&self, key: &str) -> std::result::Result<(), BackendError> {
        let mut items = self.items.lock();
        if items.remove(key).is_some() {
            save_json(&self.path, &*items)?;
        }
        Ok(())
    }
}
