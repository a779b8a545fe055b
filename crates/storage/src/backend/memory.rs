use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use sk_domain::clock::{Clock, SystemClock};

use super::jar::{CookieJar, StoredCookie};
use super::{CookieBackend, ItemBackend};
use crate::error::BackendError;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cookie jar
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// In-process cookie jar.  Can be told to refuse access to simulate a page
/// where cookies are blocked.
pub struct MemoryCookieJar {
    jar: Mutex<CookieJar>,
    clock: Arc<dyn Clock>,
    blocked: AtomicBool,
    writes: AtomicUsize,
}

impl Default for MemoryCookieJar {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MemoryCookieJar {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            jar: Mutex::new(CookieJar::default()),
            clock,
            blocked: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent read and write fail with `AccessDenied`.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Number of writes that reached the jar, deletes included.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Live cookie with all recorded attributes.
    pub fn cookie(&self, name: &str) -> Option<StoredCookie> {
        self.jar.lock().get(name, self.clock.now_ms()).cloned()
    }

    /// Forget every cookie, as a user clearing site data would.
    pub fn clear(&self) {
        self.jar.lock().clear();
    }

    fn check_access(&self) -> Result<(), BackendError> {
        if self.blocked.load(Ordering::SeqCst) {
            return Err(BackendError::AccessDenied("cookies are blocked".into()));
        }
        Ok(())
    }
}

impl CookieBackend for MemoryCookieJar {
    fn read_all(&self) -> Result<String, BackendError> {
        self.check_access()?;
        Ok(self.jar.lock().render(self.clock.now_ms()))
    }

    fn write(&self, name: &str, value: &str) -> Result<(), BackendError> {
        self.check_access()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.jar.lock().apply(name, value, self.clock.now_ms());
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Item store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// In-process item store with fault injection for reads and writes.
#[derive(Default)]
pub struct MemoryItemStore {
    items: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Fail `set_item` and `remove_item`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `set_item` calls.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Read an item directly, bypassing fault injection.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.items.lock().get(key).cloned()
    }

    /// Seed an item directly, bypassing fault injection.
    pub fn insert(&self, key: &str, value: &str) {
        self.items.lock().insert(key.to_owned(), value.to_owned());
    }
}

impl ItemBackend for MemoryItemStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::AccessDenied("storage read refused".into()));
        }
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::QuotaExceeded);
        }
        self.items.lock().insert(key.to_owned(), value.to_owned());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::AccessDenied("storage removal refused".into()));
        }
        self.items.lock().remove(key);
        Ok(())
    }
}
