use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session policy
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 30 minutes without activity ends a session.
pub const DEFAULT_SESSION_RENEWAL_MS: i64 = 1_800_000;
/// 24 hours after acquisition a session ends regardless of activity.
pub const DEFAULT_SESSION_EXPIRATION_MS: i64 = 86_400_000;
/// 22 base64 characters carry 132 bits, close to a GUID.
pub const DEFAULT_ID_LENGTH: usize = 22;
/// Minimum gap between two primary-store writes for a live session.
pub const DEFAULT_COOKIE_UPDATE_INTERVAL_MS: i64 = 60_000;

/// Accessors the session manager reads on every call.  Values may change
/// between calls, so implementations should not be snapshotted by callers.
pub trait SessionPolicy: Send + Sync {
    fn session_renewal_ms(&self) -> i64 {
        DEFAULT_SESSION_RENEWAL_MS
    }

    /// `0` disables age-based expiry; entries are then written without a TTL.
    fn session_expiration_ms(&self) -> i64 {
        DEFAULT_SESSION_EXPIRATION_MS
    }

    fn cookie_domain(&self) -> Option<String> {
        None
    }

    fn name_prefix(&self) -> Option<String> {
        None
    }

    fn id_length(&self) -> usize {
        DEFAULT_ID_LENGTH
    }

    fn cookie_update_interval_ms(&self) -> i64 {
        DEFAULT_COOKIE_UPDATE_INTERVAL_MS
    }
}

/// Session identity configuration as loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Inactivity window in milliseconds.
    #[serde(default = "d_renewal_ms")]
    pub renewal_ms: i64,

    /// Absolute session lifetime in milliseconds.  `0` means the session
    /// never expires by age and lives as long as the primary store keeps it.
    #[serde(default = "d_expiration_ms")]
    pub expiration_ms: i64,

    /// Domain attribute applied to primary-store entries.
    #[serde(default)]
    pub cookie_domain: Option<String>,

    /// Prepended to every storage name (`<prefix>ai_session`).
    #[serde(default)]
    pub name_prefix: Option<String>,

    #[serde(default = "d_id_length")]
    pub id_length: usize,

    #[serde(default = "d_cookie_update_interval_ms")]
    pub cookie_update_interval_ms: i64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            renewal_ms: d_renewal_ms(),
            expiration_ms: d_expiration_ms(),
            cookie_domain: None,
            name_prefix: None,
            id_length: d_id_length(),
            cookie_update_interval_ms: d_cookie_update_interval_ms(),
        }
    }
}

impl SessionPolicy for SessionsConfig {
    fn session_renewal_ms(&self) -> i64 {
        self.renewal_ms
    }

    fn session_expiration_ms(&self) -> i64 {
        self.expiration_ms
    }

    fn cookie_domain(&self) -> Option<String> {
        self.cookie_domain.clone().filter(|d| !d.is_empty())
    }

    fn name_prefix(&self) -> Option<String> {
        self.name_prefix.clone().filter(|p| !p.is_empty())
    }

    fn id_length(&self) -> usize {
        self.id_length
    }

    fn cookie_update_interval_ms(&self) -> i64 {
        self.cookie_update_interval_ms
    }
}

/// A [`SessionsConfig`] that can be changed while managers hold it.
#[derive(Debug, Clone, Default)]
pub struct SharedSessionsConfig {
    inner: Arc<RwLock<SessionsConfig>>,
}

impl SharedSessionsConfig {
    pub fn new(config: SessionsConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Apply a change that every holder observes on its next read.
    pub fn update(&self, f: impl FnOnce(&mut SessionsConfig)) {
        f(&mut self.inner.write());
    }

    pub fn snapshot(&self) -> SessionsConfig {
        self.inner.read().clone()
    }
}

impl SessionPolicy for SharedSessionsConfig {
    fn session_renewal_ms(&self) -> i64 {
        self.inner.read().session_renewal_ms()
    }

    fn session_expiration_ms(&self) -> i64 {
        self.inner.read().session_expiration_ms()
    }

    fn cookie_domain(&self) -> Option<String> {
        self.inner.read().cookie_domain()
    }

    fn name_prefix(&self) -> Option<String> {
        self.inner.read().name_prefix()
    }

    fn id_length(&self) -> usize {
        self.inner.read().id_length()
    }

    fn cookie_update_interval_ms(&self) -> i64 {
        self.inner.read().cookie_update_interval_ms()
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_renewal_ms() -> i64 {
    DEFAULT_SESSION_RENEWAL_MS
}
fn d_expiration_ms() -> i64 {
    DEFAULT_SESSION_EXPIRATION_MS
}
fn d_id_length() -> usize {
    DEFAULT_ID_LENGTH
}
fn d_cookie_update_interval_ms() -> i64 {
    DEFAULT_COOKIE_UPDATE_INTERVAL_MS
}
