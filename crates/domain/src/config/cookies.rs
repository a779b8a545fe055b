use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Primary (cookie) store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-store settings for the primary store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieStoreConfig {
    /// Initial state of this store's own enable gate.  The host-wide gate
    /// still applies on top of it.
    #[serde(default = "d_true")]
    pub enabled: bool,

    /// Domain used when a write does not name one.
    #[serde(default)]
    pub domain: Option<String>,

    /// Path used when a write does not name one (`/` when unset).
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for CookieStoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            domain: None,
            path: None,
        }
    }
}

fn d_true() -> bool {
    true
}
