//! The interface both persistence tiers share.

use crate::error::StoreError;

/// Which tier a store belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Primary,
    Fallback,
}

impl StoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

/// Per-entry attributes.  Stores without the attribute capability ignore
/// them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryAttributes {
    pub domain: Option<String>,
    /// Lifetime in seconds; `None` leaves the backend default (for cookies,
    /// the browser session).
    pub max_age_secs: Option<f64>,
    pub path: Option<String>,
}

impl EntryAttributes {
    pub fn with_max_age(mut self, secs: f64) -> Self {
        self.max_age_secs = Some(secs);
        self
    }

    pub fn with_domain(mut self, domain: Option<String>) -> Self {
        self.domain = domain;
        self
    }
}

/// A named-string store that degrades to a no-op when it cannot be used.
///
/// The `try_*` methods report why an operation did nothing; the plain
/// methods swallow that and return empty results.
pub trait KeyValueStore: Send + Sync {
    fn kind(&self) -> StoreKind;

    /// Whether `domain`, `path` and TTL attributes are honoured.
    fn supports_attributes(&self) -> bool;

    /// Instance gate AND host-wide gate AND backend availability.
    fn is_enabled(&self) -> bool;

    /// Flip this store's own gate.
    fn set_enabled(&self, enabled: bool);

    fn try_get(&self, name: &str) -> Result<Option<String>, StoreError>;

    fn try_set(&self, name: &str, value: &str, attrs: &EntryAttributes)
        -> Result<(), StoreError>;

    fn try_delete(&self, name: &str) -> Result<(), StoreError>;

    /// Stored value, or an empty string when absent or unavailable.
    fn get(&self, name: &str) -> String {
        match self.try_get(name) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                tracing::debug!(store = self.kind().as_str(), name, error = %e, "get skipped");
                String::new()
            }
        }
    }

    fn set(&self, name: &str, value: &str, attrs: &EntryAttributes) {
        if let Err(e) = self.try_set(name, value, attrs) {
            tracing::debug!(store = self.kind().as_str(), name, error = %e, "set skipped");
        }
    }

    fn delete(&self, name: &str) {
        if let Err(e) = self.try_delete(name) {
            tracing::debug!(store = self.kind().as_str(), name, error = %e, "delete skipped");
        }
    }
}
