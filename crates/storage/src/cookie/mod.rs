//! Primary store: cookie-backed, with per-entry attributes and expiry.

pub mod parts;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sk_domain::config::CookieStoreConfig;
use sk_domain::diagnostics::{DiagnosticEvent, DiagnosticId};

use crate::error::{BackendError, StoreError};
use crate::host::StorageHost;
use crate::store::{EntryAttributes, KeyValueStore, StoreKind};
use parts::{http_date, CookieParts, EXPIRED_DATE};

const STORE: &str = "primary";

/// Whose flag this store's own gate is.
enum Gate {
    /// Independent of every other store.
    Own(AtomicBool),
    /// The host-wide cookie gate.
    Host,
}

pub struct CookieStore {
    host: Arc<StorageHost>,
    config: CookieStoreConfig,
    gate: Gate,
}

impl CookieStore {
    pub(crate) fn new(host: Arc<StorageHost>, config: CookieStoreConfig) -> Self {
        let gate = Gate::Own(AtomicBool::new(config.enabled));
        Self { host, config, gate }
    }

    pub(crate) fn host_default(host: Arc<StorageHost>, config: CookieStoreConfig) -> Self {
        Self {
            host,
            config,
            gate: Gate::Host,
        }
    }

    pub fn host(&self) -> &Arc<StorageHost> {
        &self.host
    }

    /// Whether this is the host's shared store.
    pub fn is_host_default(&self) -> bool {
        matches!(self.gate, Gate::Host)
    }

    fn own_enabled(&self) -> bool {
        match &self.gate {
            Gate::Own(flag) => flag.load(Ordering::SeqCst),
            Gate::Host => self.host.cookies_gate(),
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if !self.own_enabled() || !self.host.cookies_gate() {
            return Err(StoreError::Disabled { store: STORE });
        }
        if !self.host.cookies_available() {
            return Err(StoreError::Unavailable { store: STORE });
        }
        Ok(())
    }

    fn backend_failed(&self, e: BackendError) -> StoreError {
        self.host.diagnostics().record(
            DiagnosticEvent::warning(DiagnosticId::CannotAccessCookie, "Cannot access cookies")
                .with_exception(&e),
        );
        self.host.mark_cookies_unavailable(&e.to_string());
        StoreError::Backend {
            store: STORE,
            source: e,
        }
    }

    /// Build the full assignment written for `value`: the caller's own
    /// segments first, then any of domain, expiry, secure/SameSite and path
    /// the caller did not already supply.
    pub fn format_assignment(&self, value: &str, attrs: &EntryAttributes) -> String {
        let mut parts = CookieParts::parse(value);

        let domain = attrs.domain.clone().or_else(|| self.config.domain.clone());
        if let Some(domain) = domain.filter(|d| !d.is_empty()) {
            parts.push_absent("domain", Some(domain));
        }

        if let Some(max_age) = attrs.max_age_secs {
            if !parts.contains("expires") {
                let expire_ms = self
                    .host
                    .clock()
                    .now_ms()
                    .saturating_add((max_age * 1000.0) as i64);
                // Ignore nonsensical deadlines at or before the epoch.
                if expire_ms > 0 {
                    if let Some(date) = http_date(expire_ms) {
                        parts.push("expires", Some(date));
                    }
                }
            }
            parts.push_absent("max-age", Some(max_age.to_string()));
        }

        if self.host.config().secure_context {
            parts.push_absent("secure", None);
            if !parts.contains("SameSite") && self.host.allows_same_site_none() {
                parts.push("SameSite", Some("None".into()));
            }
        }

        let path = attrs
            .path
            .clone()
            .or_else(|| self.config.path.clone())
            .unwrap_or_else(|| "/".into());
        parts.push_absent("path", Some(path));

        parts.format()
    }

    /// Delete `name` at an explicit path.
    pub fn delete_at(&self, name: &str, path: &str) -> Result<(), StoreError> {
        self.check()?;
        let value = format!(";path={path};expires={EXPIRED_DATE}");
        self.host
            .cookie_backend()
            .write(name, &value)
            .map_err(|e| self.backend_failed(e))
    }
}

impl KeyValueStore for CookieStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Primary
    }

    fn supports_attributes(&self) -> bool {
        true
    }

    fn is_enabled(&self) -> bool {
        self.check().is_ok()
    }

    fn set_enabled(&self, enabled: bool) {
        match &self.gate {
            Gate::Own(flag) => flag.store(enabled, Ordering::SeqCst),
            Gate::Host => self.host.set_cookies_enabled(enabled),
        }
    }

    fn try_get(&self, name: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        let raw = self
            .host
            .cookie_backend()
            .read_all()
            .map_err(|e| self.backend_failed(e))?;
        Ok(self
            .host
            .cookie_value(&raw, name)
            .filter(|v| !v.is_empty()))
    }

    fn try_set(
        &self,
        name: &str,
        value: &str,
        attrs: &EntryAttributes,
    ) -> Result<(), StoreError> {
        self.check()?;
        let assignment = self.format_assignment(value, attrs);
        self.host
            .cookie_backend()
            .write(name, &assignment)
            .map_err(|e| self.backend_failed(e))
    }

    fn try_delete(&self, name: &str) -> Result<(), StoreError> {
        let path = self.config.path.clone().unwrap_or_else(|| "/".into());
        self.delete_at(name, &path)
    }
}
