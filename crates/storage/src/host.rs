//! The hosting page: backends plus every value that is shared by all stores
//! built on them.
//!
//! Probe results, the SameSite decision and the parsed cookie jar are cached
//! here for the host lifetime, as are the host-wide enable gates.  Stores
//! created from one host see each other's effects on those values and
//! nothing else.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use sk_domain::clock::{Clock, SystemClock};
use sk_domain::config::{CookieStoreConfig, HostConfig};
use sk_domain::diagnostics::{DiagnosticEvent, DiagnosticId, DiagnosticSink, TracingSink};
use sk_domain::trace::TraceEvent;

use crate::backend::{CookieBackend, ItemBackend, MemoryCookieJar, MemoryItemStore};
use crate::cookie::parts::{parse_cookie_string, EXPIRED_DATE};
use crate::cookie::CookieStore;
use crate::error::BackendError;
use crate::item::ItemStore;
use crate::same_site::ua_disallows_same_site_none;

#[derive(Default)]
struct HostState {
    cookies_available: Option<bool>,
    storage_available: Option<bool>,
    same_site_allowed: Option<bool>,
    parsed: ParsedJar,
}

/// Last jar string read and its parsed form.
#[derive(Default)]
struct ParsedJar {
    raw: Option<String>,
    values: HashMap<String, String>,
    parses: usize,
}

pub struct StorageHost {
    cookies: Arc<dyn CookieBackend>,
    items: Arc<dyn ItemBackend>,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn DiagnosticSink>,
    config: HostConfig,
    default_cookie_config: CookieStoreConfig,
    cookies_enabled: AtomicBool,
    storage_enabled: AtomicBool,
    state: Mutex<HostState>,
}

impl StorageHost {
    pub fn builder() -> StorageHostBuilder {
        StorageHostBuilder::default()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn diagnostics(&self) -> &Arc<dyn DiagnosticSink> {
        &self.diagnostics
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    // ── Stores ──────────────────────────────────────────────────────

    /// The shared cookie store.  Its own gate is the host-wide cookie gate,
    /// so disabling it disables every cookie store on this host.
    pub fn default_cookie_store(self: &Arc<Self>) -> CookieStore {
        CookieStore::host_default(Arc::clone(self), self.default_cookie_config.clone())
    }

    /// A cookie store with its own gate, independent of other instances.
    pub fn cookie_store(self: &Arc<Self>, config: CookieStoreConfig) -> CookieStore {
        CookieStore::new(Arc::clone(self), config)
    }

    pub fn item_store(self: &Arc<Self>) -> ItemStore {
        ItemStore::new(Arc::clone(self))
    }

    // ── Host-wide gates ─────────────────────────────────────────────

    pub fn cookies_enabled(&self) -> bool {
        self.cookies_enabled.load(Ordering::SeqCst) && self.cookies_available()
    }

    pub fn enable_cookies(&self) {
        self.set_cookies_enabled(true);
    }

    /// Turns cookies off for every store on this host, whatever their own
    /// gates say.
    pub fn disable_cookies(&self) {
        self.set_cookies_enabled(false);
    }

    pub(crate) fn cookies_gate(&self) -> bool {
        self.cookies_enabled.load(Ordering::SeqCst)
    }

    pub(crate) fn set_cookies_enabled(&self, enabled: bool) {
        self.cookies_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn storage_enabled(&self) -> bool {
        self.storage_enabled.load(Ordering::SeqCst) && self.storage_available()
    }

    pub fn enable_storage(&self) {
        self.storage_enabled.store(true, Ordering::SeqCst);
    }

    /// Stop every fallback store on this host from touching its backend.
    pub fn disable_storage(&self) {
        self.storage_enabled.store(false, Ordering::SeqCst);
    }

    pub(crate) fn storage_gate(&self) -> bool {
        self.storage_enabled.load(Ordering::SeqCst)
    }

    // ── Availability ────────────────────────────────────────────────

    /// Probe the cookie backend on first call; the answer never changes
    /// afterwards except to become `false` when the backend fails.
    pub fn cookies_available(&self) -> bool {
        if let Some(known) = self.state.lock().cookies_available {
            return known;
        }

        let available = match self.round_trip_cookie() {
            Ok(ok) => ok,
            Err(e) => {
                self.diagnostics.record(
                    DiagnosticEvent::warning(
                        DiagnosticId::CannotAccessCookie,
                        "Cannot access cookies",
                    )
                    .with_exception(&e),
                );
                false
            }
        };

        TraceEvent::StoreProbed {
            store: "primary".into(),
            available,
        }
        .emit();

        *self.state.lock().cookies_available.get_or_insert(available)
    }

    pub fn storage_available(&self) -> bool {
        if let Some(known) = self.state.lock().storage_available {
            return known;
        }

        let available = self.round_trip_item().unwrap_or(false);

        TraceEvent::StoreProbed {
            store: "fallback".into(),
            available,
        }
        .emit();

        *self.state.lock().storage_available.get_or_insert(available)
    }

    pub(crate) fn mark_cookies_unavailable(&self, reason: &str) {
        self.state.lock().cookies_available = Some(false);
        TraceEvent::StoreDisabled {
            store: "primary".into(),
            reason: reason.to_owned(),
        }
        .emit();
    }

    pub(crate) fn mark_storage_unavailable(&self, reason: &str) {
        self.state.lock().storage_available = Some(false);
        TraceEvent::StoreDisabled {
            store: "fallback".into(),
            reason: reason.to_owned(),
        }
        .emit();
    }

    fn round_trip_cookie(&self) -> Result<bool, BackendError> {
        let key = format!("sk_probe_{}", Uuid::new_v4().simple());
        let token = Uuid::new_v4().simple().to_string();

        self.cookies.write(&key, &format!("{token};path=/"))?;
        let raw = self.cookies.read_all()?;
        let found = parse_cookie_string(&raw).get(&key) == Some(&token);
        self.cookies
            .write(&key, &format!(";path=/;expires={EXPIRED_DATE}"))?;

        Ok(found)
    }

    fn round_trip_item(&self) -> Result<bool, BackendError> {
        let key = format!("sk_probe_{}", Uuid::new_v4().simple());
        let token = Uuid::new_v4().simple().to_string();

        self.items.set_item(&key, &token)?;
        let found = self.items.get_item(&key)?.as_deref() == Some(token.as_str());
        self.items.remove_item(&key)?;

        Ok(found)
    }

    // ── SameSite ────────────────────────────────────────────────────

    /// Whether `SameSite=None` may be sent, decided once per host.
    pub fn allows_same_site_none(&self) -> bool {
        let mut state = self.state.lock();
        *state.same_site_allowed.get_or_insert_with(|| {
            !self
                .config
                .user_agent
                .as_deref()
                .is_some_and(ua_disallows_same_site_none)
        })
    }

    // ── Cookie jar parsing ──────────────────────────────────────────

    /// Look `name` up in `raw`, re-parsing only when `raw` differs from the
    /// string parsed last time.
    pub(crate) fn cookie_value(&self, raw: &str, name: &str) -> Option<String> {
        let mut state = self.state.lock();
        let parsed = &mut state.parsed;
        if parsed.raw.as_deref() != Some(raw) {
            parsed.values = parse_cookie_string(raw);
            parsed.raw = Some(raw.to_owned());
            parsed.parses += 1;
        }
        parsed.values.get(name).cloned()
    }

    /// How many times the jar string has been parsed.
    pub fn cookie_parse_count(&self) -> usize {
        self.state.lock().parsed.parses
    }

    pub(crate) fn cookie_backend(&self) -> &dyn CookieBackend {
        self.cookies.as_ref()
    }

    pub(crate) fn item_backend(&self) -> &dyn ItemBackend {
        self.items.as_ref()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Builder
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Builds a [`StorageHost`].  Unset backends default to in-memory ones on
/// the configured clock.
#[derive(Default)]
pub struct StorageHostBuilder {
    cookies: Option<Arc<dyn CookieBackend>>,
    items: Option<Arc<dyn ItemBackend>>,
    clock: Option<Arc<dyn Clock>>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
    config: HostConfig,
    cookie_config: CookieStoreConfig,
}

impl StorageHostBuilder {
    pub fn cookies(mut self, backend: Arc<dyn CookieBackend>) -> Self {
        self.cookies = Some(backend);
        self
    }

    pub fn items(mut self, backend: Arc<dyn ItemBackend>) -> Self {
        self.items = Some(backend);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    /// Settings for [`StorageHost::default_cookie_store`].
    pub fn default_cookie_config(mut self, config: CookieStoreConfig) -> Self {
        self.cookie_config = config;
        self
    }

    pub fn build(self) -> Arc<StorageHost> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let cookies = self
            .cookies
            .unwrap_or_else(|| Arc::new(MemoryCookieJar::new(Arc::clone(&clock))));
        let items = self
            .items
            .unwrap_or_else(|| Arc::new(MemoryItemStore::new()));
        let cookies_enabled = self.cookie_config.enabled;

        Arc::new(StorageHost {
            cookies,
            items,
            clock,
            diagnostics: self.diagnostics.unwrap_or_else(|| Arc::new(TracingSink)),
            config: self.config,
            default_cookie_config: self.cookie_config,
            cookies_enabled: AtomicBool::new(cookies_enabled),
            storage_enabled: AtomicBool::new(true),
            state: Mutex::new(HostState::default()),
        })
    }
}
