//! Session lifecycle: hydrate, expire, renew and persist.
//!
//! The manager holds the only copy of the current [`Session`].  On a cold
//! start it is read back from the primary store, or from the fallback store
//! when the primary has nothing usable.  Every [`SessionManager::update`]
//! either renews an expired session or refreshes the primary entry, at most
//! once per cookie update interval.  The fallback store is written only by
//! [`SessionManager::backup`].
//!
//! Storage may lag memory by up to one update interval: `renewal_date` moves
//! only when the primary entry is written.

use std::sync::Arc;

use sk_domain::clock::Clock;
use sk_domain::config::SessionPolicy;
use sk_domain::diagnostics::{DiagnosticEvent, DiagnosticId, DiagnosticSink};
use sk_domain::trace::TraceEvent;
use sk_storage::{EntryAttributes, KeyValueStore, StorageHost};

use crate::codec;
use crate::id;
use crate::lifecycle::{self, ExpiryReason};
use crate::session::Session;

pub const SESSION_STORAGE_NAME: &str = "ai_session";

/// `<prefix>ai_session`, the key used in both tiers.
pub fn session_storage_name(policy: &dyn SessionPolicy) -> String {
    match policy.name_prefix() {
        Some(prefix) => format!("{prefix}{SESSION_STORAGE_NAME}"),
        None => SESSION_STORAGE_NAME.to_owned(),
    }
}

pub struct SessionManager {
    policy: Arc<dyn SessionPolicy>,
    primary: Arc<dyn KeyValueStore>,
    fallback: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn DiagnosticSink>,
    session: Session,
    /// When this manager last wrote the primary entry.
    last_primary_write: Option<i64>,
}

impl SessionManager {
    /// A manager over the host's shared cookie store and its item store.
    pub fn new(policy: Arc<dyn SessionPolicy>, host: &Arc<StorageHost>) -> Self {
        Self::with_stores(
            policy,
            Arc::new(host.default_cookie_store()),
            Arc::new(host.item_store()),
            host.clock().clone(),
            host.diagnostics().clone(),
        )
    }

    pub fn with_stores(
        policy: Arc<dyn SessionPolicy>,
        primary: Arc<dyn KeyValueStore>,
        fallback: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            policy,
            primary,
            fallback,
            clock,
            diagnostics,
            session: Session::default(),
            last_primary_write: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn storage_name(&self) -> String {
        session_storage_name(&*self.policy)
    }

    pub fn last_primary_write(&self) -> Option<i64> {
        self.last_primary_write
    }

    pub fn update_now(&mut self) {
        let now = self.clock.now_ms();
        self.update(now);
    }

    pub fn update(&mut self, now: i64) {
        if !self.session.is_set() {
            self.hydrate();
        }

        match lifecycle::check_expiry(&self.session, now, &*self.policy) {
            Some(reason) => self.renew(now, reason),
            None => {
                let interval = self.policy.cookie_update_interval_ms();
                let due = self
                    .last_primary_write
                    .map_or(true, |at| now.saturating_sub(at) > interval);
                if due {
                    self.write_primary(now);
                }
            }
        }
    }

    /// Mirror the in-memory session into the fallback store.  Nothing is
    /// written while no session exists.
    pub fn backup(&self) {
        let storage_name = self.storage_name();
        match self.session.to_record() {
            Some(record) => {
                self.fallback.set(
                    &storage_name,
                    &codec::encode(&record),
                    &EntryAttributes::default(),
                );
                TraceEvent::SessionBackedUp {
                    storage_name,
                    session_id: Some(record.id),
                }
                .emit();
            }
            None => tracing::debug!(storage_name = %storage_name, "no session to back up"),
        }
    }

    /// Take the first valid record with an id, primary store first.
    fn hydrate(&mut self) {
        let storage_name = self.storage_name();
        for store in [&self.primary, &self.fallback] {
            let raw = store.get(&storage_name);
            if raw.is_empty() {
                continue;
            }
            let decoded = codec::decode(&raw, &*self.diagnostics);
            if let Some(record) = decoded.record().filter(|r| !r.id.is_empty()) {
                TraceEvent::SessionResolved {
                    storage_name: storage_name.clone(),
                    session_id: record.id.clone(),
                    source: store.kind().as_str().to_owned(),
                }
                .emit();
                self.session = Session::from(record);
                return;
            }
        }
    }

    fn renew(&mut self, now: i64, reason: ExpiryReason) {
        let old_session_id = self.session.id.take();
        let new_session_id = id::new_id(self.policy.id_length());
        tracing::debug!(reason = %reason, "renewing session");

        self.session = Session {
            id: Some(new_session_id.clone()),
            acquisition_date: Some(now),
            renewal_date: Some(now),
        };
        self.write_primary(now);

        if !self.fallback.is_enabled() {
            self.diagnostics.record(DiagnosticEvent::warning(
                DiagnosticId::FallbackStoreUnavailable,
                "Fallback storage is unavailable. Session durations will be inaccurate.",
            ));
        }

        TraceEvent::SessionRenewed {
            storage_name: self.storage_name(),
            old_session_id,
            new_session_id,
        }
        .emit();
    }

    /// Persist the session with `renewal_date = now`.  The entry expires at
    /// the renewal deadline or the acquisition deadline, whichever is first;
    /// with no expiration window it carries no TTL.
    fn write_primary(&mut self, now: i64) {
        self.session.renewal_date = Some(now);
        let Some(record) = self.session.to_record() else {
            return;
        };

        let expiration = self.policy.session_expiration_ms();
        let mut attrs = EntryAttributes::default().with_domain(self.policy.cookie_domain());
        if expiration > 0 {
            let acq_left = record
                .acquisition_date
                .saturating_add(expiration)
                .saturating_sub(now);
            let ttl_ms = acq_left.min(self.policy.session_renewal_ms());
            attrs = attrs.with_max_age(ttl_ms as f64 / 1000.0);
        }

        self.primary
            .set(&self.storage_name(), &codec::encode(&record), &attrs);
        self.last_primary_write = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sk_domain::clock::ManualClock;
    use sk_domain::config::{SessionsConfig, SharedSessionsConfig};
    use sk_domain::diagnostics::DiagnosticLog;
    use sk_storage::{MemoryCookieJar, MemoryItemStore};

    const T0: i64 = 1_700_000_000_000;

    struct Fixture {
        host: Arc<StorageHost>,
        jar: Arc<MemoryCookieJar>,
        items: Arc<MemoryItemStore>,
        log: Arc<DiagnosticLog>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(T0));
        let jar = Arc::new(MemoryCookieJar::new(clock.clone()));
        let items = Arc::new(MemoryItemStore::new());
        let log = Arc::new(DiagnosticLog::new());
        let host = StorageHost::builder()
            .clock(clock)
            .cookies(jar.clone())
            .items(items.clone())
            .diagnostics(log.clone())
            .build();
        Fixture {
            host,
            jar,
            items,
            log,
        }
    }

    fn policy() -> Arc<dyn SessionPolicy> {
        Arc::new(SessionsConfig::default())
    }

    #[test]
    fn storage_name_uses_prefix() {
        let f = fixture();
        let manager = SessionManager::new(policy(), &f.host);
        assert_eq!(manager.storage_name(), "ai_session");

        let prefixed = SessionsConfig {
            name_prefix: Some("app1_".into()),
            ..Default::default()
        };
        let manager = SessionManager::new(Arc::new(prefixed), &f.host);
        assert_eq!(manager.storage_name(), "app1_ai_session");
    }

    #[test]
    fn ttl_is_capped_by_acquisition_deadline() {
        let f = fixture();
        let mut manager = SessionManager::new(policy(), &f.host);
        manager.update(T0);

        // 23h50m after acquisition only 10 minutes of the day remain.
        let later = T0 + 85_800_000;
        f.jar.clear();
        manager.session.renewal_date = Some(later - 1_000);
        manager.update(later);
        let cookie = f.jar.cookie("ai_session").unwrap();
        assert_eq!(cookie.attribute("max-age"), Some("600"));
    }

    #[test]
    fn zero_expiration_writes_without_ttl() {
        let f = fixture();
        let config = SessionsConfig {
            expiration_ms: 0,
            ..Default::default()
        };
        let mut manager = SessionManager::new(Arc::new(config), &f.host);
        manager.update(T0);
        let cookie = f.jar.cookie("ai_session").unwrap();
        assert_eq!(cookie.attribute("max-age"), None);
        assert_eq!(cookie.attribute("expires"), None);
    }

    #[test]
    fn renewal_without_fallback_warns() {
        let f = fixture();
        f.host.disable_storage();
        let mut manager = SessionManager::new(policy(), &f.host);
        manager.update(T0);
        assert_eq!(f.log.count(DiagnosticId::FallbackStoreUnavailable), 1);

        // Not expired: no renewal, no new warning.
        manager.update(T0 + 120_000);
        assert_eq!(f.log.count(DiagnosticId::FallbackStoreUnavailable), 1);
    }

    #[test]
    fn policy_changes_apply_on_next_update() {
        let f = fixture();
        let shared = SharedSessionsConfig::new(SessionsConfig::default());
        let mut manager = SessionManager::new(Arc::new(shared.clone()), &f.host);
        manager.update(T0);
        let first = manager.session().id.clone();

        shared.update(|c| c.renewal_ms = 1_000);
        manager.update(T0 + 5_000);
        assert_ne!(manager.session().id, first);
    }

    #[test]
    fn backup_mirrors_memory() {
        let f = fixture();
        let mut manager = SessionManager::new(policy(), &f.host);
        manager.backup();
        assert_eq!(f.items.peek("ai_session"), None);

        manager.update(T0);
        manager.backup();
        let id = manager.session().id.clone().unwrap();
        assert_eq!(
            f.items.peek("ai_session"),
            Some(format!("{id}|{T0}|{T0}"))
        );
    }

    #[test]
    fn empty_id_record_is_skipped() {
        let f = fixture();
        f.items.insert("ai_session", "|1699999999000|1699999999500");
        let mut manager = SessionManager::new(policy(), &f.host);
        manager.update(T0);
        let id = manager.session().id.clone().unwrap();
        assert_eq!(id.len(), 22);
        assert_eq!(manager.session().acquisition_date, Some(T0));
    }

    #[test]
    fn invalid_primary_falls_through_to_fallback() {
        let f = fixture();
        let primary = f.host.default_cookie_store();
        primary.set("ai_session", "abc|0|0", &EntryAttributes::default());
        f.items.insert("ai_session", "def|1699999999000|1699999999500");

        let mut manager = SessionManager::new(policy(), &f.host);
        manager.update(T0);
        assert_eq!(manager.session().id.as_deref(), Some("def"));
        assert_eq!(f.log.count(DiagnosticId::SessionDateIsZero), 1);
    }
}
