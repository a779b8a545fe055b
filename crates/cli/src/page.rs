//! One page load against a state directory.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use sk_domain::clock::{Clock, ManualClock, SystemClock};
use sk_domain::config::{Config, SessionPolicy};
use sk_domain::diagnostics::{DiagnosticEvent, DiagnosticLog};
use sk_sessions::user::{UserState, USER_COOKIE_NAME};
use sk_sessions::{decode, session_storage_name, Session, SessionManager, SessionRecord, UserContext};
use sk_storage::{FileCookieJar, FileItemStore, ItemBackend, KeyValueStore, StorageHost};

pub const COOKIES_FILE: &str = "cookies.json";
pub const STORAGE_FILE: &str = "storage.json";

pub struct Page {
    host: Arc<StorageHost>,
    jar: Arc<FileCookieJar>,
    items: Arc<FileItemStore>,
    policy: Arc<dyn SessionPolicy>,
    log: Arc<DiagnosticLog>,
}

#[derive(Debug, Serialize)]
pub struct UpdateReport {
    pub storage_name: String,
    pub session: Session,
    pub user: UserState,
    pub last_primary_write: Option<i64>,
    pub backed_up: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Vec<DiagnosticEvent>>,
}

#[derive(Debug, Serialize)]
pub struct StoredValue {
    pub raw: String,
    pub record: Option<SessionRecord>,
}

#[derive(Debug, Serialize)]
pub struct StateReport {
    pub storage_name: String,
    pub primary_available: bool,
    pub fallback_available: bool,
    pub primary: Option<StoredValue>,
    pub fallback: Option<StoredValue>,
    pub user_cookie: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Vec<DiagnosticEvent>>,
}

impl Page {
    /// Open the state directory.  `at` pins the clock; otherwise the system
    /// clock is used.
    pub fn open(state_dir: &Path, config: &Config, at: Option<i64>) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = match at {
            Some(ms) => Arc::new(ManualClock::new(ms)),
            None => Arc::new(SystemClock),
        };

        let jar = Arc::new(
            FileCookieJar::open(state_dir.join(COOKIES_FILE), clock.clone())
                .with_context(|| format!("opening cookie jar in {}", state_dir.display()))?,
        );
        let items = Arc::new(
            FileItemStore::open(state_dir.join(STORAGE_FILE))
                .with_context(|| format!("opening item storage in {}", state_dir.display()))?,
        );
        let log = Arc::new(DiagnosticLog::new());

        let host = StorageHost::builder()
            .clock(clock)
            .cookies(jar.clone())
            .items(items.clone())
            .diagnostics(log.clone())
            .config(config.host.clone())
            .default_cookie_config(config.cookies.clone())
            .build();

        tracing::debug!(state_dir = %state_dir.display(), "page loaded");

        Ok(Self {
            host,
            jar,
            items,
            policy: Arc::new(config.sessions.clone()),
            log,
        })
    }

    /// Load the user, then record activity on the session.
    pub fn update(&self, backup: bool, with_diagnostics: bool) -> UpdateReport {
        let user = UserContext::new(self.policy.clone(), &self.host);
        let mut manager = SessionManager::new(self.policy.clone(), &self.host);
        manager.update_now();
        if backup {
            manager.backup();
        }

        UpdateReport {
            storage_name: manager.storage_name(),
            session: manager.session().clone(),
            user: user.state().clone(),
            last_primary_write: manager.last_primary_write(),
            backed_up: backup && manager.session().is_set(),
            diagnostics: with_diagnostics.then(|| self.log.events()),
        }
    }

    /// Read both tiers as they are.  Nothing is written except the
    /// availability probes.
    pub fn show(&self, with_diagnostics: bool) -> StateReport {
        let storage_name = session_storage_name(&*self.policy);
        let primary = self.host.default_cookie_store();
        let fallback = self.host.item_store();

        let read = |raw: String| {
            (!raw.is_empty()).then(|| StoredValue {
                record: decode(&raw, &*self.log).record(),
                raw,
            })
        };

        let user_cookie = Some(primary.get(USER_COOKIE_NAME)).filter(|v| !v.is_empty());

        StateReport {
            primary_available: self.host.cookies_available(),
            fallback_available: self.host.storage_available(),
            primary: read(primary.get(&storage_name)),
            fallback: read(fallback.get(&storage_name)),
            user_cookie,
            storage_name,
            diagnostics: with_diagnostics.then(|| self.log.events()),
        }
    }

    pub fn user(&self) -> UserContext {
        UserContext::new(self.policy.clone(), &self.host)
    }

    pub fn clear_cookies(&self) -> anyhow::Result<()> {
        self.jar.clear().context("clearing cookies")?;
        Ok(())
    }

    /// Raw fallback value, bypassing the store gates.
    pub fn fallback_raw(&self) -> anyhow::Result<Option<String>> {
        let name = session_storage_name(&*self.policy);
        Ok(self.items.get_item(&name)?)
    }

    pub fn diagnostics(&self) -> Vec<DiagnosticEvent> {
        self.log.events()
    }
}
