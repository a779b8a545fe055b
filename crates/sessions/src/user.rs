//! Anonymous and authenticated user identity.
//!
//! The anonymous id lives for a year in the `ai_user` cookie.  When that
//! cookie is missing the user is treated as new, and the fallback copy of
//! the session is removed: cookies cleared on purpose are not undone by
//! session recovery.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat};
use serde::Serialize;

use sk_domain::config::SessionPolicy;
use sk_domain::diagnostics::{DiagnosticEvent, DiagnosticId, DiagnosticSink};
use sk_domain::error::{Error, Result};
use sk_domain::trace::TraceEvent;
use sk_storage::{EntryAttributes, KeyValueStore, StorageHost};

use crate::id;
use crate::manager::session_storage_name;

pub const USER_COOKIE_NAME: &str = "ai_user";
pub const AUTH_USER_COOKIE_NAME: &str = "ai_authUser";
pub const USER_COOKIE_SEPARATOR: char = '|';
const ONE_YEAR_SECS: f64 = 31_536_000.0;

/// Reject ids that are empty or contain `,` `;` `=` space or `|`.
pub fn validate_identifier(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::ValidationRejected("identifier is empty".into()));
    }
    if let Some(c) = id.chars().find(|c| matches!(c, ',' | ';' | '=' | ' ' | '|')) {
        return Err(Error::ValidationRejected(format!(
            "identifier contains reserved character {c:?}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct UserState {
    pub id: String,
    pub is_new_user: bool,
    pub account_acquisition_date: Option<String>,
    pub authenticated_id: Option<String>,
    pub account_id: Option<String>,
}

pub struct UserContext {
    state: UserState,
    policy: Arc<dyn SessionPolicy>,
    primary: Arc<dyn KeyValueStore>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl UserContext {
    pub fn new(policy: Arc<dyn SessionPolicy>, host: &Arc<StorageHost>) -> Self {
        Self::load(
            policy,
            Arc::new(host.default_cookie_store()),
            Arc::new(host.item_store()),
            host.diagnostics().clone(),
            host.clock().now_ms(),
        )
    }

    /// Read the user from `primary`, minting and persisting a new one when
    /// none is stored.
    pub fn load(
        policy: Arc<dyn SessionPolicy>,
        primary: Arc<dyn KeyValueStore>,
        fallback: Arc<dyn KeyValueStore>,
        diagnostics: Arc<dyn DiagnosticSink>,
        now_ms: i64,
    ) -> Self {
        let mut state = UserState {
            id: String::new(),
            is_new_user: false,
            account_acquisition_date: None,
            authenticated_id: None,
            account_id: None,
        };

        let stored = primary.get(USER_COOKIE_NAME);
        let mut fields = stored.split(USER_COOKIE_SEPARATOR);
        if let Some(id) = fields.next().filter(|id| !id.is_empty()) {
            state.id = id.to_owned();
            state.account_acquisition_date = fields.next().map(str::to_owned);
        }

        if state.id.is_empty() {
            state.id = id::new_id(policy.id_length());
            let acquired = iso_date(now_ms);
            state.is_new_user = true;
            primary.set(
                USER_COOKIE_NAME,
                &format!("{}{USER_COOKIE_SEPARATOR}{acquired}", state.id),
                &EntryAttributes::default()
                    .with_domain(policy.cookie_domain())
                    .with_max_age(ONE_YEAR_SECS),
            );
            state.account_acquisition_date = Some(acquired);
            fallback.delete(&session_storage_name(&*policy));
            TraceEvent::UserCreated {
                user_id: state.id.clone(),
            }
            .emit();
        }

        let auth = primary.get(AUTH_USER_COOKIE_NAME);
        if !auth.is_empty() {
            let decoded = urlencoding::decode(&auth)
                .map(|s| s.into_owned())
                .unwrap_or(auth);
            let mut fields = decoded.split(USER_COOKIE_SEPARATOR);
            state.authenticated_id = fields.next().filter(|s| !s.is_empty()).map(str::to_owned);
            state.account_id = fields.next().filter(|s| !s.is_empty()).map(str::to_owned);
        }

        Self {
            state,
            policy,
            primary,
            diagnostics,
        }
    }

    pub fn state(&self) -> &UserState {
        &self.state
    }

    pub fn id(&self) -> &str {
        &self.state.id
    }

    pub fn is_new_user(&self) -> bool {
        self.state.is_new_user
    }

    pub fn authenticated_id(&self) -> Option<&str> {
        self.state.authenticated_id.as_deref()
    }

    pub fn account_id(&self) -> Option<&str> {
        self.state.account_id.as_deref()
    }

    /// Attach an authenticated identity.  A rejected id leaves the context
    /// untouched and is reported as a warning as well as returned.  When the
    /// cookie cannot be written the context is still set for this page and
    /// `Error::StorageUnavailable` is returned.
    pub fn set_authenticated_user_context(
        &mut self,
        authenticated_id: &str,
        account_id: Option<&str>,
        store_in_cookie: bool,
    ) -> Result<()> {
        let checked = validate_identifier(authenticated_id)
            .and_then(|()| account_id.map_or(Ok(()), validate_identifier));
        if let Err(e) = checked {
            self.diagnostics.record(
                DiagnosticEvent::warning(
                    DiagnosticId::SetAuthContextFailed,
                    "Setting auth user context failed. User auth/account id should not \
                     contain commas, semi-colons, equal signs, spaces, or vertical-bars.",
                )
                .with_exception(&e),
            );
            return Err(e);
        }

        self.state.authenticated_id = Some(authenticated_id.to_owned());
        let mut value = authenticated_id.to_owned();
        if let Some(account) = account_id {
            self.state.account_id = Some(account.to_owned());
            value = format!("{value}{USER_COOKIE_SEPARATOR}{account}");
        }

        if store_in_cookie {
            // Session cookie: no TTL.
            self.primary.try_set(
                AUTH_USER_COOKIE_NAME,
                &encode_uri(&value),
                &EntryAttributes::default().with_domain(self.policy.cookie_domain()),
            )?;
        }
        Ok(())
    }

    pub fn clear_authenticated_user_context(&mut self) {
        self.state.authenticated_id = None;
        self.state.account_id = None;
        self.primary.delete(AUTH_USER_COOKIE_NAME);
    }
}

/// Percent-encode the way `encodeURI` does.  Reserved URI characters stay
/// literal; the `|` separator and non-ASCII text are escaped.
fn encode_uri(value: &str) -> String {
    const LITERAL: &str = ";,/?:@&=+$-_.!~*'()#";
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_alphanumeric() || LITERAL.contains(c) {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            out.push_str(&urlencoding::encode(c.encode_utf8(&mut buf)));
        }
    }
    out
}

/// `2023-11-14T22:13:20.000Z`
fn iso_date(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sk_domain::clock::ManualClock;
    use sk_domain::config::SessionsConfig;
    use sk_domain::diagnostics::DiagnosticLog;
    use sk_storage::{MemoryCookieJar, MemoryItemStore};

    const T0: i64 = 1_700_000_000_000;

    fn host() -> (
        Arc<StorageHost>,
        Arc<MemoryCookieJar>,
        Arc<MemoryItemStore>,
        Arc<DiagnosticLog>,
    ) {
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
        (host, jar, items, log)
    }

    fn policy() -> Arc<dyn SessionPolicy> {
        Arc::new(SessionsConfig::default())
    }

    #[test]
    fn validation_rejects_reserved_characters() {
        for bad in ["", "a,b", "a;b", "a=b", "a b", "a|b"] {
            assert!(
                matches!(validate_identifier(bad), Err(Error::ValidationRejected(_))),
                "{bad:?}"
            );
        }
        assert!(validate_identifier("user-42@example.com").is_ok());
    }

    #[test]
    fn new_user_gets_year_long_cookie() {
        let (host, jar, _, _) = host();
        let user = UserContext::new(policy(), &host);
        assert!(user.is_new_user());
        assert_eq!(user.id().len(), 22);

        let cookie = jar.cookie(USER_COOKIE_NAME).unwrap();
        assert_eq!(cookie.value, format!("{}|2023-11-14T22:13:20.000Z", user.id()));
        assert_eq!(cookie.attribute("max-age"), Some("31536000"));
    }

    #[test]
    fn new_user_clears_fallback_session() {
        let (host, _, items, _) = host();
        items.insert("ai_session", "abc|1699999999000|1699999999500");
        UserContext::new(policy(), &host);
        assert_eq!(items.peek("ai_session"), None);
    }

    #[test]
    fn returning_user_keeps_fallback_session() {
        let (host, _, items, _) = host();
        let first = UserContext::new(policy(), &host);
        items.insert("ai_session", "abc|1699999999000|1699999999500");

        let again = UserContext::new(policy(), &host);
        assert!(!again.is_new_user());
        assert_eq!(again.id(), first.id());
        assert_eq!(
            again.state().account_acquisition_date.as_deref(),
            Some("2023-11-14T22:13:20.000Z")
        );
        assert!(items.peek("ai_session").is_some());
    }

    #[test]
    fn rejected_auth_context_leaves_state() {
        let (host, jar, _, log) = host();
        let mut user = UserContext::new(policy(), &host);
        let err = user
            .set_authenticated_user_context("bad id", None, true)
            .unwrap_err();
        assert!(matches!(err, Error::ValidationRejected(_)));
        assert_eq!(user.authenticated_id(), None);
        assert_eq!(log.count(DiagnosticId::SetAuthContextFailed), 1);
        assert!(jar.cookie(AUTH_USER_COOKIE_NAME).is_none());

        assert!(user
            .set_authenticated_user_context("ok", Some("a;b"), false)
            .is_err());
        assert_eq!(user.authenticated_id(), None);
    }

    #[test]
    fn auth_cookie_round_trips_through_a_reload() {
        let (host, jar, _, _) = host();
        let mut user = UserContext::new(policy(), &host);
        user.set_authenticated_user_context("alice", Some("acme"), true)
            .unwrap();

        let cookie = jar.cookie(AUTH_USER_COOKIE_NAME).unwrap();
        assert_eq!(cookie.value, "alice%7Cacme");
        assert_eq!(cookie.attribute("max-age"), None);

        let reloaded = UserContext::new(policy(), &host);
        assert_eq!(reloaded.authenticated_id(), Some("alice"));
        assert_eq!(reloaded.account_id(), Some("acme"));
    }

    #[test]
    fn auth_cookie_keeps_uri_reserved_characters() {
        let (host, jar, _, _) = host();
        let mut user = UserContext::new(policy(), &host);
        user.set_authenticated_user_context("jörg@example.com:7/x", Some("acme"), true)
            .unwrap();

        let cookie = jar.cookie(AUTH_USER_COOKIE_NAME).unwrap();
        assert_eq!(cookie.value, "j%C3%B6rg@example.com:7/x%7Cacme");

        let reloaded = UserContext::new(policy(), &host);
        assert_eq!(reloaded.authenticated_id(), Some("jörg@example.com:7/x"));
    }

    #[test]
    fn unwritable_auth_cookie_is_reported() {
        let (host, jar, _, _) = host();
        host.disable_cookies();
        let mut user = UserContext::new(policy(), &host);

        let err = user
            .set_authenticated_user_context("alice", None, true)
            .unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
        assert_eq!(user.authenticated_id(), Some("alice"));
        assert!(jar.cookie(AUTH_USER_COOKIE_NAME).is_none());

        // Without persistence nothing needs to be written.
        user.set_authenticated_user_context("bob", None, false)
            .unwrap();
        assert_eq!(user.authenticated_id(), Some("bob"));
    }

    #[test]
    fn clearing_auth_context_deletes_cookie() {
        let (host, jar, _, _) = host();
        let mut user = UserContext::new(policy(), &host);
        user.set_authenticated_user_context("alice", None, true)
            .unwrap();
        assert!(jar.cookie(AUTH_USER_COOKIE_NAME).is_some());

        user.clear_authenticated_user_context();
        assert_eq!(user.authenticated_id(), None);
        assert!(jar.cookie(AUTH_USER_COOKIE_NAME).is_none());
    }
}
