use std::path::{Path, PathBuf};

use serde::Serialize;

use sk_domain::config::{Config, ConfigSeverity};
use sk_sessions::session_storage_name;
use sk_sessions::user::{AUTH_USER_COOKIE_NAME, USER_COOKIE_NAME};
use sk_storage::same_site::ua_disallows_same_site_none;

/// What a page load would do with this config, plus any issues found.
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    pub config_path: PathBuf,
    /// Key used in both the cookie jar and the fallback item store.
    pub storage_name: String,
    pub user_cookie: &'static str,
    pub auth_user_cookie: &'static str,
    /// `max-age` of a freshly acquired session; absent when sessions never
    /// expire by age.
    pub session_max_age_secs: Option<f64>,
    pub secure: bool,
    pub same_site_none: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ConfigReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate(config: &Config, config_path: &Path) -> ConfigReport {
    let (errors, warnings): (Vec<_>, Vec<_>) = config
        .validate()
        .into_iter()
        .partition(|issue| issue.severity == ConfigSeverity::Error);

    let s = &config.sessions;
    let session_max_age_secs =
        (s.expiration_ms > 0).then(|| s.expiration_ms.min(s.renewal_ms) as f64 / 1000.0);

    let secure = config.host.secure_context;
    let same_site_none = secure
        && !config
            .host
            .user_agent
            .as_deref()
            .is_some_and(ua_disallows_same_site_none);

    let report = ConfigReport {
        config_path: config_path.to_path_buf(),
        storage_name: session_storage_name(s),
        user_cookie: USER_COOKIE_NAME,
        auth_user_cookie: AUTH_USER_COOKIE_NAME,
        session_max_age_secs,
        secure,
        same_site_none,
        errors: errors.iter().map(ToString::to_string).collect(),
        warnings: warnings.iter().map(ToString::to_string).collect(),
    };

    if !report.is_ok() {
        tracing::warn!(
            path = %config_path.display(),
            errors = report.errors.len(),
            "config has errors"
        );
    }
    report
}

/// The resolved config (with all defaults filled in) as TOML, headed by the
/// storage key it resolves to.
pub fn show(config: &Config) -> anyhow::Result<String> {
    Ok(format!(
        "# storage key: {}\n{}",
        session_storage_name(&config.sessions),
        toml::to_string_pretty(config)?
    ))
}
