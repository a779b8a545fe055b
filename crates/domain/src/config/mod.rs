mod cookies;
mod host;
mod sessions;

pub use cookies::*;
pub use host::*;
pub use sessions::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::Result;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub cookies: CookieStoreConfig,
    #[serde(default)]
    pub host: HostConfig,
}

impl Config {
    /// Parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from file if it exists, otherwise return defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if path.exists() {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to load config, using defaults"
                    );
                }
                Self::default()
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Longest id the generator will produce.
pub const MAX_ID_LENGTH: usize = 64;

/// Longest accepted session lifetime or renewal window: ten years.
pub const MAX_WINDOW_MS: i64 = 10 * 365 * 86_400_000;

/// Characters that would corrupt a cookie name or the `|` record format.
const RESERVED_NAME_CHARS: &[char] = &[',', ';', '=', ' ', '|'];

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.sessions;

        if s.renewal_ms <= 0 || s.renewal_ms > MAX_WINDOW_MS {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "sessions.renewal_ms".into(),
                message: format!("renewal window must be between 1 and {MAX_WINDOW_MS}"),
            });
        }

        if s.expiration_ms < 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "sessions.expiration_ms".into(),
                message: "expiration must be 0 (disabled) or positive".into(),
            });
        } else if s.expiration_ms > MAX_WINDOW_MS {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "sessions.expiration_ms".into(),
                message: format!("expiration must not exceed {MAX_WINDOW_MS}"),
            });
        } else if s.expiration_ms > 0 && s.renewal_ms > s.expiration_ms {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "sessions.renewal_ms".into(),
                message: "renewal window exceeds expiration; expiration always wins".into(),
            });
        }

        if s.id_length == 0 || s.id_length > MAX_ID_LENGTH {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "sessions.id_length".into(),
                message: format!("id length must be between 1 and {MAX_ID_LENGTH}"),
            });
        }

        if s.cookie_update_interval_ms < 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "sessions.cookie_update_interval_ms".into(),
                message: "update interval must not be negative".into(),
            });
        }

        if let Some(prefix) = &s.name_prefix {
            if prefix.contains(RESERVED_NAME_CHARS) {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: "sessions.name_prefix".into(),
                    message: "prefix must not contain , ; = | or spaces".into(),
                });
            }
        }

        if self.host.secure_context && self.host.user_agent.is_none() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "host.user_agent".into(),
                message: "no user agent set; SameSite=None will always be sent".into(),
            });
        }

        errors
    }
}
