use sk_domain::config::{Config, ConfigSeverity, SessionPolicy, MAX_WINDOW_MS};

#[test]
fn default_session_windows() {
    let config = Config::default();
    assert_eq!(config.sessions.session_renewal_ms(), 1_800_000);
    assert_eq!(config.sessions.session_expiration_ms(), 86_400_000);
    assert_eq!(config.sessions.id_length(), 22);
    assert_eq!(config.sessions.cookie_update_interval_ms(), 60_000);
    assert_eq!(config.sessions.cookie_domain(), None);
    assert_eq!(config.sessions.name_prefix(), None);
}

#[test]
fn default_cookie_store_is_enabled() {
    let config = Config::default();
    assert!(config.cookies.enabled);
    assert!(config.cookies.path.is_none());
    assert!(!config.host.secure_context);
}

#[test]
fn partial_sessions_table_keeps_other_defaults() {
    let toml_str = r#"
[sessions]
expiration_ms = 0
name_prefix = "app_"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.sessions.session_expiration_ms(), 0);
    assert_eq!(config.sessions.name_prefix().as_deref(), Some("app_"));
    assert_eq!(config.sessions.session_renewal_ms(), 1_800_000);
}

#[test]
fn host_table_parses() {
    let toml_str = r#"
[host]
secure_context = true
user_agent = "Mozilla/5.0 (iPhone; CPU iPhone OS 12_0 like Mac OS X)"

[cookies]
domain = "example.com"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(config.host.secure_context);
    assert_eq!(config.cookies.domain.as_deref(), Some("example.com"));
    assert!(config.validate().is_empty());
}

#[test]
fn default_config_validates_clean() {
    assert!(Config::default().validate().is_empty());
}

#[test]
fn invalid_values_are_reported() {
    let toml_str = r#"
[sessions]
renewal_ms = 0
id_length = 0
name_prefix = "bad;prefix"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
    assert!(fields.contains(&"sessions.renewal_ms"));
    assert!(fields.contains(&"sessions.id_length"));
    assert!(fields.contains(&"sessions.name_prefix"));
    assert!(issues.iter().all(|i| i.severity == ConfigSeverity::Error));
}

#[test]
fn windows_beyond_ten_years_are_rejected() {
    let toml_str = r#"
[sessions]
renewal_ms = 9223372036854775807
expiration_ms = 9223372036854775807
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
    assert_eq!(fields, ["sessions.renewal_ms", "sessions.expiration_ms"]);
    assert!(issues.iter().all(|i| i.severity == ConfigSeverity::Error));

    let mut config = Config::default();
    config.sessions.expiration_ms = MAX_WINDOW_MS;
    assert!(config.validate().is_empty());
}

#[test]
fn renewal_longer_than_expiration_warns() {
    let toml_str = r#"
[sessions]
renewal_ms = 90000000
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, ConfigSeverity::Warning);
}

#[test]
fn missing_file_loads_defaults() {
    let config = Config::load_or_default("/nonexistent/sessionkeep.toml");
    assert_eq!(config, Config::default());
}
