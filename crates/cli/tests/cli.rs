use std::path::Path;

use clap::Parser;

use sk_cli::cli::config::{show, validate};
use sk_cli::cli::{load_config, AuthCommand, Cli, Command, ConfigCommand, LogFormat};
use sk_cli::page::Page;
use sk_domain::config::Config;

const T0: i64 = 1_700_000_000_000;

#[test]
fn parses_update_with_time() {
    let cli = Cli::try_parse_from(["sessionkeep", "update", "--at", "1700000000000"]).unwrap();
    assert!(matches!(cli.command, Command::Update { at: Some(T0) }));
    assert_eq!(cli.state_dir.to_str(), Some(".sessionkeep"));
    assert_eq!(cli.log_format, LogFormat::Pretty);
    assert!(!cli.diagnostics);
}

#[test]
fn global_flags_follow_the_subcommand() {
    let cli = Cli::try_parse_from([
        "sessionkeep",
        "show",
        "--state-dir",
        "/tmp/page",
        "--diagnostics",
        "--log-format",
        "json",
    ])
    .unwrap();
    assert!(matches!(cli.command, Command::Show { at: None }));
    assert_eq!(cli.state_dir.to_str(), Some("/tmp/page"));
    assert!(cli.diagnostics);
    assert_eq!(cli.log_format, LogFormat::Json);
}

#[test]
fn parses_nested_subcommands() {
    let cli = Cli::try_parse_from(["sessionkeep", "config", "validate"]).unwrap();
    assert!(matches!(cli.command, Command::Config(ConfigCommand::Validate)));

    let cli = Cli::try_parse_from(["sessionkeep", "auth", "set", "alice", "--account", "acme", "--store"])
        .unwrap();
    match cli.command {
        Command::Auth(AuthCommand::Set {
            authenticated_id,
            account,
            store,
        }) => {
            assert_eq!(authenticated_id, "alice");
            assert_eq!(account.as_deref(), Some("acme"));
            assert!(store);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn missing_config_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let (config, used) = load_config(Some(&path)).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(used, path);
}

#[test]
fn config_file_is_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[sessions]\nrenewal_ms = 60000\nname_prefix = \"app_\"\n\n[host]\nsecure_context = true\n",
    )
    .unwrap();

    let (config, _) = load_config(Some(&path)).unwrap();
    assert_eq!(config.sessions.renewal_ms, 60_000);
    assert_eq!(config.sessions.name_prefix.as_deref(), Some("app_"));
    assert!(config.host.secure_context);
}

#[test]
fn broken_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[sessions\n").unwrap();
    assert!(load_config(Some(&path)).is_err());
}

#[test]
fn config_report_names_the_storage_key() {
    let mut config = Config::default();
    config.sessions.name_prefix = Some("app_".into());
    config.host.secure_context = true;
    config.host.user_agent = Some(
        "Mozilla/5.0 (iPhone; CPU iPhone OS 12_0 like Mac OS X) AppleWebKit/605.1.15 \
         (KHTML, like Gecko) Version/12.0 Mobile/15E148 Safari/604.1"
            .into(),
    );

    let report = validate(&config, Path::new("config.toml"));
    assert!(report.is_ok());
    assert_eq!(report.storage_name, "app_ai_session");
    assert_eq!(report.user_cookie, "ai_user");
    assert_eq!(report.session_max_age_secs, Some(1800.0));
    assert!(report.secure);
    assert!(!report.same_site_none);

    let shown = show(&config).unwrap();
    assert!(shown.starts_with("# storage key: app_ai_session\n"));
    let reparsed: Config = toml::from_str(&shown).unwrap();
    assert_eq!(reparsed, config);
}

#[test]
fn config_report_separates_errors_from_warnings() {
    let mut config = Config::default();
    config.sessions.expiration_ms = 0;
    config.sessions.id_length = 0;
    config.host.secure_context = true;

    let report = validate(&config, Path::new("config.toml"));
    assert!(!report.is_ok());
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("sessions.id_length"));
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.session_max_age_secs, None);
    assert!(report.same_site_none);
}

#[test]
fn consecutive_updates_share_a_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();

    let first = Page::open(dir.path(), &config, Some(T0))
        .unwrap()
        .update(false, false);
    assert!(first.user.is_new_user);
    assert_eq!(first.storage_name, "ai_session");
    assert!(first.diagnostics.is_none());

    let second = Page::open(dir.path(), &config, Some(T0 + 120_000))
        .unwrap()
        .update(false, true);
    assert!(!second.user.is_new_user);
    assert_eq!(second.user.id, first.user.id);
    assert_eq!(second.session.id, first.session.id);
    assert_eq!(second.last_primary_write, Some(T0 + 120_000));
    assert_eq!(second.diagnostics, Some(Vec::new()));
}

#[test]
fn backup_writes_storage_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();

    let page = Page::open(dir.path(), &config, Some(T0)).unwrap();
    let report = page.update(true, false);
    assert!(report.backed_up);

    let id = report.session.id.unwrap();
    assert_eq!(
        page.fallback_raw().unwrap(),
        Some(format!("{id}|{T0}|{T0}"))
    );
    assert!(dir.path().join("storage.json").exists());
}

#[test]
fn show_reads_without_renewing() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();

    let page = Page::open(dir.path(), &config, Some(T0)).unwrap();
    let state = page.show(false);
    assert!(state.primary_available);
    assert!(state.primary.is_none());
    assert!(state.user_cookie.is_none());

    let id = page.update(true, false).session.id.unwrap();
    let state = Page::open(dir.path(), &config, Some(T0 + 1_000))
        .unwrap()
        .show(false);
    let primary = state.primary.unwrap();
    assert_eq!(primary.record.unwrap().id, id);
    assert_eq!(state.fallback.unwrap().raw, format!("{id}|{T0}|{T0}"));
}

#[test]
fn clearing_cookies_starts_a_new_user() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();

    let page = Page::open(dir.path(), &config, Some(T0)).unwrap();
    let first = page.update(true, false);
    page.clear_cookies().unwrap();

    let page = Page::open(dir.path(), &config, Some(T0 + 1_000)).unwrap();
    let second = page.update(false, false);
    assert!(second.user.is_new_user);
    assert_ne!(second.session.id, first.session.id);
    assert!(page.diagnostics().is_empty());
}

#[test]
fn auth_context_persists_in_cookie() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();

    let page = Page::open(dir.path(), &config, Some(T0)).unwrap();
    page.user()
        .set_authenticated_user_context("alice", Some("acme"), true)
        .unwrap();

    let page = Page::open(dir.path(), &config, Some(T0 + 1_000)).unwrap();
    let user = page.user();
    assert_eq!(user.authenticated_id(), Some("alice"));
    assert_eq!(user.account_id(), Some("acme"));
}
