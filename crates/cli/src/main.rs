use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use sk_cli::cli::{AuthCommand, Cli, Command, ConfigCommand, LogFormat};
use sk_cli::page::Page;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let (config, config_path) = sk_cli::cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Update { at } => {
            let page = Page::open(&cli.state_dir, &config, at)?;
            print_json(&page.update(false, cli.diagnostics))
        }
        Command::Backup { at } => {
            let page = Page::open(&cli.state_dir, &config, at)?;
            print_json(&page.update(true, cli.diagnostics))
        }
        Command::Show { at } => {
            let page = Page::open(&cli.state_dir, &config, at)?;
            print_json(&page.show(cli.diagnostics))
        }
        Command::ClearCookies => {
            let page = Page::open(&cli.state_dir, &config, None)?;
            page.clear_cookies()?;
            tracing::info!(state_dir = %cli.state_dir.display(), "cookies cleared");
            Ok(())
        }
        Command::Auth(AuthCommand::Set {
            authenticated_id,
            account,
            store,
        }) => {
            let page = Page::open(&cli.state_dir, &config, None)?;
            let mut user = page.user();
            user.set_authenticated_user_context(&authenticated_id, account.as_deref(), store)
                .context("setting authenticated user context")?;
            print_json(user.state())
        }
        Command::Auth(AuthCommand::Clear) => {
            let page = Page::open(&cli.state_dir, &config, None)?;
            let mut user = page.user();
            user.clear_authenticated_user_context();
            print_json(user.state())
        }
        Command::Config(ConfigCommand::Validate) => {
            let report = sk_cli::cli::config::validate(&config, &config_path);
            print_json(&report)?;
            if !report.is_ok() {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => {
            print!("{}", sk_cli::cli::config::show(&config)?);
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.compact().init(),
    }
}
