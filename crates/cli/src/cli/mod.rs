pub mod config;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

/// SessionKeep: session identity kept across page loads.
///
/// Each invocation is one page load against the state directory.
#[derive(Debug, Parser)]
#[command(name = "sessionkeep", version, about)]
pub struct Cli {
    /// Directory holding `cookies.json` and `storage.json`.
    #[arg(long, global = true, default_value = ".sessionkeep")]
    pub state_dir: PathBuf,

    /// Config file (defaults to `$SK_CONFIG`, then `config.toml`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Include recorded diagnostics in the output.
    #[arg(long, global = true)]
    pub diagnostics: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record activity: load, expire or renew, and persist the session.
    Update {
        /// Current time in epoch milliseconds (defaults to the system clock).
        #[arg(long)]
        at: Option<i64>,
    },
    /// Record activity, then mirror the session into `storage.json`.
    Backup {
        #[arg(long)]
        at: Option<i64>,
    },
    /// Print what both stores hold without changing anything.
    Show {
        #[arg(long)]
        at: Option<i64>,
    },
    /// Delete every cookie, as a user clearing their browser would.
    ClearCookies,
    /// Authenticated user context.
    #[command(subcommand)]
    Auth(AuthCommand),
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Attach an authenticated user id (and optional account id).
    Set {
        authenticated_id: String,
        #[arg(long)]
        account: Option<String>,
        /// Persist in the `ai_authUser` cookie.
        #[arg(long)]
        store: bool,
    },
    /// Remove the authenticated user context and its cookie.
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Resolve the config path (`--config`, then `SK_CONFIG`, then
/// `config.toml`) and parse it.  A missing file yields defaults; a file that
/// does not parse is an error.
pub fn load_config(
    explicit: Option<&Path>,
) -> anyhow::Result<(sk_domain::config::Config, PathBuf)> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => std::env::var_os("SK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml")),
    };

    let config = if config_path.exists() {
        sk_domain::config::Config::load(&config_path)
            .map_err(|e| anyhow::anyhow!("loading {}: {e}", config_path.display()))?
    } else {
        sk_domain::config::Config::default()
    };

    Ok((config, config_path))
}
