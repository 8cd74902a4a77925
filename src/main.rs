//! Fintrack main entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use fintrack_client::HttpRecordsApi;
use fintrack_config::Config;
use fintrack_core::{ConfiguredIdentityProvider, Identity, SessionRegistry};
use fintrack_web::{start_server, AppState};
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "fintrack")]
#[command(version = "0.1.0")]
#[command(about = "A small personal finance tracker backed by a remote records API", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = Config::load_or_default(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.to_lowercase()),
    )
    .init();

    if args.config.exists() {
        log::info!("Config loaded from {}", args.config.display());
    } else {
        log::warn!("Config file {} not found, using defaults", args.config.display());
    }

    let api = Arc::new(HttpRecordsApi::from_config(&config)?);
    log::info!("Records API: {}", api.base_url());

    let ttl = i64::try_from(config.session.ttl_minutes)
        .ok()
        .and_then(chrono::Duration::try_minutes)
        .context("session.ttl_minutes is out of range")?;
    let mut registry = SessionRegistry::new(api, ttl);
    if let Some(identity) = trusted_identity(&config) {
        log::warn!(
            "Accepting the literal \"true\" session marker as user {}",
            identity.user_id
        );
        registry = registry.with_trusted_flag(identity);
    }

    let identity = ConfiguredIdentityProvider::new(config.auth.users.clone());
    if identity.user_count() == 0 {
        log::warn!("No users configured under auth.users, nobody can sign in");
    } else {
        log::info!("{} users can sign in", identity.user_count());
    }

    let state = AppState {
        registry: Arc::new(registry),
        identity: Arc::new(identity),
        config,
    };

    let rt = Runtime::new()?;
    rt.block_on(start_server(state))?;

    Ok(())
}

/// Identity for the legacy `"true"` marker, when enabled
///
/// `session.fallback_user` names a configured user; an unknown name is used
/// as the records user id directly.
fn trusted_identity(config: &Config) -> Option<Identity> {
    if !config.session.trust_flag {
        return None;
    }
    let name = config.session.fallback_user.as_deref()?;
    Some(match config.find_user(name) {
        Some(user) => Identity::new(user.effective_user_id(), user.effective_display_name()),
        None => Identity::new(name, name),
    })
}
