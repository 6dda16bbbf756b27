//! `bansos` - drive the e-KYC mock backend from a terminal
//!
//! State lives in a file-backed store under the configured data directory,
//! one file per storage key, so consecutive runs share the mock database,
//! onboarding progress and sessions.

mod cli;
mod commands;

use anyhow::{Context as _, Result};
use bansos_core::PortalConfig;
use bansos_store::FileStore;
use clap::ArgMatches;
use commands::{Context, OnboardOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "bansos.toml";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Explicit `--config`, else `bansos.toml` if present, else defaults;
/// `--data-dir` wins over the file
fn load_config(matches: &ArgMatches) -> Result<PortalConfig> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => PortalConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            PortalConfig::load(Path::new(DEFAULT_CONFIG_FILE))
                .with_context(|| format!("loading config {DEFAULT_CONFIG_FILE}"))?
        }
        None => PortalConfig::default(),
    };
    Ok(match matches.get_one::<PathBuf>("data-dir") {
        Some(dir) => config.with_data_dir(dir),
        None => config,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let matches = cli::command().get_matches();
    let config = load_config(&matches)?;
    info!(data_dir = %config.data_dir.display(), "bansos v{}", env!("CARGO_PKG_VERSION"));
    debug!(?config, "configuration");

    let store = Arc::new(FileStore::new(config.data_dir.clone()));
    let ctx = Context { config, store };
    let mut out = std::io::stdout().lock();

    run(&ctx, &matches, &mut out).await?;
    out.flush()?;
    Ok(())
}

async fn run(ctx: &Context, matches: &ArgMatches, out: &mut impl Write) -> Result<()> {
    match matches.subcommand() {
        Some(("db", args)) => match args.subcommand() {
            Some(("init", _)) => commands::db_init(ctx, out),
            Some(("reset", _)) => commands::db_reset(ctx, out),
            Some(("summary", _)) => commands::db_summary(ctx, out),
            _ => unreachable!("db requires a subcommand"),
        },
        Some(("accounts", args)) => {
            let phone = args.get_one::<String>("phone").map(String::as_str);
            commands::accounts(ctx, phone, out)
        }
        Some(("onboard", args)) => {
            let options = OnboardOptions {
                phone: args.get_one::<String>("phone").cloned().unwrap_or_default(),
                email: args.get_one::<String>("email").cloned().unwrap_or_default(),
                fail_submit: args.get_flag("fail-submit"),
            };
            commands::onboard(ctx, &options, out).await
        }
        Some(("peers", args)) => {
            let origin = args
                .get_one::<String>("origin")
                .context("--origin is required")?;
            let extra: Vec<String> = args
                .get_many::<String>("peer")
                .map(|peers| peers.cloned().collect())
                .unwrap_or_default();
            commands::peers(ctx, origin, &extra, out)
        }
        Some(("session", args)) => match args.subcommand() {
            Some(("create", create)) => {
                let phone = create
                    .get_one::<String>("phone")
                    .context("phone is required")?;
                commands::session_create(ctx, phone, out)
            }
            Some(("show", _)) => commands::session_show(ctx, out),
            Some(("clear", _)) => commands::session_clear(ctx, out),
            _ => unreachable!("session requires a subcommand"),
        },
        _ => unreachable!("a subcommand is required"),
    }
}
