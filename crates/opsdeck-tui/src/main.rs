//! `opsdeck` — live terminal console for a homelab infrastructure backend.
//!
//! Screens (number keys 1-5): Dashboard, Hosts, Smart Home, Incidents,
//! and Network. Data arrives over the backend's REST surface plus a
//! server-sent event stream for smart-home state; background pollers
//! pause whenever the terminal loses focus.
//!
//! Logs are written to a file (default `/tmp/opsdeck.log`) to avoid
//! corrupting the terminal UI.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and app
//! launch.

mod action;
mod app;
mod component;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use secrecy::SecretString;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use opsdeck_api::{HubClient, TransportConfig};
use opsdeck_config::prefs::PrefsStore;
use opsdeck_core::ConsoleConfig;

use crate::app::App;

/// Terminal console for monitoring a homelab: hosts, containers,
/// services, network devices, smart home, and incidents.
#[derive(Parser, Debug)]
#[command(name = "opsdeck", version, about)]
struct Cli {
    /// Backend base URL (e.g., http://127.0.0.1:8000)
    #[arg(short = 'u', long, env = "OPSDECK_URL")]
    url: Option<String>,

    /// Bearer token for the backend
    #[arg(short = 'k', long, env = "OPSDECK_TOKEN")]
    token: Option<String>,

    /// Config profile name (from the config file)
    #[arg(short = 'p', long)]
    profile: Option<String>,

    /// Disable the smart-home event stream (poll only)
    #[arg(long)]
    no_stream: bool,

    /// Log file path (defaults to /tmp/opsdeck.log)
    #[arg(long, default_value = "/tmp/opsdeck.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr — that
/// would corrupt the TUI output. Returns a guard that must be held for
/// the lifetime of the application to ensure logs are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("opsdeck={log_level},opsdeck_core={log_level},opsdeck_api={log_level}")));

    let log_dir = cli.log_file.parent().unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("opsdeck.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Resolve the runtime config. Priority: CLI flags > config profile.
fn resolve_config(cli: &Cli) -> Result<ConsoleConfig> {
    if let Some(url_str) = cli.url.as_deref() {
        let url = url_str
            .parse()
            .map_err(|e| eyre!("invalid backend URL {url_str:?}: {e}"))?;

        return Ok(ConsoleConfig {
            url,
            api_token: cli.token.clone().map(SecretString::from),
            sse_enabled: !cli.no_stream,
            ..ConsoleConfig::default()
        });
    }

    let file_config = opsdeck_config::load_config()
        .map_err(|e| eyre!("failed to load config: {e}"))?;
    let mut config = opsdeck_config::resolve_profile(&file_config, cli.profile.as_deref())
        .map_err(|e| eyre!("{e}\n\nSet --url or create a profile in config.toml"))?;

    if cli.no_stream {
        config.sse_enabled = false;
    }
    if let Some(token) = &cli.token {
        config.api_token = Some(SecretString::from(token.clone()));
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    // Tracing to file — hold the guard so logs flush on exit
    let _log_guard = setup_tracing(&cli);

    let config = resolve_config(&cli)?;

    info!(url = %config.url, sse = config.sse_enabled, "starting opsdeck");

    let transport = TransportConfig::rest(config.api_token.clone());
    let client = HubClient::new(config.url.as_str(), &transport)
        .map_err(|e| eyre!("failed to build backend client: {e}"))?;

    let prefs_path = PrefsStore::default_path()
        .unwrap_or_else(|| PathBuf::from(".opsdeck-prefs.toml"));
    let prefs = PrefsStore::open(prefs_path);

    let mut app = App::new(client, transport, config, prefs);
    app.run().await?;

    Ok(())
}
