//! hwbot CLI
//!
//! Main entry point for the homework status notifier.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use hwbot_watcher::{Config, Credentials, CycleOutcome, Poller, WatcherError};
use tracing_subscriber::EnvFilter;

/// hwbot - Homework Review Notifier
///
/// Polls the homework review API and posts a Telegram message whenever the
/// status of the latest submission changes. Reads PRACTICUM_TOKEN,
/// TELEGRAM_TOKEN and TELEGRAM_CHAT_ID from the environment or a .env file.
#[derive(Parser, Debug)]
#[command(name = "hwbot")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: hwbot.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,

    /// Append logs to this file instead of writing them to stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Must run before anything reads the environment.
    let dotenv = dotenvy::dotenv();

    if let Err(e) = init_tracing(&args) {
        eprintln!("Error: {e}");
        return ExitCode::from(1);
    }

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }

    tracing::info!("hwbot starting");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "{}", failure_label(&e));
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Names the kind of failure that ended the process.
fn failure_label(error: &anyhow::Error) -> &'static str {
    match error.downcast_ref::<WatcherError>() {
        Some(e) if e.is_fatal() => "Startup aborted",
        Some(_) => "Watcher stopped",
        None => "Program stopped",
    }
}

/// Initializes the tracing subscriber.
///
/// Priority: `RUST_LOG` env var > `--verbose` flag > default (info).
fn init_tracing(args: &Args) -> anyhow::Result<()> {
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match &args.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    anyhow::anyhow!(
                        "Cannot open log file '{}': {e}\n\nSuggestion: Check the path and write permissions",
                        path.display()
                    )
                })?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    Ok(())
}

/// Verifies the environment, builds the poller and runs it.
async fn run(args: Args) -> anyhow::Result<()> {
    // Credentials first: nothing touches the network without them.
    let credentials = Credentials::from_env()?;
    tracing::debug!(chat_id = %credentials.telegram_chat_id, "Credentials loaded");

    let config = load_config(args.config.as_deref())?;
    tracing::info!(
        endpoint = %config.endpoint,
        retry_period_secs = config.retry_period_secs,
        request_timeout_secs = config.request_timeout_secs,
        suppress_repeated_alerts = config.suppress_repeated_alerts,
        "Configuration loaded"
    );

    let mut poller = Poller::connect(&config, &credentials)?;

    if args.once {
        let outcome = poller.run_cycle().await;
        report_outcome(&outcome);
        return Ok(());
    }

    poller.run_until(shutdown_signal()).await;
    Ok(())
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&Path>) -> anyhow::Result<Config> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Ok(Config::load_from_file(path)?)
        }
        None => Ok(Config::load()?),
    }
}

/// Resolves on Ctrl+C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

/// Logs the result of a `--once` run.
fn report_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Notified { message } => {
            tracing::info!(message = %message, "Notification sent");
        }
        CycleOutcome::Duplicate => tracing::info!("Status unchanged"),
        CycleOutcome::NoHomeworks => tracing::info!("No homework updates"),
        CycleOutcome::DeliveryFailed { error, .. } => {
            tracing::warn!(error = %error, "Notification could not be delivered");
        }
        CycleOutcome::Failed { phase, error, .. } => {
            tracing::warn!(phase = %phase, error = %error, "Cycle failed");
        }
    }
}
