use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repovault::config::expand_dir;
use repovault::{Config, EventSink, Settings, UpdateKind};

/// Exit status for a completed run with per-repository failures
const PARTIAL_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "repovault")]
#[command(about = "Mirror every repository of a GitHub account into a local directory")]
#[command(disable_version_flag = true)]
#[command(after_help = "At least one of --account or --secret must be specified.")]
struct Cli {
    /// Directory to save the repositories to
    #[arg(required_unless_present = "version")]
    directory: Option<String>,

    /// GitHub user or organization to back up. Without it, every repository
    /// the authenticated user can access is backed up.
    #[arg(short, long, default_value = "")]
    account: String,

    /// Password or personal access token for the GitHub API (falls back to
    /// GITHUB_TOKEN). Raises rate limits and enables private repositories.
    #[arg(short, long)]
    secret: Option<String>,

    /// Maximum number of repositories synced in parallel
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Settings file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Suppress informational output; errors are still printed
    #[arg(long)]
    silent: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print binary version
    #[arg(long)]
    version: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.version {
        println!(
            "repovault {} {} {}",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        );
        return Ok(ExitCode::SUCCESS);
    }

    let settings = load_settings(cli.config.as_deref(), cli.concurrency)?;
    init_logging(&settings.logging.level, cli.verbose);

    let secret = cli
        .secret
        .clone()
        .or_else(|| std::env::var("GITHUB_TOKEN").ok())
        .unwrap_or_default();

    if cli.account.trim().is_empty() && secret.is_empty() {
        eprintln!("error: at least one of --account or --secret must be specified\n");
        Cli::command().print_help()?;
        return Ok(ExitCode::FAILURE);
    }

    let directory = cli.directory.as_deref().unwrap_or_default();
    let target_dir = expand_dir(directory)?;

    info!("Starting repovault v{}", env!("CARGO_PKG_VERSION"));

    let (updates, mut receiver) = EventSink::channel(256);
    let silent = cli.silent;
    let printer = tokio::spawn(async move {
        while let Some(update) = receiver.recv().await {
            match update.kind {
                UpdateKind::Error => eprintln!("{}", update.message),
                UpdateKind::Info if !silent => eprintln!("{}", update.message),
                UpdateKind::Info => {}
            }
        }
    });

    let config = Config::new(cli.account, secret, target_dir, updates).with_settings(settings);
    let outcome = repovault::run(config).await;

    // The run owned the only sender; draining finishes once it is dropped
    printer.await.context("Update printer task failed")?;

    let result = outcome.context("Backup failed")?;

    if !cli.silent {
        eprintln!(
            "Backed up {} repositories ({} failed) in {:.1}s",
            result.total(),
            result.failure_count,
            result.duration.as_secs_f64()
        );
    }

    if result.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(PARTIAL_FAILURE))
    }
}

/// Initialize logging; RUST_LOG takes precedence over the configured level
fn init_logging(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Load settings from the specified path or default location
fn load_settings(path: Option<&std::path::Path>, concurrency: Option<usize>) -> Result<Settings> {
    let mut settings = match path {
        Some(path) => Settings::load(path)?,
        None => Settings::load_or_default()?,
    };

    if let Some(concurrency) = concurrency {
        settings.sync.max_parallel = concurrency;
    }

    Ok(settings)
}
