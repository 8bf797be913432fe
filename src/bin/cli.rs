//! jobwatch CLI
//!
//! One watch pass per invocation; schedule it with cron or a CI timer.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jobwatch::{
    config::{ConfigSource, load_config},
    error::Result,
    models::Config,
    pipeline,
    storage::known_state_size,
};

/// jobwatch - Job Listing Watcher
#[derive(Parser, Debug)]
#[command(
    name = "jobwatch",
    version,
    about = "Watches a job-listing service and announces new postings"
)]
struct Cli {
    /// Path to the TOML config file (default: ./jobwatch.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, diff, persist and notify once
    Run,

    /// Validate configuration
    Validate,

    /// Show the state backend and how many postings it knows
    Info,
}

/// Initialize logging before anything else can log.
///
/// `RUST_LOG` wins; otherwise INFO, or DEBUG with `--verbose`, until
/// [`apply_configured_level`] runs.
fn init_logging(verbose: bool) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace"))
        .format_timestamp_secs()
        .init();

    if !rust_log_set() {
        log::set_max_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        });
    }
}

/// Apply `[logging] level` unless `--verbose` or `RUST_LOG` already decided.
fn apply_configured_level(verbose: bool, configured: &str) {
    if verbose || rust_log_set() {
        return;
    }
    match configured.parse::<log::LevelFilter>() {
        Ok(level) => log::set_max_level(level),
        Err(_) => log::warn!("Unknown log level '{}'; staying at info", configured),
    }
}

fn rust_log_set() -> bool {
    std::env::var_os("RUST_LOG").is_some()
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = ConfigSource::from_arg(cli.config);
    let config = load_config(&source, env_lookup)?;
    apply_configured_level(cli.verbose, &config.logging.level);

    log::debug!("Configuration from {}", source.path().display());

    match cli.command {
        Command::Run => {
            let report = pipeline::run(&config).await?;
            log::info!(
                "Run complete: {} new, {} notified",
                report.new_entries.len(),
                report.dispatch.sent
            );
        }

        Command::Validate => {
            log::info!("Configuration is valid");
            print_config(&config);
        }

        Command::Info => {
            log::info!("State backend: {:?}", config.state.backend);
            log::info!("State location: {}", config.state.active_path().display());
            match known_state_size(&config.state).await? {
                Some(count) => log::info!("Known postings: {}", count),
                None => log::info!("Known postings: none (no state yet)"),
            }
        }
    }

    Ok(())
}

fn print_config(config: &Config) {
    log::info!("  Endpoint: {} ({:?})", config.search.endpoint, config.search.protocol);
    log::info!("  Location: {}", config.search.location);
    log::info!("  Keywords: {}", config.keywords().collect::<Vec<_>>().join(", "));
    log::info!(
        "  Recency: {} days (enforced: {})",
        config.filter.max_age_days,
        config.filter.enforce_recency
    );
    log::info!("  Page cap: {} per keyword", config.search.max_pages);
    log::info!("  State: {:?}", config.state.backend);
    log::info!(
        "  Notifications: {} (cap {})",
        if config.notify.credentials().is_some() {
            "telegram"
        } else {
            "disabled"
        },
        config.notify.dispatch_cap
    );
}
