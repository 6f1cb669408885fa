//! airdrop-watch CLI
//!
//! Thin harness around the check pipeline. Schedule `check` from cron, or
//! let `watch` repeat it on the configured interval.

use std::path::PathBuf;

use airdrop_watch::{
    error::Result,
    models::Config,
    pipeline::{CheckContext, CheckOutcome, run_check},
    services::{AirdropClient, AirdropSource, LogNotifier, Notifier, ServerChanNotifier},
    storage::LocalSnapshotStore,
    utils,
};
use clap::{Parser, Subcommand};

/// airdrop-watch - Airdrop calendar notifier
#[derive(Parser, Debug)]
#[command(name = "airdrop-watch", version, about = "Airdrop calendar notifier")]
struct Cli {
    /// Path to the JSON or TOML configuration file
    #[arg(short, long, default_value = "config/config.json")]
    config: PathBuf,

    /// Override the snapshot file from the configuration
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single check
    Check {
        /// Log the message instead of pushing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Run checks forever on the configured interval
    Watch {
        /// Log the message instead of pushing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Fetch the raw airdrop list and print the first records
    Fetch {
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn build_notifier(config: &Config, dry_run: bool) -> Result<Box<dyn Notifier>> {
    if dry_run {
        return Ok(Box::new(LogNotifier));
    }
    Ok(Box::new(ServerChanNotifier::new(&config.notify)?))
}

async fn check_once(
    config: &Config,
    client: &AirdropClient,
    store: &LocalSnapshotStore,
    notifier: &dyn Notifier,
) -> CheckOutcome {
    let ctx = CheckContext {
        config,
        source: client,
        prices: client,
        store,
        notifier,
    };
    let report = run_check(&ctx, utils::today_utc()).await;
    log::info!(
        "Check finished: {:?} ({} item(s){})",
        report.outcome,
        report.item_count,
        if report.persist_failed {
            ", snapshot not saved"
        } else {
            ""
        }
    );
    report.outcome
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(&cli.config)?;
    config.validate()?;
    if let Some(path) = &cli.snapshot {
        config.storage.snapshot_path = path.display().to_string();
    }
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Validate => {
            log::info!(
                "Configuration OK: {} send key(s), every {} min, TGE filter {}",
                config.send_keys.len(),
                config.interval_minutes,
                if config.filter_tge { "on" } else { "off" }
            );
        }

        Command::Fetch { limit } => {
            let client = AirdropClient::new(&config.fetch)?;
            let airdrops = client.fetch_airdrops().await?;
            println!("Fetched {} airdrops", airdrops.len());
            for item in airdrops.iter().take(limit) {
                println!(
                    "{}({}) date {} time {} amount {} phase {}",
                    item.token, item.name, item.date, item.time, item.amount, item.phase
                );
            }
        }

        Command::Check { dry_run } => {
            let client = AirdropClient::new(&config.fetch)?;
            let store = LocalSnapshotStore::new(&config.storage.snapshot_path);
            let notifier = build_notifier(&config, dry_run)?;
            check_once(&config, &client, &store, notifier.as_ref()).await;
        }

        Command::Watch { dry_run } => {
            let client = AirdropClient::new(&config.fetch)?;
            let store = LocalSnapshotStore::new(&config.storage.snapshot_path);
            let notifier = build_notifier(&config, dry_run)?;

            log::info!("Watching every {} minute(s)", config.interval_minutes);
            let mut ticker = tokio::time::interval(config.interval());
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                check_once(&config, &client, &store, notifier.as_ref()).await;
            }
        }
    }

    Ok(())
}
