//! projectwatch CLI
//!
//! Watches the JDK release listing and each release's JEP list, posting
//! changes to Discord webhooks.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use projectwatch::{
    error::{AppError, Result},
    models::Config,
    pipeline::Monitor,
    storage::{LocalStorage, SnapshotStore},
};

/// projectwatch - JDK release and JEP change notifier
#[derive(Parser, Debug)]
#[command(
    name = "projectwatch",
    version,
    about = "Notify Discord about JDK release and JEP changes"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Snapshot directory (overrides `storage.cache_dir`)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check periodically until Ctrl-C
    Run {
        /// Seconds between cycles (overrides `watcher.interval_secs`)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Run a single cycle and exit
    Once,

    /// Validate the configuration file
    Validate,

    /// Show snapshot slots and their backups
    Info,
}

fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn resolve_cache_dir(cli: &Cli, config: &Config) -> PathBuf {
    match &cli.cache_dir {
        Some(dir) => dir.clone(),
        None => {
            let base = cli
                .config
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            config.cache_dir(base)
        }
    }
}

async fn describe_slot(name: &str, store: &dyn SnapshotStore) -> Result<()> {
    let backups = store.list_backups().await?;
    let state = if store.load_previous().await?.is_some() {
        "committed"
    } else {
        "empty"
    };
    log::info!(
        "  {:<12} {} ({} backups{})",
        name,
        state,
        backups.len(),
        backups
            .last()
            .map(|b| format!(", latest {b}"))
            .unwrap_or_default()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config)?;
    init_logging(cli.verbose, &config.logging.level);

    if !cli.config.exists() {
        log::warn!(
            "Config {} not found, using defaults",
            cli.config.display()
        );
    }

    let cache_dir = resolve_cache_dir(&cli, &config);

    match cli.command {
        Command::Run { interval } => {
            config.validate()?;
            let interval = Duration::from_secs(interval.unwrap_or(config.watcher.interval_secs));
            if interval.is_zero() {
                return Err(AppError::validation("--interval must be > 0"));
            }

            log::info!(
                "Watching {} every {}s, snapshots in {}",
                config.source.listing_url,
                interval.as_secs(),
                cache_dir.display()
            );
            if config.notify.webhooks.is_empty() {
                log::warn!("No webhooks configured, changes will only be logged");
            }

            let mut monitor = Monitor::from_config(&config, &cache_dir)?;
            monitor
                .run(interval, async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        log::error!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                })
                .await;
        }

        Command::Once => {
            config.validate()?;
            let mut monitor = Monitor::from_config(&config, &cache_dir)?;
            let summary = monitor.run_cycle().await;

            if let Some(e) = summary.listing_error {
                return Err(e);
            }
        }

        Command::Validate => {
            log::info!("Validating {}...", cli.config.display());

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} webhooks, {} item selectors)",
                config.notify.webhooks.len(),
                config.extract.item_selectors.len()
            );
        }

        Command::Info => {
            let storage = LocalStorage::new(&cache_dir);
            log::info!("Cache directory: {}", storage.root().display());

            describe_slot("listing", &storage.listing_slot()).await?;

            let projects = storage.project_slots().await?;
            if projects.is_empty() {
                log::info!("No project slots yet.");
            }
            for (name, store) in &projects {
                describe_slot(name, store).await?;
            }
        }
    }

    Ok(())
}
