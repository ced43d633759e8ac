//! Holiday calendar CLI
//!
//! Runs the refresh/backup service or inspects the calendar and its snapshots.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use holidays::{
    crawler::{ConsultantCrawler, Crawler},
    error::{AppError, Result},
    models::Config,
    service::{Backuper, Service},
    storage::{HolidayGetter, MemoryStore},
    utils::target_year,
};

/// holidays - Production calendar keeper
#[derive(Parser, Debug)]
#[command(name = "holidays", version, about = "Production calendar keeper")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "holidays.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape one year and print it as JSON
    Scrape {
        /// Calendar year (default: the year a refresh would target today)
        #[arg(long)]
        year: Option<i32>,
    },

    /// Restore the latest backup and run periodic updates and backups until Ctrl-C
    Run,

    /// Print stored days between two dates from the latest backup (never deletes backups)
    Show {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last day (YYYY-MM-DD, default: same as --from)
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// List retained backups, newest first (never deletes backups)
    Info,

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

/// Open the backup directory for reading. Nothing is purged, whatever
/// `max_backups` says.
async fn inspect_backups(mut config: Config) -> Result<(Arc<MemoryStore>, Backuper)> {
    if config.backuper.disabled {
        return Err(AppError::BackuperDisabled);
    }
    config.defaultize();
    config.validate()?;

    let store = Arc::new(MemoryStore::new());
    let backuper = Backuper::inspect(
        store.clone(),
        config.backuper.period(),
        config.backuper.base_path,
        config.backuper.max_backups,
    )
    .await?;
    Ok((store, backuper))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    log::debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Scrape { year } => {
            let year = year.unwrap_or_else(|| target_year(Local::now().date_naive()));
            let crawler = ConsultantCrawler::new(&config.crawler)?;
            let records = crawler.scrape_year(year).await?;

            log::info!("Scraped {} days for {}", records.len(), year);
            println!("{}", serde_json::to_string_pretty(&records)?);
        }

        Command::Run => {
            let crawler: Arc<dyn Crawler> = Arc::new(ConsultantCrawler::new(&config.crawler)?);
            let service = Service::new(config, Some(crawler)).await?;

            if service.backuper().is_some() {
                if let Err(e) = service.restore_storage().await {
                    log::warn!("Starting with an empty calendar: {}", e);
                }
            }

            service.run();
            log::info!("Service running, press Ctrl-C to stop");

            tokio::signal::ctrl_c().await?;
            log::info!("Shutting down...");
            service.stop();
        }

        Command::Show { from, to } => {
            let (store, backuper) = inspect_backups(config).await?;
            backuper.restore_storage().await?;

            for record in store.get_range(from, to.unwrap_or(from))? {
                println!("{}", record);
            }
        }

        Command::Info => match inspect_backups(config).await {
            Ok((_, backuper)) => {
                log::info!("Backup directory: {}", backuper.base_path().display());
                let backups = backuper.backups();
                if backups.is_empty() {
                    log::info!("No backups found yet.");
                }
                for path in backups {
                    println!("{}", path.display());
                }
            }
            Err(AppError::BackuperDisabled) => log::info!("Backuper is disabled."),
            Err(e) => return Err(e),
        },

        Command::Validate => {
            log::info!("Validating configuration...");

            let mut config = config;
            config.defaultize();
            let checked = config.validate().and_then(|()| {
                if config.updater.disabled {
                    Ok(())
                } else {
                    config.crawler.validate()
                }
            });
            if let Err(e) = checked {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }
    }

    Ok(())
}
