//! Operator CLI for one-off pipeline runs: crawl, expire, report, and the
//! manual extend/reactivate operations.

use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use hotdeal_core::DealSource;
use hotdeal_crawler::{adapter_for, BrowserPageSource, BrowserSession};
use hotdeal_db::PgDealStore;

#[derive(Debug, Parser)]
#[command(name = "hotdeal-cli")]
#[command(about = "Hotdeal pipeline command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl one source, or every registered source.
    Crawl {
        /// Source tag (ppomppu, clien); all sources when omitted.
        #[arg(long)]
        source: Option<DealSourceArg>,
        #[arg(long)]
        max_pages: Option<u32>,
        /// Only upsert posts newer than this many hours.
        #[arg(long)]
        time_filter_hours: Option<i64>,
        /// Run Chrome with a visible window.
        #[arg(long)]
        headed: bool,
        /// Visit each post's detail page for content and images.
        #[arg(long)]
        fetch_details: bool,
    },
    /// Run one expiry sweep over the active set.
    Expire {
        #[arg(long)]
        batch_size: Option<u64>,
        #[arg(long)]
        warning_hours: Option<i64>,
        /// Count transitions without writing them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the lifecycle snapshot.
    Report,
    /// Push a deal's deadline forward and force it active.
    Extend {
        #[arg(long)]
        id: Uuid,
        #[arg(long, default_value_t = 48)]
        hours: i64,
    },
    /// Bring an expired deal back with a fresh deadline.
    Reactivate {
        #[arg(long)]
        id: Uuid,
        #[arg(long, default_value_t = 72)]
        hours: i64,
    },
}

/// Thin clap-friendly wrapper; `DealSource` itself stays clap-free.
#[derive(Debug, Clone, Copy)]
struct DealSourceArg(DealSource);

impl std::str::FromStr for DealSourceArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(DealSourceArg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = hotdeal_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let pool_config = hotdeal_db::PoolConfig::from_app_config(&config);
    let pool = hotdeal_db::connect_pool(&config.database_url, pool_config).await?;
    hotdeal_db::run_migrations(&pool).await?;
    let store = PgDealStore::new(pool.clone());

    match cli.command {
        Commands::Crawl {
            source,
            max_pages,
            time_filter_hours,
            headed,
            fetch_details,
        } => {
            let mut crawler_config = config.crawler.clone();
            if let Some(max_pages) = max_pages {
                crawler_config.max_pages = max_pages;
            }
            if time_filter_hours.is_some() {
                crawler_config.time_filter_hours = time_filter_hours;
            }
            if headed {
                crawler_config.headless = false;
            }
            if fetch_details {
                crawler_config.fetch_details = true;
            }

            let session = tokio::task::spawn_blocking({
                let crawler_config = crawler_config.clone();
                move || BrowserSession::launch(&crawler_config)
            })
            .await??;
            let session = Arc::new(session);

            let sources: Vec<DealSource> = match source {
                Some(DealSourceArg(one)) => vec![one],
                None => DealSource::all().to_vec(),
            };

            for source in sources {
                let pages = BrowserPageSource::new(Arc::clone(&session), adapter_for(source));
                match hotdeal_crawler::run_crawl(&pages, &store, &crawler_config, Utc::now()).await
                {
                    Ok(stats) => println!(
                        "{source}: {}",
                        serde_json::to_string_pretty(&stats)?
                    ),
                    Err(e) => tracing::error!(%source, "crawl failed: {e}"),
                }
            }
        }
        Commands::Expire {
            batch_size,
            warning_hours,
            dry_run,
        } => {
            let mut expiry_config = config.expiry;
            if let Some(batch_size) = batch_size {
                expiry_config.batch_size = batch_size;
            }
            if let Some(warning_hours) = warning_hours {
                expiry_config.warning_hours = warning_hours;
            }
            expiry_config.dry_run = dry_run;

            let stats = hotdeal_expiry::run_expiry_sweep(&store, &expiry_config, Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Report => {
            let snapshot = hotdeal_db::expiry_snapshot(&pool).await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::Extend { id, hours } => {
            let new_end = hotdeal_expiry::extend_deal(&store, id, hours).await?;
            println!("deal {id} extended until {new_end}");
        }
        Commands::Reactivate { id, hours } => {
            if hotdeal_expiry::reactivate_deal(&store, id, hours, Utc::now()).await? {
                println!("deal {id} reactivated for {hours}h");
            } else {
                println!("deal {id} is not expired; nothing to do");
            }
        }
    }

    Ok(())
}
