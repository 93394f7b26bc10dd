//! Job bodies shared by the cron scheduler and the manual trigger endpoints,
//! so a POSTed job and a scheduled fire run exactly the same code.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;

use hotdeal_core::{AppConfig, CrawlRunStats, DealSource, ExpirySnapshot, ExpiryStats};
use hotdeal_crawler::{adapter_for, BrowserPageSource, BrowserSession};
use hotdeal_db::PgDealStore;

/// One full expiry sweep over the active set.
pub async fn run_expiry_job(pool: &PgPool, config: &AppConfig) -> anyhow::Result<ExpiryStats> {
    let store = PgDealStore::new(pool.clone());
    let stats = hotdeal_expiry::run_expiry_sweep(&store, &config.expiry, Utc::now()).await?;
    Ok(stats)
}

/// Lifecycle snapshot for the daily report; the numbers are logged here and
/// returned for the manual endpoint.
pub async fn run_report_job(pool: &PgPool) -> anyhow::Result<ExpirySnapshot> {
    let snapshot = hotdeal_db::expiry_snapshot(pool).await?;
    tracing::info!(
        active = snapshot.active,
        expired = snapshot.expired,
        expiring_soon = snapshot.expiring_soon,
        expired_today = snapshot.expired_today,
        "daily deal report"
    );
    Ok(snapshot)
}

/// Weekly maintenance: a sweep to catch anything the hourly fires missed,
/// followed by a snapshot for the log.
pub async fn run_maintenance_job(pool: &PgPool, config: &AppConfig) -> anyhow::Result<ExpiryStats> {
    let stats = run_expiry_job(pool, config).await?;
    run_report_job(pool).await?;
    Ok(stats)
}

/// Crawls one source (or all registered sources when `source` is `None`)
/// through a fresh browser session.
///
/// One source failing does not stop the others; its entry simply reports the
/// error.
pub async fn run_crawl_job(
    pool: &PgPool,
    config: &AppConfig,
    source: Option<DealSource>,
) -> anyhow::Result<Vec<(DealSource, anyhow::Result<CrawlRunStats>)>> {
    let crawler_config = config.crawler.clone();
    let session = tokio::task::spawn_blocking({
        let crawler_config = crawler_config.clone();
        move || BrowserSession::launch(&crawler_config)
    })
    .await??;
    let session = Arc::new(session);
    let store = PgDealStore::new(pool.clone());

    let sources: Vec<DealSource> = match source {
        Some(one) => vec![one],
        None => DealSource::all().to_vec(),
    };

    let mut results = Vec::with_capacity(sources.len());
    for source in sources {
        let pages = BrowserPageSource::new(Arc::clone(&session), adapter_for(source));
        let outcome =
            hotdeal_crawler::run_crawl(&pages, &store, &crawler_config, Utc::now()).await;
        results.push((source, outcome.map_err(anyhow::Error::from)));
    }
    Ok(results)
}
