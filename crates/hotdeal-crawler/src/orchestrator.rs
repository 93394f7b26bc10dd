//! Crawl run orchestration: page loop, time filter, per-item isolation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use hotdeal_core::{CrawlRunStats, CrawlerConfig, DealSource, DealStore};

use crate::adapters::SiteAdapter;
use crate::browser::BrowserSession;
use crate::error::CrawlerError;
use crate::gateway::{upsert_deal, UpsertOutcome};
use crate::normalize::normalize;
use crate::types::{RawDetailItem, RawListItem};

/// Where raw listing pages come from.
///
/// The production implementation drives a headless browser; tests substitute
/// canned pages so the run loop's semantics are checked without Chrome.
#[async_trait]
pub trait DealPageSource: Send + Sync {
    fn source(&self) -> DealSource;

    /// Items of one listing page, newest first. An empty vec is a valid
    /// page, not an error.
    async fn fetch_page(&self, page: u32) -> Result<Vec<RawListItem>, CrawlerError>;

    /// Optional detail-page enrichment for one item.
    async fn fetch_detail(
        &self,
        _item: &RawListItem,
    ) -> Result<Option<RawDetailItem>, CrawlerError> {
        Ok(None)
    }
}

/// [`DealPageSource`] backed by a shared Chrome session and one site adapter.
pub struct BrowserPageSource {
    session: Arc<BrowserSession>,
    adapter: &'static dyn SiteAdapter,
}

impl BrowserPageSource {
    #[must_use]
    pub fn new(session: Arc<BrowserSession>, adapter: &'static dyn SiteAdapter) -> Self {
        Self { session, adapter }
    }

    /// Runs one blocking fetch on the session and decodes its JSON payload.
    async fn fetch_decoded<T>(
        &self,
        url: String,
        wait_selector: &'static str,
        script: &'static str,
        context: &str,
    ) -> Result<Option<T>, CrawlerError>
    where
        T: serde::de::DeserializeOwned,
    {
        let session = Arc::clone(&self.session);
        let payload = tokio::task::spawn_blocking(move || {
            session.fetch_payload(&url, wait_selector, script)
        })
        .await
        .map_err(|e| CrawlerError::BrowserTask {
            reason: e.to_string(),
        })??;

        match payload {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|source| CrawlerError::Deserialize {
                    context: context.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DealPageSource for BrowserPageSource {
    fn source(&self) -> DealSource {
        self.adapter.source()
    }

    async fn fetch_page(&self, page: u32) -> Result<Vec<RawListItem>, CrawlerError> {
        let url = self.adapter.list_url(page);
        let context = format!("{} list page {page}", self.adapter.source());
        let items = self
            .fetch_decoded::<Vec<RawListItem>>(
                url,
                self.adapter.list_wait_selector(),
                self.adapter.list_script(),
                &context,
            )
            .await?;
        Ok(items.unwrap_or_default())
    }

    async fn fetch_detail(
        &self,
        item: &RawListItem,
    ) -> Result<Option<RawDetailItem>, CrawlerError> {
        if item.url.is_empty() {
            return Ok(None);
        }
        let context = format!("{} detail {}", self.adapter.source(), item.post_id);
        self.fetch_decoded::<RawDetailItem>(
            item.url.clone(),
            self.adapter.detail_wait_selector(),
            self.adapter.detail_script(),
            &context,
        )
        .await
    }
}

/// Crawls up to `config.max_pages` listing pages and upserts every item.
///
/// Failure semantics: a page that cannot be fetched aborts the run (the next
/// scheduled fire retries), while a single item failing to enrich or persist
/// only bumps the error counter. Listings are newest-first, so when the time
/// filter is set the first out-of-window item ends the whole run.
///
/// # Errors
///
/// Returns the page-level [`CrawlerError`] that aborted the run.
pub async fn run_crawl<P, S>(
    pages: &P,
    store: &S,
    config: &CrawlerConfig,
    now: DateTime<Utc>,
) -> Result<CrawlRunStats, CrawlerError>
where
    P: DealPageSource + ?Sized,
    S: DealStore + ?Sized,
{
    let source = pages.source();
    let started = Instant::now();
    let mut stats = CrawlRunStats::default();
    let cutoff = config
        .time_filter_hours
        .map(|hours| now - chrono::Duration::hours(hours));

    info!(%source, max_pages = config.max_pages, "crawl run starting");

    'pages: for page in 1..=config.max_pages {
        let items = pages.fetch_page(page).await?;
        stats.pages_visited += 1;

        if items.is_empty() {
            info!(%source, page, "empty listing page");
            continue;
        }

        for item in &items {
            stats.total_crawled += 1;

            let detail = if config.fetch_details {
                match pages.fetch_detail(item).await {
                    Ok(detail) => detail,
                    Err(e) => {
                        warn!(%source, post_id = %item.post_id, "detail fetch failed: {e}");
                        stats.errors += 1;
                        None
                    }
                }
            } else {
                None
            };

            let deal = normalize(source, item, detail.as_ref(), now);

            if let Some(cutoff) = cutoff {
                if deal.created_at < cutoff {
                    info!(
                        %source,
                        post_id = %item.post_id,
                        "reached the time-filter window, stopping"
                    );
                    break 'pages;
                }
            }

            match upsert_deal(store, &deal).await {
                Ok((UpsertOutcome::Created, _)) => stats.new_deals += 1,
                Ok((UpsertOutcome::Updated, _)) => stats.updated_deals += 1,
                Err(e) => {
                    warn!(%source, post_id = %item.post_id, "upsert failed: {e}");
                    stats.errors += 1;
                }
            }
            stats.deals.push(deal);
        }

        if page < config.max_pages && config.page_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.page_delay_ms)).await;
        }
    }

    stats.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        %source,
        total = stats.total_crawled,
        new = stats.new_deals,
        updated = stats.updated_deals,
        errors = stats.errors,
        "crawl run finished"
    );
    Ok(stats)
}
