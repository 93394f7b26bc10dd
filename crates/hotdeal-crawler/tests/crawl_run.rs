//! Run-loop semantics exercised against canned pages and an in-memory store.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use hotdeal_core::{
    CrawlerConfig, DealRecord, DealSource, DealStatus, DealStore, NormalizedDeal, StoreError,
};
use hotdeal_crawler::{run_crawl, DealPageSource, RawListItem};

struct StubPages {
    source: DealSource,
    pages: Vec<Vec<RawListItem>>,
}

#[async_trait]
impl DealPageSource for StubPages {
    fn source(&self) -> DealSource {
        self.source
    }

    async fn fetch_page(&self, page: u32) -> Result<Vec<RawListItem>, hotdeal_crawler::CrawlerError> {
        let index = page.checked_sub(1).map(|i| i as usize);
        Ok(index
            .and_then(|i| self.pages.get(i))
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct MemoryStore {
    records: Mutex<Vec<DealRecord>>,
    /// Post ids whose writes fail, for isolation tests.
    poison: Vec<String>,
}

impl MemoryStore {
    fn records(&self) -> Vec<DealRecord> {
        self.records.lock().unwrap().clone()
    }

    fn to_record(id: Uuid, deal: &NormalizedDeal) -> DealRecord {
        DealRecord {
            id,
            source: deal.source,
            source_id: deal.source_id.clone(),
            title: deal.title.clone(),
            description: deal.description.clone(),
            sale_price: deal.sale_price,
            original_price: deal.original_price,
            discount_rate: deal.discount_rate,
            seller: deal.seller.clone(),
            category: deal.category.clone(),
            is_free_shipping: deal.is_free_shipping,
            original_url: deal.original_url.clone(),
            thumbnail_url: deal.thumbnail_url.clone(),
            image_url: deal.image_url.clone(),
            author_name: deal.author_name.clone(),
            views: deal.views,
            like_count: deal.like_count,
            comment_count: deal.comment_count,
            status: deal.status,
            created_at: deal.created_at,
            end_date: deal.end_date,
            updated_at: deal.updated_at,
            deleted_at: None,
        }
    }
}

#[async_trait]
impl DealStore for MemoryStore {
    async fn find_by_source_and_post_id(
        &self,
        source: DealSource,
        source_id: &str,
    ) -> Result<Option<DealRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.source == source && r.source_id == source_id && r.deleted_at.is_none())
            .cloned())
    }

    async fn create(&self, deal: &NormalizedDeal) -> Result<DealRecord, StoreError> {
        if self.poison.contains(&deal.source_id) {
            return Err(StoreError::Backend("simulated write failure".to_string()));
        }
        let record = Self::to_record(Uuid::new_v4(), deal);
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: Uuid, deal: &NormalizedDeal) -> Result<DealRecord, StoreError> {
        if self.poison.contains(&deal.source_id) {
            return Err(StoreError::Backend("simulated write failure".to_string()));
        }
        let mut records = self.records.lock().unwrap();
        let slot = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        *slot = Self::to_record(id, deal);
        Ok(slot.clone())
    }

    async fn count_active(&self) -> Result<u64, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status == DealStatus::Active && r.deleted_at.is_none())
            .count() as u64)
    }

    async fn list_active_by_end_date(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DealRecord>, StoreError> {
        let mut active: Vec<DealRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status == DealStatus::Active && r.deleted_at.is_none())
            .cloned()
            .collect();
        active.sort_by_key(|r| r.end_date);
        Ok(active
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn mark_expired(&self, id: Uuid) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        let slot = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        slot.status = DealStatus::Expired;
        Ok(())
    }

    async fn extend_expiry(
        &self,
        id: Uuid,
        additional_hours: i64,
    ) -> Result<DateTime<Utc>, StoreError> {
        let mut records = self.records.lock().unwrap();
        let slot = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        slot.end_date += chrono::Duration::hours(additional_hours);
        slot.status = DealStatus::Active;
        Ok(slot.end_date)
    }

    async fn reactivate_expired(
        &self,
        id: Uuid,
        new_end_date: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap();
        let slot = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        if slot.status != DealStatus::Expired {
            return Ok(false);
        }
        slot.status = DealStatus::Active;
        slot.end_date = new_end_date;
        Ok(true)
    }
}

fn item(post_id: &str, title: &str, date_text: &str) -> RawListItem {
    RawListItem {
        post_id: post_id.to_string(),
        title: title.to_string(),
        url: format!("https://www.ppomppu.co.kr/zboard/view.php?id=ppomppu&no={post_id}"),
        author: "작성자".to_string(),
        views: 100,
        like_count: 3,
        comment_count: 7,
        date_text: date_text.to_string(),
        category: String::new(),
        thumbnail_url: String::new(),
        is_sold_out: false,
        is_popular: false,
    }
}

fn config() -> CrawlerConfig {
    CrawlerConfig {
        max_pages: 1,
        page_delay_ms: 0,
        ..CrawlerConfig::default()
    }
}

// 09:00 UTC is 18:00 KST, the clock the boards' date cells run on.
fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 21, 9, 0, 0).unwrap()
}

#[tokio::test]
async fn recrawl_updates_instead_of_duplicating() {
    let store = MemoryStore::default();
    let first = StubPages {
        source: DealSource::Ppomppu,
        pages: vec![vec![item("1001", "[쿠팡] 생수 2L (6,900원/무료)", "14:02")]],
    };

    let stats = run_crawl(&first, &store, &config(), fixed_now())
        .await
        .expect("run");
    assert_eq!(stats.new_deals, 1);
    assert_eq!(stats.updated_deals, 0);

    let mut changed = item("1001", "[쿠팡] 생수 2L (6,900원/무료)", "14:02");
    changed.views = 950;
    let second = StubPages {
        source: DealSource::Ppomppu,
        pages: vec![vec![changed]],
    };

    let stats = run_crawl(&second, &store, &config(), fixed_now())
        .await
        .expect("run");
    assert_eq!(stats.new_deals, 0);
    assert_eq!(stats.updated_deals, 1);

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].views, 950);
}

#[tokio::test]
async fn time_filter_stops_at_first_stale_item() {
    let store = MemoryStore::default();
    let pages = StubPages {
        source: DealSource::Ppomppu,
        pages: vec![vec![
            item("2001", "[11번가] 최신딜 9,900원", "17:30"),
            item("2002", "[11번가] 묵은딜 9,900원", "12:00"),
            item("2003", "[11번가] 더묵은딜 9,900원", "09:00"),
        ]],
    };
    let config = CrawlerConfig {
        time_filter_hours: Some(2),
        ..config()
    };

    let stats = run_crawl(&pages, &store, &config, fixed_now())
        .await
        .expect("run");

    assert_eq!(stats.new_deals, 1);
    assert_eq!(store.records().len(), 1);
    assert_eq!(store.records()[0].source_id, "2001");
}

#[tokio::test]
async fn one_failing_item_does_not_abort_the_page() {
    let store = MemoryStore {
        poison: vec!["3002".to_string()],
        ..MemoryStore::default()
    };
    let pages = StubPages {
        source: DealSource::Clien,
        pages: vec![vec![
            item("3001", "키보드 45,000원", "16:00"),
            item("3002", "마우스 19,000원", "16:05"),
            item("3003", "모니터암 32,000원", "16:10"),
        ]],
    };

    let stats = run_crawl(&pages, &store, &config(), fixed_now())
        .await
        .expect("run");

    assert_eq!(stats.total_crawled, 3);
    assert_eq!(stats.new_deals, 2);
    assert_eq!(stats.errors, 1);
    assert_eq!(store.records().len(), 2);
}

#[tokio::test]
async fn empty_page_continues_to_the_next() {
    let store = MemoryStore::default();
    let pages = StubPages {
        source: DealSource::Ppomppu,
        pages: vec![vec![], vec![item("4001", "[G마켓] 청소기 99,000원", "15:00")]],
    };
    let config = CrawlerConfig {
        max_pages: 2,
        ..config()
    };

    let stats = run_crawl(&pages, &store, &config, fixed_now())
        .await
        .expect("run");

    assert_eq!(stats.pages_visited, 2);
    assert_eq!(stats.new_deals, 1);
}

#[tokio::test]
async fn crawled_item_lands_fully_normalized() {
    let store = MemoryStore::default();
    let pages = StubPages {
        source: DealSource::Ppomppu,
        pages: vec![vec![item(
            "5001",
            "[쿠팡] 다우니 1L x 6개 (23,900원/무료)",
            "14:02",
        )]],
    };

    run_crawl(&pages, &store, &config(), fixed_now())
        .await
        .expect("run");

    let records = store.records();
    let record = &records[0];
    assert_eq!(record.sale_price, 23_900);
    assert_eq!(record.seller, "쿠팡");
    assert!(record.is_free_shipping);
    assert_eq!(record.status, DealStatus::Active);
    assert_eq!(
        record.created_at,
        Utc.with_ymd_and_hms(2026, 8, 21, 5, 2, 0).unwrap()
    );
}
