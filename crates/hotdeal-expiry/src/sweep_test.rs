use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use hotdeal_core::{
    DealRecord, DealSource, DealStatus, DealStore, ExpiryConfig, NormalizedDeal, StoreError,
    UNKNOWN_CATEGORY, UNKNOWN_SELLER,
};

use super::{extend_deal, reactivate_deal, run_expiry_sweep};

struct SweepStore {
    records: Mutex<Vec<DealRecord>>,
    /// Ids whose status transitions fail.
    poison: Vec<Uuid>,
}

impl SweepStore {
    fn with(records: Vec<DealRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            poison: Vec::new(),
        }
    }

    fn get(&self, id: Uuid) -> DealRecord {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .expect("record should exist")
    }
}

#[async_trait]
impl DealStore for SweepStore {
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
            .find(|r| r.source == source && r.source_id == source_id)
            .cloned())
    }

    async fn create(&self, _deal: &NormalizedDeal) -> Result<DealRecord, StoreError> {
        Err(StoreError::Backend("not used by the sweep".to_string()))
    }

    async fn update(&self, id: Uuid, _deal: &NormalizedDeal) -> Result<DealRecord, StoreError> {
        Err(StoreError::NotFound(id))
    }

    async fn count_active(&self) -> Result<u64, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status == DealStatus::Active)
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
            .filter(|r| r.status == DealStatus::Active)
            .cloned()
            .collect();
        active.sort_by_key(|r| r.end_date);
        Ok(active
            .into_iter()
            .skip(usize::try_from(offset).unwrap())
            .take(usize::try_from(limit).unwrap())
            .collect())
    }

    async fn mark_expired(&self, id: Uuid) -> Result<(), StoreError> {
        if self.poison.contains(&id) {
            return Err(StoreError::Backend("simulated transition failure".to_string()));
        }
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
        slot.end_date += Duration::hours(additional_hours);
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

fn record(end_date: DateTime<Utc>, status: DealStatus) -> DealRecord {
    let now = Utc::now();
    DealRecord {
        id: Uuid::new_v4(),
        source: DealSource::Ppomppu,
        source_id: Uuid::new_v4().simple().to_string(),
        title: "테스트 특가".to_string(),
        description: None,
        sale_price: 9_900,
        original_price: 9_900,
        discount_rate: 0,
        seller: UNKNOWN_SELLER.to_string(),
        category: UNKNOWN_CATEGORY.to_string(),
        is_free_shipping: false,
        original_url: String::new(),
        thumbnail_url: String::new(),
        image_url: String::new(),
        author_name: String::new(),
        views: 0,
        like_count: 0,
        comment_count: 0,
        status,
        created_at: now - Duration::days(30),
        end_date,
        updated_at: now,
        deleted_at: None,
    }
}

fn config() -> ExpiryConfig {
    ExpiryConfig {
        batch_pause_ms: 0,
        ..ExpiryConfig::default()
    }
}

#[tokio::test]
async fn overdue_deals_expire_and_near_deadline_ones_warn() {
    let now = Utc::now();
    let overdue = record(now - Duration::hours(2), DealStatus::Active);
    let soon = record(now + Duration::hours(5), DealStatus::Active);
    let healthy = record(now + Duration::days(10), DealStatus::Active);
    let overdue_id = overdue.id;
    let healthy_id = healthy.id;
    let store = SweepStore::with(vec![overdue, soon, healthy]);

    let stats = run_expiry_sweep(&store, &config(), now).await.expect("sweep");

    assert_eq!(stats.total_checked, 3);
    assert_eq!(stats.expired, 1);
    assert_eq!(stats.expiring_soon, 1);
    assert_eq!(stats.errors, 0);
    assert_eq!(store.get(overdue_id).status, DealStatus::Expired);
    assert_eq!(store.get(healthy_id).status, DealStatus::Active);
}

#[tokio::test]
async fn repeated_sweep_is_a_no_op() {
    let now = Utc::now();
    let store = SweepStore::with(vec![record(now - Duration::hours(1), DealStatus::Active)]);

    let first = run_expiry_sweep(&store, &config(), now).await.expect("sweep");
    assert_eq!(first.expired, 1);

    // Already expired records are outside the active set on the second pass.
    let second = run_expiry_sweep(&store, &config(), now).await.expect("sweep");
    assert_eq!(second.total_checked, 0);
    assert_eq!(second.expired, 0);
}

#[tokio::test]
async fn dry_run_counts_without_writing() {
    let now = Utc::now();
    let overdue = record(now - Duration::hours(1), DealStatus::Active);
    let overdue_id = overdue.id;
    let store = SweepStore::with(vec![overdue]);
    let config = ExpiryConfig {
        dry_run: true,
        ..config()
    };

    let stats = run_expiry_sweep(&store, &config, now).await.expect("sweep");

    assert_eq!(stats.expired, 1);
    assert_eq!(store.get(overdue_id).status, DealStatus::Active);
}

#[tokio::test]
async fn one_failing_transition_does_not_stop_the_sweep() {
    let now = Utc::now();
    let poisoned = record(now - Duration::hours(3), DealStatus::Active);
    let other = record(now - Duration::hours(2), DealStatus::Active);
    let poisoned_id = poisoned.id;
    let other_id = other.id;
    let mut store = SweepStore::with(vec![poisoned, other]);
    store.poison.push(poisoned_id);

    let stats = run_expiry_sweep(&store, &config(), now).await.expect("sweep");

    assert_eq!(stats.expired, 1);
    assert_eq!(stats.errors, 1);
    assert_eq!(store.get(other_id).status, DealStatus::Expired);
}

#[tokio::test]
async fn small_batches_cover_the_whole_active_set() {
    let now = Utc::now();
    let records: Vec<DealRecord> = (0..5)
        .map(|_| record(now - Duration::hours(1), DealStatus::Active))
        .collect();
    let store = SweepStore::with(records);
    let config = ExpiryConfig {
        batch_size: 2,
        ..config()
    };

    let stats = run_expiry_sweep(&store, &config, now).await.expect("sweep");

    assert_eq!(stats.expired, 5);
}

#[tokio::test]
async fn deal_with_minutes_left_survives_the_sweep() {
    let now = Utc::now();
    let almost_due = record(now + Duration::minutes(30), DealStatus::Active);
    let id = almost_due.id;
    let store = SweepStore::with(vec![almost_due]);

    let stats = run_expiry_sweep(&store, &config(), now).await.expect("sweep");

    assert_eq!(stats.expired, 0);
    assert_eq!(stats.expiring_soon, 1);
    assert_eq!(store.get(id).status, DealStatus::Active);
}

#[tokio::test]
async fn extend_pushes_the_stored_deadline_forward() {
    let now = Utc::now();
    let expired = record(now - Duration::hours(6), DealStatus::Expired);
    let id = expired.id;
    let old_end = expired.end_date;
    let store = SweepStore::with(vec![expired]);

    let new_end = extend_deal(&store, id, 48).await.expect("extend");

    assert_eq!(new_end, old_end + Duration::hours(48));
    let record = store.get(id);
    assert_eq!(record.status, DealStatus::Active);
    assert_eq!(record.end_date, new_end);
}

#[tokio::test]
async fn extend_never_shortens_a_deal_with_lifetime_left() {
    let now = Utc::now();
    let active = record(now + Duration::days(10), DealStatus::Active);
    let id = active.id;
    let old_end = active.end_date;
    let store = SweepStore::with(vec![active]);

    let new_end = extend_deal(&store, id, 48).await.expect("extend");

    assert_eq!(new_end, old_end + Duration::hours(48));
    assert!(new_end > old_end);
}

#[tokio::test]
async fn reactivate_applies_only_to_expired_deals() {
    let now = Utc::now();
    let expired = record(now - Duration::hours(6), DealStatus::Expired);
    let active = record(now + Duration::days(5), DealStatus::Active);
    let expired_id = expired.id;
    let active_id = active.id;
    let active_end = active.end_date;
    let store = SweepStore::with(vec![expired, active]);

    assert!(reactivate_deal(&store, expired_id, 72, now).await.expect("reactivate"));
    assert_eq!(store.get(expired_id).status, DealStatus::Active);

    // Already-active deals are untouched.
    assert!(!reactivate_deal(&store, active_id, 72, now).await.expect("reactivate"));
    assert_eq!(store.get(active_id).end_date, active_end);
}
