use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::deals::{DealRecord, DealSource, NormalizedDeal};

/// Errors surfaced by a [`DealStore`] implementation.
///
/// Backend-specific failures are flattened to a message at this boundary so
/// callers can isolate them per item without depending on the storage crate.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("deal not found: {0}")]
    NotFound(Uuid),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// The persistent-store interface the pipeline is built around.
///
/// One Postgres implementation ships in `hotdeal-db`; tests substitute
/// in-memory implementations. Soft-deleted records are invisible through
/// every method. Concurrent writers to the same `(source, source_id)` key
/// resolve last-write-wins.
#[async_trait]
pub trait DealStore: Send + Sync {
    /// Natural-key lookup over non-deleted records.
    async fn find_by_source_and_post_id(
        &self,
        source: DealSource,
        source_id: &str,
    ) -> Result<Option<DealRecord>, StoreError>;

    /// Persist a new deal; the store assigns the durable id.
    async fn create(&self, deal: &NormalizedDeal) -> Result<DealRecord, StoreError>;

    /// Full overwrite of crawl-derived fields on an existing record.
    /// No field-level merge.
    async fn update(&self, id: Uuid, deal: &NormalizedDeal) -> Result<DealRecord, StoreError>;

    /// Count of active, non-deleted records.
    async fn count_active(&self) -> Result<u64, StoreError>;

    /// One batch of active records, ordered by ascending `end_date`.
    async fn list_active_by_end_date(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DealRecord>, StoreError>;

    /// Transition a record active → expired.
    async fn mark_expired(&self, id: Uuid) -> Result<(), StoreError>;

    /// Push the record's current `end_date` forward by `additional_hours`
    /// and force it active, whatever its current status. Returns the new
    /// deadline.
    async fn extend_expiry(
        &self,
        id: Uuid,
        additional_hours: i64,
    ) -> Result<DateTime<Utc>, StoreError>;

    /// Conditional reactivation: applies only when the record is currently
    /// expired, so a race against an already-active record is a no-op.
    /// Returns whether a row actually changed.
    async fn reactivate_expired(
        &self,
        id: Uuid,
        new_end_date: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}
