//! Database operations for the `deals` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hotdeal_core::{
    DealRecord, DealSource, DealStore, ExpirySnapshot, NormalizedDeal, StoreError,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `deals` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DealRow {
    pub id: Uuid,
    pub source: String,
    pub source_id: String,
    pub title: String,
    pub description: Option<String>,
    pub sale_price: i64,
    pub original_price: i64,
    pub discount_rate: i32,
    pub seller: String,
    pub category: String,
    pub is_free_shipping: bool,
    pub original_url: String,
    pub thumbnail_url: String,
    pub image_url: String,
    pub author_name: String,
    pub views: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub status: String,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DealRow {
    /// Converts the raw row into the domain record, validating the `source`
    /// and `status` tags.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRow`] if either tag is not a known variant,
    /// which would mean the table was written outside this crate.
    pub fn into_record(self) -> Result<DealRecord, DbError> {
        let source: DealSource = self.source.parse().map_err(|reason| DbError::InvalidRow {
            id: self.id,
            reason,
        })?;
        let status = self.status.parse().map_err(|reason| DbError::InvalidRow {
            id: self.id,
            reason,
        })?;

        Ok(DealRecord {
            id: self.id,
            source,
            source_id: self.source_id,
            title: self.title,
            description: self.description,
            sale_price: self.sale_price,
            original_price: self.original_price,
            discount_rate: self.discount_rate,
            seller: self.seller,
            category: self.category,
            is_free_shipping: self.is_free_shipping,
            original_url: self.original_url,
            thumbnail_url: self.thumbnail_url,
            image_url: self.image_url,
            author_name: self.author_name,
            views: self.views,
            like_count: self.like_count,
            comment_count: self.comment_count,
            status,
            created_at: self.created_at,
            end_date: self.end_date,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

const DEAL_COLUMNS: &str = "id, source, source_id, title, description, sale_price, \
     original_price, discount_rate, seller, category, is_free_shipping, original_url, \
     thumbnail_url, image_url, author_name, views, like_count, comment_count, status, \
     end_date, created_at, updated_at, deleted_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Natural-key lookup. Soft-deleted rows are invisible.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// on a corrupt tag.
pub async fn find_deal_by_source_and_post_id(
    pool: &PgPool,
    source: DealSource,
    source_id: &str,
) -> Result<Option<DealRecord>, DbError> {
    let row = sqlx::query_as::<_, DealRow>(&format!(
        "SELECT {DEAL_COLUMNS} FROM deals \
         WHERE source = $1 AND source_id = $2 AND deleted_at IS NULL"
    ))
    .bind(source.as_str())
    .bind(source_id)
    .fetch_optional(pool)
    .await?;

    row.map(DealRow::into_record).transpose()
}

/// Inserts a new deal row, generating the durable id in Rust, and returns the
/// full persisted record.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a unique-index
/// violation on the natural key).
pub async fn insert_deal(pool: &PgPool, deal: &NormalizedDeal) -> Result<DealRecord, DbError> {
    let id = Uuid::new_v4();

    let row = sqlx::query_as::<_, DealRow>(&format!(
        "INSERT INTO deals \
           (id, source, source_id, title, description, sale_price, original_price, \
            discount_rate, seller, category, is_free_shipping, original_url, \
            thumbnail_url, image_url, author_name, views, like_count, comment_count, \
            status, end_date, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                 $16, $17, $18, $19, $20, $21, NOW()) \
         RETURNING {DEAL_COLUMNS}"
    ))
    .bind(id)
    .bind(deal.source.as_str())
    .bind(&deal.source_id)
    .bind(&deal.title)
    .bind(&deal.description)
    .bind(deal.sale_price)
    .bind(deal.original_price)
    .bind(deal.discount_rate)
    .bind(&deal.seller)
    .bind(&deal.category)
    .bind(deal.is_free_shipping)
    .bind(&deal.original_url)
    .bind(&deal.thumbnail_url)
    .bind(&deal.image_url)
    .bind(&deal.author_name)
    .bind(deal.views)
    .bind(deal.like_count)
    .bind(deal.comment_count)
    .bind(deal.status.as_str())
    .bind(deal.end_date)
    .bind(deal.created_at)
    .fetch_one(pool)
    .await?;

    row.into_record()
}

/// Full overwrite of the crawl-derived fields of an existing deal. Later
/// crawls win unconditionally; there is no field-level merge.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no non-deleted row has this id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_deal(
    pool: &PgPool,
    id: Uuid,
    deal: &NormalizedDeal,
) -> Result<DealRecord, DbError> {
    let row = sqlx::query_as::<_, DealRow>(&format!(
        "UPDATE deals SET \
             title = $1, description = $2, sale_price = $3, original_price = $4, \
             discount_rate = $5, seller = $6, category = $7, is_free_shipping = $8, \
             original_url = $9, thumbnail_url = $10, image_url = $11, author_name = $12, \
             views = $13, like_count = $14, comment_count = $15, status = $16, \
             end_date = $17, updated_at = NOW() \
         WHERE id = $18 AND deleted_at IS NULL \
         RETURNING {DEAL_COLUMNS}"
    ))
    .bind(&deal.title)
    .bind(&deal.description)
    .bind(deal.sale_price)
    .bind(deal.original_price)
    .bind(deal.discount_rate)
    .bind(&deal.seller)
    .bind(&deal.category)
    .bind(deal.is_free_shipping)
    .bind(&deal.original_url)
    .bind(&deal.thumbnail_url)
    .bind(&deal.image_url)
    .bind(&deal.author_name)
    .bind(deal.views)
    .bind(deal.like_count)
    .bind(deal.comment_count)
    .bind(deal.status.as_str())
    .bind(deal.end_date)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    row.into_record()
}

/// Count of active, non-deleted deals.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_active_deals(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM deals WHERE status = 'active' AND deleted_at IS NULL",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// One expiry-sweep batch: active deals ordered by ascending `end_date`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// on a corrupt tag.
pub async fn list_active_deals_by_end_date(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<DealRecord>, DbError> {
    let rows = sqlx::query_as::<_, DealRow>(&format!(
        "SELECT {DEAL_COLUMNS} FROM deals \
         WHERE status = 'active' AND deleted_at IS NULL \
         ORDER BY end_date ASC \
         LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(DealRow::into_record).collect()
}

/// Transitions one deal active → expired.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no non-deleted row has this id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn mark_deal_expired(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE deals SET status = 'expired', updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Pushes the deal's current `end_date` forward by `additional_hours` and
/// forces it active, whatever its current status. The addition happens in
/// SQL against the stored deadline, so an active deal never loses lifetime
/// it already had. Returns the new deadline.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no non-deleted row has this id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn extend_deal_expiry(
    pool: &PgPool,
    id: Uuid,
    additional_hours: i64,
) -> Result<DateTime<Utc>, DbError> {
    sqlx::query_scalar::<_, DateTime<Utc>>(
        "UPDATE deals \
         SET end_date = end_date + make_interval(hours => $1), \
             status = 'active', updated_at = NOW() \
         WHERE id = $2 AND deleted_at IS NULL \
         RETURNING end_date",
    )
    .bind(additional_hours)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Reactivates an expired deal with a new deadline. The `status = 'expired'`
/// guard makes this a conditional update: racing against an already-active
/// record changes nothing.
///
/// Returns `true` if a row was reactivated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn reactivate_expired_deal(
    pool: &PgPool,
    id: Uuid,
    new_end_date: DateTime<Utc>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE deals SET status = 'active', end_date = $1, updated_at = NOW() \
         WHERE id = $2 AND status = 'expired' AND deleted_at IS NULL",
    )
    .bind(new_end_date)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Active deals whose `end_date` falls within the next `hours`, soonest first.
/// Used by the daily report.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// on a corrupt tag.
pub async fn list_deals_expiring_within(
    pool: &PgPool,
    hours: i64,
    limit: i64,
) -> Result<Vec<DealRecord>, DbError> {
    let rows = sqlx::query_as::<_, DealRow>(&format!(
        "SELECT {DEAL_COLUMNS} FROM deals \
         WHERE status = 'active' AND deleted_at IS NULL \
           AND end_date >= NOW() \
           AND end_date <= NOW() + make_interval(hours => $1) \
         ORDER BY end_date ASC \
         LIMIT $2"
    ))
    .bind(hours)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(DealRow::into_record).collect()
}

/// Point-in-time lifecycle counts for the daily report: active, expired,
/// expiring within 24 hours, and expired since local midnight (UTC).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any of the counts fail.
pub async fn expiry_snapshot(pool: &PgPool) -> Result<ExpirySnapshot, DbError> {
    let active = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM deals WHERE status = 'active' AND deleted_at IS NULL",
    )
    .fetch_one(pool)
    .await?;

    let expired = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM deals WHERE status = 'expired' AND deleted_at IS NULL",
    )
    .fetch_one(pool)
    .await?;

    let expiring_soon = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM deals \
         WHERE status = 'active' AND deleted_at IS NULL \
           AND end_date >= NOW() AND end_date <= NOW() + INTERVAL '24 hours'",
    )
    .fetch_one(pool)
    .await?;

    let expired_today = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM deals \
         WHERE status = 'expired' AND deleted_at IS NULL \
           AND updated_at >= date_trunc('day', NOW())",
    )
    .fetch_one(pool)
    .await?;

    Ok(ExpirySnapshot {
        active: u64::try_from(active).unwrap_or(0),
        expired: u64::try_from(expired).unwrap_or(0),
        expiring_soon: u64::try_from(expiring_soon).unwrap_or(0),
        expired_today: u64::try_from(expired_today).unwrap_or(0),
    })
}

// ---------------------------------------------------------------------------
// DealStore implementation
// ---------------------------------------------------------------------------

/// Postgres-backed [`DealStore`].
#[derive(Clone)]
pub struct PgDealStore {
    pool: PgPool,
}

impl PgDealStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn store_err(err: DbError) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl DealStore for PgDealStore {
    async fn find_by_source_and_post_id(
        &self,
        source: DealSource,
        source_id: &str,
    ) -> Result<Option<DealRecord>, StoreError> {
        find_deal_by_source_and_post_id(&self.pool, source, source_id)
            .await
            .map_err(store_err)
    }

    async fn create(&self, deal: &NormalizedDeal) -> Result<DealRecord, StoreError> {
        insert_deal(&self.pool, deal).await.map_err(store_err)
    }

    async fn update(&self, id: Uuid, deal: &NormalizedDeal) -> Result<DealRecord, StoreError> {
        match update_deal(&self.pool, id, deal).await {
            Ok(record) => Ok(record),
            Err(DbError::NotFound) => Err(StoreError::NotFound(id)),
            Err(err) => Err(store_err(err)),
        }
    }

    async fn count_active(&self) -> Result<u64, StoreError> {
        let count = count_active_deals(&self.pool).await.map_err(store_err)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn list_active_by_end_date(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DealRecord>, StoreError> {
        list_active_deals_by_end_date(&self.pool, limit, offset)
            .await
            .map_err(store_err)
    }

    async fn mark_expired(&self, id: Uuid) -> Result<(), StoreError> {
        match mark_deal_expired(&self.pool, id).await {
            Ok(()) => Ok(()),
            Err(DbError::NotFound) => Err(StoreError::NotFound(id)),
            Err(err) => Err(store_err(err)),
        }
    }

    async fn extend_expiry(
        &self,
        id: Uuid,
        additional_hours: i64,
    ) -> Result<DateTime<Utc>, StoreError> {
        match extend_deal_expiry(&self.pool, id, additional_hours).await {
            Ok(new_end_date) => Ok(new_end_date),
            Err(DbError::NotFound) => Err(StoreError::NotFound(id)),
            Err(err) => Err(store_err(err)),
        }
    }

    async fn reactivate_expired(
        &self,
        id: Uuid,
        new_end_date: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        reactivate_expired_deal(&self.pool, id, new_end_date)
            .await
            .map_err(store_err)
    }
}
