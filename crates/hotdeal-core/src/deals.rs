use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored sale price meaning "unparseable or variable pricing". Historical
/// records depend on this convention; do not repurpose the value.
pub const UNPARSEABLE_PRICE: i64 = -1;

/// Seller fallback when the title carries no bracketed store tag.
pub const UNKNOWN_SELLER: &str = "기타";

/// Category fallback when keyword classification finds no match.
pub const UNKNOWN_CATEGORY: &str = "기타";

/// Default lifecycle window for a freshly crawled deal.
pub const DEFAULT_DEAL_LIFETIME_DAYS: i64 = 30;

/// A community site the pipeline harvests. The lowercase tag is half of the
/// `(source, source_id)` natural key, so variants must never be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealSource {
    Ppomppu,
    Clien,
}

impl DealSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DealSource::Ppomppu => "ppomppu",
            DealSource::Clien => "clien",
        }
    }

    /// All sources with a registered site adapter.
    #[must_use]
    pub fn all() -> &'static [DealSource] {
        &[DealSource::Ppomppu, DealSource::Clien]
    }
}

impl std::fmt::Display for DealSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DealSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ppomppu" => Ok(DealSource::Ppomppu),
            "clien" => Ok(DealSource::Clien),
            other => Err(format!("unknown deal source: {other}")),
        }
    }
}

/// Lifecycle state of a deal. Expired deals stay queryable; deletion is a
/// separate soft-delete marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
    Active,
    Expired,
}

impl DealStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DealStatus::Active => "active",
            DealStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for DealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DealStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(DealStatus::Active),
            "expired" => Ok(DealStatus::Expired),
            other => Err(format!("unknown deal status: {other}")),
        }
    }
}

/// Price extracted from a listing title.
///
/// The legacy storage convention overloads the integer column: `-1` means
/// unparseable/variable, `0` means a free promotion. Internally the pipeline
/// carries this tagged form and maps to the sentinel integers only at the
/// storage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedPrice {
    /// A concrete won amount.
    Known(i64),
    /// Free/event/coupon promotion, stored as `0`.
    Promo,
    /// Variable pricing or no recognizable amount, stored as `-1`.
    Varies,
}

impl ParsedPrice {
    /// Storage-boundary mapping for the `sale_price` column.
    #[must_use]
    pub fn sale_price(self) -> i64 {
        match self {
            ParsedPrice::Known(amount) => amount,
            ParsedPrice::Promo => 0,
            ParsedPrice::Varies => UNPARSEABLE_PRICE,
        }
    }

    /// Storage-boundary mapping for the `original_price` column.
    ///
    /// Forced to `0` for unparseable prices so downstream discount arithmetic
    /// stays well-defined against the `-1` sale price.
    #[must_use]
    pub fn original_price(self) -> i64 {
        match self {
            ParsedPrice::Known(amount) => amount,
            ParsedPrice::Promo | ParsedPrice::Varies => 0,
        }
    }
}

/// A canonical deal candidate assembled by the field normalizer.
///
/// `id` is a process-unique scratch identifier for not-yet-persisted records;
/// the durable identity is the store-assigned key on [`DealRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedDeal {
    pub id: String,
    pub source: DealSource,
    /// Site-native post number, the other half of the natural key.
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
    pub status: DealStatus,
    pub created_at: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted deal as returned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealRecord {
    pub id: Uuid,
    pub source: DealSource,
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
    pub status: DealStatus,
    pub created_at: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DealRecord {
    /// True once the deadline has actually passed. Exact comparison, no
    /// truncation: a deal with minutes left is not expired yet.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.end_date <= now
    }

    /// True when the deal is still live but its deadline falls within the
    /// next `hours`.
    #[must_use]
    pub fn expires_within(&self, now: DateTime<Utc>, hours: i64) -> bool {
        !self.is_expired(now) && self.end_date - now <= chrono::Duration::hours(hours)
    }
}

/// Aggregate outcome of one crawl run, returned even under partial failure so
/// "nothing matched" stays distinguishable from "everything errored".
#[derive(Debug, Default, Serialize)]
pub struct CrawlRunStats {
    pub total_crawled: u64,
    pub new_deals: u64,
    pub updated_deals: u64,
    pub errors: u64,
    pub pages_visited: u32,
    pub duration_ms: u64,
    /// Records produced by this run, in extraction order.
    #[serde(skip)]
    pub deals: Vec<NormalizedDeal>,
}

/// Aggregate outcome of one expiry sweep.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ExpiryStats {
    pub total_checked: u64,
    pub expired: u64,
    pub expiring_soon: u64,
    pub errors: u64,
    pub duration_ms: u64,
}

/// Point-in-time lifecycle counts used by the daily report.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ExpirySnapshot {
    pub active: u64,
    pub expired: u64,
    pub expiring_soon: u64,
    pub expired_today: u64,
}
