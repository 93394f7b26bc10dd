//! Turns a raw extraction payload into a storable [`NormalizedDeal`].
//!
//! Normalization never fails: every field either parses or falls back to its
//! sentinel, so one mangled row can never sink a page.

use chrono::{DateTime, Duration, Utc};

use hotdeal_core::{
    DealSource, DealStatus, NormalizedDeal, DEFAULT_DEAL_LIFETIME_DAYS, UNKNOWN_SELLER,
};

use crate::parse::{
    clean_title, find_matching_image, infer_category, is_free_shipping, parse_detail_timestamp,
    parse_post_date, parse_price, parse_store, scratch_id,
};
use crate::types::{RawDetailItem, RawListItem};

/// Normalizes one listing row, optionally enriched with its detail page.
///
/// `now` is the crawl instant: it anchors relative date parsing and the
/// lifetime-based `end_date`.
#[must_use]
pub fn normalize(
    source: DealSource,
    item: &RawListItem,
    detail: Option<&RawDetailItem>,
    now: DateTime<Utc>,
) -> NormalizedDeal {
    let price = parse_price(&item.title);
    let sale_price = price.sale_price();
    let original_price = price.original_price();

    let seller = parse_store(&item.title)
        .map_or_else(|| UNKNOWN_SELLER.to_string(), ToString::to_string);

    let category = if item.category.trim().is_empty() {
        infer_category(&item.title).to_string()
    } else {
        item.category.trim().to_string()
    };

    // Detail-page timestamp wins over the list cell's short form; both
    // missing means the crawl instant stands in.
    let created_at = detail
        .and_then(|d| d.posted_at.as_deref())
        .and_then(parse_detail_timestamp)
        .or_else(|| parse_post_date(&item.date_text, now))
        .unwrap_or(now);

    let image_url = detail.map_or_else(
        || item.thumbnail_url.clone(),
        |d| find_matching_image(&item.thumbnail_url, &d.images),
    );

    let description = detail
        .map(|d| d.content.trim())
        .filter(|content| !content.is_empty())
        .map(ToString::to_string);

    let status = if item.is_sold_out {
        DealStatus::Expired
    } else {
        DealStatus::Active
    };

    NormalizedDeal {
        id: scratch_id(source, &item.post_id),
        source,
        source_id: item.post_id.clone(),
        title: clean_title(&item.title),
        description,
        sale_price,
        original_price,
        discount_rate: discount_rate(original_price, sale_price),
        seller,
        category,
        is_free_shipping: is_free_shipping(&item.title),
        original_url: item.url.clone(),
        thumbnail_url: item.thumbnail_url.clone(),
        image_url,
        author_name: item.author.clone(),
        views: item.views,
        like_count: item.like_count,
        comment_count: item.comment_count,
        status,
        created_at,
        end_date: created_at + Duration::days(DEFAULT_DEAL_LIFETIME_DAYS),
        updated_at: now,
    }
}

/// Percentage discount when both prices are real and the sale is cheaper;
/// zero otherwise (sentinel prices never produce a discount).
fn discount_rate(original_price: i64, sale_price: i64) -> i32 {
    if original_price > 0 && sale_price > 0 && sale_price < original_price {
        let rate = (original_price - sale_price) * 100 / original_price;
        i32::try_from(rate).unwrap_or(0)
    } else {
        0
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
