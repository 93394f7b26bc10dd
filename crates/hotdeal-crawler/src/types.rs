//! Ephemeral extraction payloads handed from the in-page scripts to the
//! normalizer.
//!
//! Each site adapter's list script evaluates to `JSON.stringify` of an array
//! of objects in exactly this shape, so the fields here are a boundary
//! contract with the scripts in `adapters/`. Every field except the post id
//! and title is defaulted: a row missing a cell still produces an item
//! rather than failing the page.

use serde::{Deserialize, Serialize};

/// One row of a listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListItem {
    /// Site-native post number; half of the natural key.
    pub post_id: String,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    /// Short-form date cell, e.g. `"14:02"`, `"25/07/11"`, `"08-21"`.
    #[serde(default)]
    pub date_text: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub thumbnail_url: String,
    /// Site marked the post as ended/sold out.
    #[serde(default)]
    pub is_sold_out: bool,
    /// Site marked the post as popular/hot.
    #[serde(default)]
    pub is_popular: bool,
}

/// Optional payload from visiting the post's detail page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDetailItem {
    #[serde(default)]
    pub content: String,
    /// Full-size images in document order.
    #[serde(default)]
    pub images: Vec<String>,
    /// Precise post timestamp (ISO 8601); takes precedence over the
    /// list-page short form when present.
    #[serde(default)]
    pub posted_at: Option<String>,
}
