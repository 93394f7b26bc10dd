//! Free-text field parsing for community deal titles and date cells.
//!
//! Historical records depend on the exact semantics here, notably the
//! `-1`/`0` price sentinels, so changes must stay bug-compatible with what
//! earlier crawls stored. Every function in this module is total: bad input
//! degrades to a documented fallback, never an error.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Asia::Seoul;
use regex::Regex;

use hotdeal_core::{DealSource, ParsedPrice, UNKNOWN_CATEGORY};

/// Extracts a won amount from a raw listing title.
///
/// Priority order, reproduced from the legacy pipeline:
/// 1. variable-pricing keywords → [`ParsedPrice::Varies`]
/// 2. a numeric price pattern (separator digits terminated by `원`, a
///    currency glyph prefix, a `~`/`/` suffix, a parenthesized amount, or a
///    bare run of 4+ digits) → [`ParsedPrice::Known`]
/// 3. promotion keywords (event/coupon/giveaway) → [`ParsedPrice::Promo`]
/// 4. "free" with no digits anywhere in the title → [`ParsedPrice::Promo`]
/// 5. otherwise → [`ParsedPrice::Varies`]
#[must_use]
pub fn parse_price(title: &str) -> ParsedPrice {
    let varies = Regex::new(r"(?i)다양|various|varied").expect("valid varies regex");
    if varies.is_match(title) {
        return ParsedPrice::Varies;
    }

    // Ordered: the most explicit forms win over the bare-digits fallback.
    let patterns = [
        r"(\d{1,3}(?:,\d{3})*(?:\.\d+)?)\s*원",
        r"[₩￦]\s*(\d{1,3}(?:,\d{3})*)",
        r"(\d{1,3}(?:,\d{3})*)\s*~",
        r"\((\d{1,3}(?:,\d{3})*)[원)]",
        r"\((\d{1,3}(?:,\d{3})*)[/\s]",
        r"(\d{1,3}(?:,\d{3})*)\s*/",
        r"(\d{4,})",
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).expect("valid price regex");
        if let Some(caps) = re.captures(title) {
            if let Some(amount) = parse_amount(&caps[1]) {
                if amount > 0 {
                    return ParsedPrice::Known(amount);
                }
            }
        }
    }

    let promo = Regex::new(r"(?i)이벤트|event|쿠폰|coupon|프로모션|promotion|증정|추첨|경품")
        .expect("valid promo regex");
    if promo.is_match(title) {
        return ParsedPrice::Promo;
    }

    let free = Regex::new(r"(?i)무료|free").expect("valid free regex");
    if !title.chars().any(|c| c.is_ascii_digit()) && free.is_match(title) {
        return ParsedPrice::Promo;
    }

    ParsedPrice::Varies
}

/// Parses a matched amount like `"23,900"` or `"15000.5"`, truncating any
/// decimal part the way the legacy parser did.
fn parse_amount(matched: &str) -> Option<i64> {
    let digits: String = matched.replace(',', "");
    let integer_part = digits.split('.').next().unwrap_or("");
    integer_part.parse::<i64>().ok()
}

/// Returns the bracketed store prefix (`"[11번가] …"` → `"11번가"`), verbatim,
/// or `None` when the title has no bracket prefix.
#[must_use]
pub fn parse_store(title: &str) -> Option<&str> {
    let re = Regex::new(r"^\[([^\]]+)\]").expect("valid store regex");
    re.captures(title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// True iff the text carries one of the free-shipping markers.
#[must_use]
pub fn is_free_shipping(text: &str) -> bool {
    let re = Regex::new(r"(?i)무료|무배|배송비무료|free").expect("valid shipping regex");
    re.is_match(text)
}

/// Keyword-based category classification; anything unmatched lands in the
/// fixed fallback category.
#[must_use]
pub fn infer_category(title: &str) -> &'static str {
    const CATEGORIES: &[(&str, &[&str])] = &[
        (
            "전자",
            &[
                "가전", "전자", "디지털", "컴퓨터", "노트북", "스마트폰", "갤럭시", "아이폰",
                "모니터", "이어폰",
            ],
        ),
        (
            "패션",
            &["의류", "옷", "신발", "가방", "패션", "나이키", "아디다스"],
        ),
        (
            "식품",
            &["식품", "음식", "비타민", "영양제", "홍삼", "과자", "커피"],
        ),
        (
            "뷰티",
            &["화장품", "미용", "스킨케어", "메이크업", "향수", "헤어"],
        ),
        (
            "생활/가전",
            &["생활", "주방", "욕실", "청소", "수납", "세제", "다우니"],
        ),
        ("유아", &["육아", "유아", "기저귀", "분유"]),
        ("도서", &["도서", "책", "문구", "다이어리"]),
    ];

    for (category, keywords) in CATEGORIES {
        if keywords.iter().any(|keyword| title.contains(keyword)) {
            return category;
        }
    }
    UNKNOWN_CATEGORY
}

/// Parses a list-page date cell relative to `now`.
///
/// Accepted forms, in priority order: `HH:MM[:SS]` (today), `YY/MM/DD`,
/// `MM-DD` (current year assumed, no rollover heuristic across year
/// boundaries). The boards render KST wall-clock times, so "today" and the
/// implied year come from the Seoul-local view of `now` and the result is
/// converted back to UTC. Returns `None` on anything else.
#[must_use]
pub fn parse_post_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = text.trim();
    let local_now = now.with_timezone(&Seoul);

    let time_re = Regex::new(r"^(\d{2}):(\d{2})(?::(\d{2}))?$").expect("valid time regex");
    if let Some(caps) = time_re.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        let second: u32 = caps.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?;
        let time = NaiveTime::from_hms_opt(hour, minute, second)?;
        return seoul_to_utc(local_now.date_naive().and_time(time));
    }

    let ymd_re = Regex::new(r"^(\d{2})/(\d{2})/(\d{2})$").expect("valid ymd regex");
    if let Some(caps) = ymd_re.captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(2000 + year, month, day)?;
        return seoul_to_utc(date.and_time(NaiveTime::MIN));
    }

    let md_re = Regex::new(r"^(\d{2})-(\d{2})$").expect("valid md regex");
    if let Some(caps) = md_re.captures(text) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(local_now.year(), month, day)?;
        return seoul_to_utc(date.and_time(NaiveTime::MIN));
    }

    None
}

/// Parses a detail-page timestamp: RFC 3339, or the bare
/// `YYYY-MM-DD HH:MM:SS` form some boards render. The bare form is KST
/// wall-clock time and gets converted to UTC.
#[must_use]
pub fn parse_detail_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .and_then(seoul_to_utc)
}

/// Anchors a naive KST wall-clock time in `Asia/Seoul` and converts to UTC.
/// Korea has no daylight saving, so the mapping is unambiguous.
fn seoul_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Seoul
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Strips bracketed store/comment tags and collapses whitespace for display.
///
/// Price and store parsing always run on the raw title; this is only for the
/// stored display title.
#[must_use]
pub fn clean_title(raw: &str) -> String {
    let tags = Regex::new(r"\[[^\]]*\]").expect("valid tag regex");
    let without_tags = tags.replace_all(raw, " ");
    without_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Process-unique scratch identifier for a not-yet-persisted candidate.
/// The durable identity is the store-assigned key, never this value.
#[must_use]
pub fn scratch_id(source: DealSource, source_id: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    format!("{source}_{millis}_{source_id}")
}

/// Picks the detail image that shares a numeric filename token with the
/// thumbnail (thumbnails and originals carry the same upload number on the
/// boards we crawl). Falls back to the first detail image, then to the
/// thumbnail itself.
#[must_use]
pub fn find_matching_image(thumbnail_url: &str, detail_images: &[String]) -> String {
    let token_re = Regex::new(r"\d{3,}").expect("valid token regex");
    let thumb_name = filename_of(thumbnail_url);

    for token in token_re.find_iter(thumb_name) {
        if let Some(matched) = detail_images
            .iter()
            .find(|image| filename_of(image).contains(token.as_str()))
        {
            return matched.clone();
        }
    }

    detail_images
        .first()
        .cloned()
        .unwrap_or_else(|| thumbnail_url.to_string())
}

fn filename_of(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
