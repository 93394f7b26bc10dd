use chrono::{Duration, TimeZone, Utc};

use hotdeal_core::{
    DealSource, DealStatus, DEFAULT_DEAL_LIFETIME_DAYS, UNKNOWN_SELLER, UNPARSEABLE_PRICE,
};

use super::normalize;
use crate::types::{RawDetailItem, RawListItem};

fn list_item(title: &str) -> RawListItem {
    RawListItem {
        post_id: "612345".to_string(),
        title: title.to_string(),
        url: "https://www.ppomppu.co.kr/zboard/view.php?id=ppomppu&no=612345".to_string(),
        author: "딜헌터".to_string(),
        views: 1_204,
        like_count: 15,
        comment_count: 32,
        date_text: "14:02".to_string(),
        category: String::new(),
        thumbnail_url: "https://cdn.ppomppu.co.kr/small_612345.jpg".to_string(),
        is_sold_out: false,
        is_popular: true,
    }
}

#[test]
fn full_title_normalizes_every_field() {
    let now = Utc.with_ymd_and_hms(2026, 8, 21, 9, 0, 0).unwrap();
    let deal = normalize(
        DealSource::Ppomppu,
        &list_item("[쿠팡] 다우니 1L x 6개 (23,900원/무료)"),
        None,
        now,
    );

    assert_eq!(deal.source, DealSource::Ppomppu);
    assert_eq!(deal.source_id, "612345");
    assert_eq!(deal.title, "다우니 1L x 6개 (23,900원/무료)");
    assert_eq!(deal.sale_price, 23_900);
    assert_eq!(deal.original_price, 23_900);
    assert_eq!(deal.discount_rate, 0);
    assert_eq!(deal.seller, "쿠팡");
    assert_eq!(deal.category, "생활/가전");
    assert!(deal.is_free_shipping);
    assert_eq!(deal.status, DealStatus::Active);
    // 14:02 KST on the board is 05:02 UTC.
    assert_eq!(deal.created_at, Utc.with_ymd_and_hms(2026, 8, 21, 5, 2, 0).unwrap());
    assert_eq!(
        deal.end_date,
        deal.created_at + Duration::days(DEFAULT_DEAL_LIFETIME_DAYS)
    );
    assert_eq!(deal.views, 1_204);
    assert_eq!(deal.author_name, "딜헌터");
}

#[test]
fn unparseable_fields_fall_back_to_sentinels() {
    let now = Utc::now();
    let mut item = list_item("정체불명 특가템");
    item.date_text = "어제".to_string();

    let deal = normalize(DealSource::Clien, &item, None, now);

    assert_eq!(deal.sale_price, UNPARSEABLE_PRICE);
    assert_eq!(deal.original_price, 0);
    assert_eq!(deal.seller, UNKNOWN_SELLER);
    assert_eq!(deal.category, "기타");
    assert!(!deal.is_free_shipping);
    assert_eq!(deal.created_at, now);
}

#[test]
fn sold_out_rows_arrive_expired() {
    let mut item = list_item("[11번가] 품절 직전 5,000원");
    item.is_sold_out = true;

    let deal = normalize(DealSource::Ppomppu, &item, None, Utc::now());
    assert_eq!(deal.status, DealStatus::Expired);
}

#[test]
fn site_category_wins_over_keyword_inference() {
    let mut item = list_item("갤럭시 버즈 89,000원");
    item.category = "모바일".to_string();

    let deal = normalize(DealSource::Clien, &item, None, Utc::now());
    assert_eq!(deal.category, "모바일");
}

#[test]
fn detail_payload_supplies_timestamp_description_and_image() {
    let now = Utc.with_ymd_and_hms(2026, 8, 21, 9, 0, 0).unwrap();
    let detail = RawDetailItem {
        content: "  실사용 후기 좋은 제품입니다  ".to_string(),
        images: vec![
            "https://cdn.ppomppu.co.kr/data/20260820_99999.jpg".to_string(),
            "https://cdn.ppomppu.co.kr/data/full_612345.jpg".to_string(),
        ],
        posted_at: Some("2026-08-20T10:30:00+09:00".to_string()),
    };

    let deal = normalize(
        DealSource::Ppomppu,
        &list_item("[쿠팡] 다우니 1L x 6개 (23,900원/무료)"),
        Some(&detail),
        now,
    );

    assert_eq!(deal.created_at, Utc.with_ymd_and_hms(2026, 8, 20, 1, 30, 0).unwrap());
    assert_eq!(deal.description.as_deref(), Some("실사용 후기 좋은 제품입니다"));
    assert_eq!(deal.image_url, "https://cdn.ppomppu.co.kr/data/full_612345.jpg");
    assert_eq!(deal.thumbnail_url, "https://cdn.ppomppu.co.kr/small_612345.jpg");
}

#[test]
fn scratch_id_is_not_the_natural_key() {
    let deal = normalize(
        DealSource::Ppomppu,
        &list_item("[쿠팡] 생수 6,900원"),
        None,
        Utc::now(),
    );
    assert_ne!(deal.id, deal.source_id);
    assert!(deal.id.contains("ppomppu"));
}
