//! Clien jirum board (`/service/board/jirum`).
//!
//! Rows are `div.list_item.symph_row` with the post number in
//! `data-board-sn`; pagination is zero-based via the `po` query parameter.

use hotdeal_core::DealSource;

use super::SiteAdapter;

pub struct ClienAdapter;

const LIST_SCRIPT: &str = r#"
JSON.stringify(Array.from(
  document.querySelectorAll('div.list_item.symph_row')
).map((row) => {
  const postId = row.getAttribute('data-board-sn');
  const titleEl = row.querySelector('span.subject_fixed');
  const link = row.querySelector('a.list_subject');
  if (!postId || !titleEl || !link) return null;

  const count = (sel) => {
    const text = (row.querySelector(sel)?.textContent || '').trim().toLowerCase();
    if (!text) return 0;
    const n = parseFloat(text.replace(/,/g, ''));
    if (!Number.isFinite(n)) return 0;
    if (text.endsWith('k')) return Math.round(n * 1000);
    if (text.endsWith('m')) return Math.round(n * 1000000);
    return Math.round(n);
  };
  const timestamp = row.querySelector('span.timestamp');

  return {
    postId: postId,
    title: titleEl.textContent.trim(),
    url: new URL(link.getAttribute('href'), location.href).href,
    author: (row.querySelector('span.nickname')?.textContent || '').trim(),
    views: count('span.hit'),
    likeCount: count('div.list_symph span, span.view_symph'),
    commentCount: count('span.rSymph05'),
    dateText: timestamp
      ? timestamp.textContent.trim()
      : (row.querySelector('div.list_time span.time')?.textContent || '').trim(),
    category: (row.querySelector('div.list_infomation .shortname')?.textContent || '').trim(),
    thumbnailUrl: row.querySelector('div.list_img img')?.src || '',
    isSoldOut: row.classList.contains('sold_out')
      || /품절|종료|마감/.test(titleEl.textContent),
    isPopular: row.querySelector('span.icon_hot') !== null
  };
}).filter((item) => item !== null))
"#;

const DETAIL_SCRIPT: &str = r#"
JSON.stringify({
  content: (document.querySelector('div.post_article')?.innerText || '').trim(),
  images: Array.from(
    document.querySelectorAll('div.post_article img')
  ).map((img) => img.src).filter((src) => src.startsWith('http')),
  postedAt: (document.querySelector('div.post_author span.view_count ~ span, div.post_time')
    ?.textContent || '').match(/\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}/)?.[0] || null
})
"#;

impl SiteAdapter for ClienAdapter {
    fn source(&self) -> DealSource {
        DealSource::Clien
    }

    // Clien pages are zero-based on the wire; callers stay 1-based.
    fn list_url(&self, page: u32) -> String {
        let po = page.saturating_sub(1);
        format!("https://www.clien.net/service/board/jirum?od=T31&category=0&po={po}")
    }

    fn list_wait_selector(&self) -> &'static str {
        "div.list_item.symph_row"
    }

    fn list_script(&self) -> &'static str {
        LIST_SCRIPT
    }

    fn detail_wait_selector(&self) -> &'static str {
        "div.post_article"
    }

    fn detail_script(&self) -> &'static str {
        DETAIL_SCRIPT
    }
}
