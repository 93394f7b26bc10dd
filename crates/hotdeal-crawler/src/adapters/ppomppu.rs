//! Ppomppu hotdeal board (`zboard.php?id=ppomppu`).
//!
//! The board is a classic table layout: one `tr.baseList` per post inside
//! `#revolution_main_table`, with notices carrying no post number.

use hotdeal_core::DealSource;

use super::SiteAdapter;

pub struct PpomppuAdapter;

const LIST_SCRIPT: &str = r#"
JSON.stringify(Array.from(
  document.querySelectorAll('#revolution_main_table tr.baseList')
).map((row) => {
  const titleLink = row.querySelector('a.baseList-title');
  if (!titleLink) return null;

  const href = titleLink.getAttribute('href') || '';
  const noMatch = href.match(/no=(\d+)/);
  if (!noMatch) return null;

  const num = (sel) => {
    const el = row.querySelector(sel);
    if (!el) return 0;
    const n = parseInt(el.textContent.replace(/[^0-9]/g, ''), 10);
    return Number.isFinite(n) ? n : 0;
  };
  const votes = (row.querySelector('td.baseList-space.baseList-rec')
    ?.textContent || '').split('-')[0];
  const thumb = row.querySelector('a.baseList-thumb img');

  return {
    postId: noMatch[1],
    title: titleLink.textContent.trim(),
    url: new URL(href, location.href).href,
    author: (row.querySelector('a.baseList-name')?.textContent || '').trim(),
    views: num('td.baseList-space.baseList-views'),
    likeCount: parseInt(votes, 10) || 0,
    commentCount: num('span.baseList-c'),
    dateText: (row.querySelector('time.baseList-time')?.textContent || '').trim(),
    category: (row.querySelector('span.baseList-small')?.textContent || '')
      .replace(/[\[\]]/g, '').trim(),
    thumbnailUrl: thumb ? new URL(thumb.src, location.href).href : '',
    isSoldOut: row.querySelector('img[alt="품절"], img[src*="end_icon"]') !== null
      || /품절|종료/.test(titleLink.textContent),
    isPopular: row.querySelector('img[src*="hot_icon"], img[src*="best"]') !== null
  };
}).filter((item) => item !== null))
"#;

const DETAIL_SCRIPT: &str = r#"
JSON.stringify({
  content: (document.querySelector('td.board-contents')?.innerText || '').trim(),
  images: Array.from(
    document.querySelectorAll('td.board-contents img')
  ).map((img) => img.src).filter((src) => src.startsWith('http')),
  postedAt: document.querySelector('.sub-top-text-box ul.topTitle-mainbox li')
    ?.textContent.match(/\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}/)?.[0] || null
})
"#;

impl SiteAdapter for PpomppuAdapter {
    fn source(&self) -> DealSource {
        DealSource::Ppomppu
    }

    fn list_url(&self, page: u32) -> String {
        format!("https://www.ppomppu.co.kr/zboard/zboard.php?id=ppomppu&page={page}")
    }

    fn list_wait_selector(&self) -> &'static str {
        "#revolution_main_table"
    }

    fn list_script(&self) -> &'static str {
        LIST_SCRIPT
    }

    fn detail_wait_selector(&self) -> &'static str {
        "td.board-contents"
    }

    fn detail_script(&self) -> &'static str {
        DETAIL_SCRIPT
    }
}
