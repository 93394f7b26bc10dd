//! Per-site extraction knowledge: list URLs, the selectors that prove a page
//! rendered, and the in-page scripts that lift rows into the shared
//! [`RawListItem`](crate::types::RawListItem) shape.
//!
//! Adapters hold no browser state and no parsing logic. Everything they
//! return is data, so the orchestrator can be tested without Chrome and a new
//! site lands as one file here plus a [`DealSource`] variant.

use hotdeal_core::DealSource;

mod clien;
mod ppomppu;

pub use clien::ClienAdapter;
pub use ppomppu::PpomppuAdapter;

/// Extraction contract for one community board.
///
/// Scripts must evaluate to `JSON.stringify` of the payload: the browser
/// session only accepts string primitives back from the page.
pub trait SiteAdapter: Send + Sync {
    fn source(&self) -> DealSource;

    /// Listing URL for a 1-based page number.
    fn list_url(&self, page: u32) -> String;

    /// Selector whose absence means the page rendered without listings.
    fn list_wait_selector(&self) -> &'static str;

    /// Script evaluating to a JSON array of camelCase list items.
    fn list_script(&self) -> &'static str;

    /// Selector for a rendered post body on the detail page.
    fn detail_wait_selector(&self) -> &'static str;

    /// Script evaluating to a JSON object with `content`, `images`,
    /// `postedAt`.
    fn detail_script(&self) -> &'static str;
}

/// Adapter registry keyed by source tag.
#[must_use]
pub fn adapter_for(source: DealSource) -> &'static dyn SiteAdapter {
    match source {
        DealSource::Ppomppu => &PpomppuAdapter,
        DealSource::Clien => &ClienAdapter,
    }
}
