//! Ingestion side of the hotdeal pipeline: headless-browser session,
//! per-source site adapters, field parsing and normalization, the
//! dedup/upsert gateway, and the crawl orchestrator.

pub mod adapters;
pub mod browser;
pub mod error;
pub mod gateway;
pub mod normalize;
pub mod orchestrator;
pub mod parse;
pub mod types;

pub use adapters::{adapter_for, SiteAdapter};
pub use browser::BrowserSession;
pub use error::CrawlerError;
pub use gateway::{upsert_deal, UpsertOutcome};
pub use normalize::normalize;
pub use orchestrator::{run_crawl, BrowserPageSource, DealPageSource};
pub use types::{RawDetailItem, RawListItem};
