//! Shared domain types, configuration, and the persistent-store interface
//! for the hotdeal ingestion pipeline.

mod app_config;
mod config;
mod deals;
mod store;

pub use app_config::{AppConfig, CrawlerConfig, Environment, ExpiryConfig};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use deals::{
    CrawlRunStats, DealRecord, DealSource, DealStatus, ExpirySnapshot, ExpiryStats,
    NormalizedDeal, ParsedPrice, DEFAULT_DEAL_LIFETIME_DAYS, UNKNOWN_CATEGORY, UNKNOWN_SELLER,
    UNPARSEABLE_PRICE,
};
pub use store::{DealStore, StoreError};
