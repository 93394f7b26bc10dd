use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Per-run crawl settings (§ browser session + orchestrator).
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Launch Chrome without a visible window. Disable for local debugging.
    pub headless: bool,
    pub max_pages: u32,
    /// Fixed delay between successive page navigations.
    pub page_delay_ms: u64,
    pub navigation_timeout_secs: u64,
    /// When set, pagination stops at the first post older than this window
    /// and only in-window posts are upserted.
    pub time_filter_hours: Option<i64>,
    pub user_agent: String,
    /// Visit each post's detail page for content and full-size images.
    pub fetch_details: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            headless: true,
            max_pages: 2,
            page_delay_ms: 3000,
            navigation_timeout_secs: 60,
            time_filter_hours: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            fetch_details: false,
        }
    }
}

/// Per-sweep expiry settings.
#[derive(Debug, Clone, Copy)]
pub struct ExpiryConfig {
    pub batch_size: u64,
    /// Deals expiring within this many hours are counted as `expiring_soon`.
    pub warning_hours: i64,
    /// Count transitions without writing them.
    pub dry_run: bool,
    /// Pause between batches to bound sustained store load.
    pub batch_pause_ms: u64,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            warning_hours: 24,
            dry_run: false,
            batch_pause_ms: 100,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub crawler: CrawlerConfig,
    pub expiry: ExpiryConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("crawler", &self.crawler)
            .field("expiry", &self.expiry)
            .finish()
    }
}
