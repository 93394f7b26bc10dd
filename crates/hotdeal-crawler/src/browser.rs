//! Headless Chrome session shared by one crawl run.
//!
//! The community boards render their listings client-side, so a plain HTTP
//! fetch sees an empty shell; everything goes through a real browser tab and
//! an in-page extraction script. The Chrome process dies with the session
//! (the [`headless_chrome::Browser`] handle kills it on drop).

use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions};
use tracing::{debug, warn};

use hotdeal_core::CrawlerConfig;

use crate::error::CrawlerError;

/// How long to wait for the listing container before concluding the page is
/// empty rather than still loading.
const ELEMENT_WAIT_SECS: u64 = 10;

pub struct BrowserSession {
    browser: Browser,
    user_agent: String,
    nav_timeout: Duration,
}

impl BrowserSession {
    /// Launches a Chrome process configured for crawling.
    ///
    /// All calls on the returned session are blocking; async callers must
    /// wrap them in `spawn_blocking`.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::BrowserLaunch`] when the Chrome binary cannot
    /// be found or fails to start.
    pub fn launch(config: &CrawlerConfig) -> Result<Self, CrawlerError> {
        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false)
            .window_size(Some((1400, 1000)))
            .idle_browser_timeout(Duration::from_secs(config.navigation_timeout_secs * 4))
            .build()
            .map_err(|e| CrawlerError::BrowserLaunch {
                reason: e.to_string(),
            })?;

        let browser = Browser::new(options).map_err(|e| CrawlerError::BrowserLaunch {
            reason: e.to_string(),
        })?;

        Ok(Self {
            browser,
            user_agent: config.user_agent.clone(),
            nav_timeout: Duration::from_secs(config.navigation_timeout_secs),
        })
    }

    /// Navigates a fresh tab to `url`, waits for `wait_selector`, then runs
    /// `script` and returns its string result.
    ///
    /// The extraction scripts all end in `JSON.stringify(...)`, which makes
    /// the evaluation result a string primitive; objects would come back as
    /// opaque remote references.
    ///
    /// Returns `Ok(None)` when `wait_selector` never appears: board pages
    /// past the last one render a valid page with no listing container, and
    /// that is an empty page, not a failure.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Navigation`] when the page cannot be reached
    /// and [`CrawlerError::Evaluate`] when the script itself fails.
    pub fn fetch_payload(
        &self,
        url: &str,
        wait_selector: &str,
        script: &str,
    ) -> Result<Option<String>, CrawlerError> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| CrawlerError::Navigation {
                url: url.to_string(),
                reason: format!("tab open failed: {e}"),
            })?;
        tab.set_default_timeout(self.nav_timeout);

        let result = self.fetch_on_tab(&tab, url, wait_selector, script);
        if let Err(e) = tab.close(true) {
            debug!("tab close failed after {url}: {e}");
        }
        result
    }

    fn fetch_on_tab(
        &self,
        tab: &headless_chrome::Tab,
        url: &str,
        wait_selector: &str,
        script: &str,
    ) -> Result<Option<String>, CrawlerError> {
        tab.set_user_agent(&self.user_agent, None, None)
            .map_err(|e| CrawlerError::Navigation {
                url: url.to_string(),
                reason: format!("user agent setup failed: {e}"),
            })?;

        tab.navigate_to(url).map_err(|e| CrawlerError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        tab.wait_until_navigated()
            .map_err(|e| CrawlerError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if tab
            .wait_for_element_with_custom_timeout(
                wait_selector,
                Duration::from_secs(ELEMENT_WAIT_SECS),
            )
            .is_err()
        {
            warn!("no {wait_selector} on {url}, treating as empty page");
            return Ok(None);
        }

        let evaluated = tab
            .evaluate(script, false)
            .map_err(|e| CrawlerError::Evaluate {
                reason: e.to_string(),
            })?;

        match evaluated.value {
            Some(serde_json::Value::String(payload)) => Ok(Some(payload)),
            other => Err(CrawlerError::Evaluate {
                reason: format!("expected a JSON string payload, got {other:?}"),
            }),
        }
    }
}

impl std::fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserSession")
            .field("user_agent", &self.user_agent)
            .field("nav_timeout", &self.nav_timeout)
            .finish_non_exhaustive()
    }
}
