use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlerError {
    /// The Chrome process could not be started. Fatal to the whole run.
    #[error("browser launch failed: {reason}")]
    BrowserLaunch { reason: String },

    /// Navigation timed out or the network failed. Fatal to the run; the
    /// next scheduled fire retries naturally.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// An extraction script failed to evaluate. Distinct from "the expected
    /// container never appeared", which yields an empty item list instead.
    #[error("extraction script failed: {reason}")]
    Evaluate { reason: String },

    #[error("failed to decode extraction payload for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A blocking browser task panicked or was cancelled.
    #[error("browser task failed: {reason}")]
    BrowserTask { reason: String },
}
