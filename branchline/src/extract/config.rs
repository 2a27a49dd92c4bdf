//! Configuration for the fetch/extract collaborators.
//!
//! Plain structs set once at startup; there is no runtime reconfiguration.

use std::time::Duration;

/// Settings for HTTP fetching.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent sent with each request.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("branchline/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Settings for model extraction.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Base URI used as extraction context.
    pub base_uri: String,
}

impl ExtractConfig {
    /// Creates a config with the given base URI.
    #[must_use]
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
        }
    }
}
