//! Capability traits supplied by the host environment.

use super::model::{RdfFormat, StructuredModel};
use crate::errors::{ExtractError, FetchError};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Fetches raw bytes for a URL.
///
/// Supplied by the environment; retry and backoff policy, if any, lives
/// behind this interface rather than in the engine.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Fetches the resource at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Extracts a structured model from fetched bytes.
///
/// Supplied by the environment; no parsing or extraction heuristics are
/// defined on this side of the seam.
#[cfg_attr(test, automock)]
pub trait RdfExtractor: Send + Sync {
    /// Extracts statements from `bytes` against the given base URI.
    fn extract(
        &self,
        bytes: &[u8],
        base_uri: &str,
        format: RdfFormat,
    ) -> Result<StructuredModel, ExtractError>;
}
