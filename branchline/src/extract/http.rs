//! reqwest-backed [`HttpFetcher`].

use super::config::FetchConfig;
use super::protocols::HttpFetcher;
use crate::errors::FetchError;
use async_trait::async_trait;

/// [`HttpFetcher`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl ReqwestFetcher {
    /// Creates a fetcher from the given configuration.
    ///
    /// # Errors
    ///
    /// [`FetchError::Client`] if the underlying client cannot be built.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// The configuration this fetcher was built with.
    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(bytes.to_vec())
    }
}
