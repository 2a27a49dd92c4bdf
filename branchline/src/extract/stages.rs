//! Prebuilt stages wiring the fetch/extract collaborators into pipelines.

use super::config::ExtractConfig;
use super::model::{RdfFormat, StructuredModel};
use super::protocols::{HttpFetcher, RdfExtractor};
use crate::core::{Item, StageArity};
use crate::errors::StageError;
use crate::stages::Stage;
use async_trait::async_trait;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Fetches the URL in the item payload and emits `{"url", "body"}`.
pub struct FetchStage {
    name: String,
    fetcher: Arc<dyn HttpFetcher>,
}

impl FetchStage {
    /// Creates a fetch stage backed by the given fetcher.
    #[must_use]
    pub fn new(name: impl Into<String>, fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            name: name.into(),
            fetcher,
        }
    }
}

impl fmt::Debug for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchStage").field("name", &self.name).finish()
    }
}

#[async_trait]
impl Stage for FetchStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, item: &Item) -> Result<Vec<Item>, StageError> {
        let url = item
            .payload()
            .as_str()
            .ok_or_else(|| StageError::new(&self.name, "payload is not a url string"))?;

        let bytes = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| StageError::new(&self.name, e))?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(vec![item.derive(json!({ "url": url, "body": body }), &self.name)])
    }
}

/// Extracts a structured model from a fetched document body.
///
/// Accepts either a `{"url", "body"}` object from a [`FetchStage`] or a plain
/// string payload; the model is serialized into the output item's payload.
pub struct ExtractStage {
    name: String,
    extractor: Arc<dyn RdfExtractor>,
    base_uri: String,
    format: RdfFormat,
}

impl ExtractStage {
    /// Creates an extract stage using the configured base URI.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        extractor: Arc<dyn RdfExtractor>,
        config: &ExtractConfig,
    ) -> Self {
        Self {
            name: name.into(),
            extractor,
            base_uri: config.base_uri.clone(),
            format: RdfFormat::Default,
        }
    }

    /// Requests a specific extraction format.
    #[must_use]
    pub fn with_format(mut self, format: RdfFormat) -> Self {
        self.format = format;
        self
    }
}

impl fmt::Debug for ExtractStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractStage")
            .field("name", &self.name)
            .field("base_uri", &self.base_uri)
            .field("format", &self.format)
            .finish()
    }
}

#[async_trait]
impl Stage for ExtractStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, item: &Item) -> Result<Vec<Item>, StageError> {
        let body = match item.payload() {
            serde_json::Value::String(text) => text.as_str(),
            value => value
                .get("body")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| StageError::new(&self.name, "payload carries no document body"))?,
        };

        let model = self
            .extractor
            .extract(body.as_bytes(), &self.base_uri, self.format)
            .map_err(|e| StageError::new(&self.name, e))?;
        let payload =
            serde_json::to_value(model).map_err(|e| StageError::new(&self.name, e))?;

        Ok(vec![item.derive(payload, &self.name)])
    }
}

/// Selects one property's object values from an extracted model and emits
/// them as a JSON array, ready for a [`SplitStage`](crate::stages::SplitStage).
pub struct PropertySelectStage {
    name: String,
    predicate: String,
    rewrite: Option<Box<dyn Fn(&str) -> String + Send + Sync>>,
}

impl PropertySelectStage {
    /// Selects the object values of `predicate`.
    #[must_use]
    pub fn new(name: impl Into<String>, predicate: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            predicate: predicate.into(),
            rewrite: None,
        }
    }

    /// Applies a rewrite to each selected value, e.g. turning resource IRIs
    /// into browsable page URLs.
    #[must_use]
    pub fn with_rewrite<F>(mut self, rewrite: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.rewrite = Some(Box::new(rewrite));
        self
    }
}

impl fmt::Debug for PropertySelectStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySelectStage")
            .field("name", &self.name)
            .field("predicate", &self.predicate)
            .field("rewrite", &self.rewrite.is_some())
            .finish()
    }
}

#[async_trait]
impl Stage for PropertySelectStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, item: &Item) -> Result<Vec<Item>, StageError> {
        let model: StructuredModel = serde_json::from_value(item.payload().clone())
            .map_err(|e| StageError::new(&self.name, format!("payload is not a model: {e}")))?;

        let values: Vec<String> = model
            .objects_of(&self.predicate)
            .into_iter()
            .map(|value| match &self.rewrite {
                Some(rewrite) => rewrite(&value),
                None => value,
            })
            .collect();

        Ok(vec![item.derive(json!(values), &self.name)])
    }
}

/// Logs the payload and emits nothing: a terminal sink.
#[derive(Debug, Clone)]
pub struct LogSinkStage {
    name: String,
}

impl LogSinkStage {
    /// Creates a log sink.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Stage for LogSinkStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> StageArity {
        StageArity::Sink
    }

    async fn execute(&self, item: &Item) -> Result<Vec<Item>, StageError> {
        info!(
            target: "branchline::sink",
            correlation_id = %item.correlation_id(),
            payload = %item.payload(),
            "{}", self.name
        );
        Ok(Vec::new())
    }
}
