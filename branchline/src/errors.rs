//! Error types for the branchline engine.
//!
//! The taxonomy separates configuration-time errors, which are fatal and
//! raised immediately, from stage failures, which are recovered at the branch
//! level and only ever surface through execution records.

use thiserror::Error;

/// A configuration or dispatch error.
///
/// Raised immediately when pipelines are built, registered, or looked up;
/// never produces an execution record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A pipeline was built with no stages.
    #[error("pipeline '{pipeline}' has no stages")]
    EmptyPipeline {
        /// The pipeline name.
        pipeline: String,
    },

    /// Two stages in one pipeline share a name.
    #[error("pipeline '{pipeline}' declares stage '{stage}' more than once")]
    DuplicateStage {
        /// The pipeline name.
        pipeline: String,
        /// The repeated stage name.
        stage: String,
    },

    /// Two registered pipelines share a name.
    #[error("a pipeline named '{name}' is already registered")]
    DuplicatePipeline {
        /// The repeated pipeline name.
        name: String,
    },

    /// Dispatch to a pipeline name that was never registered.
    #[error("no pipeline named '{name}' is registered")]
    UnknownPipeline {
        /// The unknown pipeline name.
        name: String,
    },
}

/// A single stage's failure.
///
/// Terminates only the branch it occurred in: the error is recorded on that
/// branch's [`ExecutionRecord`](crate::core::ExecutionRecord) and never
/// propagated to sibling branches or to the submitting caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stage '{stage}' failed: {message}")]
pub struct StageError {
    /// Name of the failing stage.
    pub stage: String,
    /// Rendered underlying cause.
    pub message: String,
}

impl StageError {
    /// Creates a stage error from any displayable cause.
    #[must_use]
    pub fn new(stage: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self {
            stage: stage.into(),
            message: cause.to_string(),
        }
    }
}

/// Failure surfaced by an [`HttpFetcher`](crate::extract::HttpFetcher).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request could not be carried out.
    #[error("request to '{url}' failed: {message}")]
    Transport {
        /// The requested URL.
        url: String,
        /// Rendered transport error.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("'{url}' returned status {status}")]
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The fetcher itself could not be set up.
    #[error("fetch client error: {0}")]
    Client(String),
}

/// Failure surfaced by an [`RdfExtractor`](crate::extract::RdfExtractor).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The document could not be parsed into a model.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The extractor does not support the requested format.
    #[error("unsupported format '{0}'")]
    UnsupportedFormat(crate::extract::RdfFormat),
}
