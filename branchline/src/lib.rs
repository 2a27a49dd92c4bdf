//! # Branchline
//!
//! A small sequential/branching data-pipeline engine with typed stages,
//! item-level fan-out, and per-item error isolation.
//!
//! Branchline sequences named stages into validated pipelines and drives
//! them through a runner:
//!
//! - **Typed stages**: one item in, zero or more items out, or a recorded
//!   failure ([`stages::Stage`]).
//! - **Item-level fan-out**: a stage producing several outputs forks the rest
//!   of the pipeline per output item; [`stages::SplitStage`] turns a sequence
//!   payload into independent sibling branches.
//! - **Error isolation**: a failing branch is recorded and terminated without
//!   touching its siblings; [`runner::Runner::await_all`] always returns the
//!   complete record set.
//! - **Collaborator seams**: fetching and extraction are environment-supplied
//!   capabilities ([`extract::HttpFetcher`], [`extract::RdfExtractor`]) with
//!   prebuilt stages wiring them into pipelines.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use branchline::prelude::*;
//! use std::sync::Arc;
//!
//! let config = ExtractConfig::new("http://base.test/");
//!
//! let main = Pipeline::builder("main")
//!     .stage(Arc::new(FetchStage::new("fetch", fetcher)))
//!     .stage(Arc::new(ExtractStage::new("extract", extractor, &config)))
//!     .stage(Arc::new(PropertySelectStage::new("select", "leaderName")))
//!     .stage(Arc::new(SplitStage::new("split")))
//!     .build()?;
//!
//! let runner = Runner::builder().pipeline(main)?.build();
//! runner.submit("main", serde_json::json!("http://example.test/page"))?;
//! let records = runner.await_all().await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod core;
pub mod errors;
pub mod events;
pub mod extract;
pub mod observability;
pub mod pipeline;
pub mod runner;
pub mod stages;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::core::{
        BranchStatus, CorrelationId, ExecutionRecord, Item, RecordCollector, StageArity,
        StageRecord, SubmissionStatus,
    };
    pub use crate::errors::{ConfigError, ExtractError, FetchError, StageError};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    #[cfg(feature = "http")]
    pub use crate::extract::ReqwestFetcher;
    pub use crate::extract::{
        ExtractConfig, ExtractStage, FetchConfig, FetchStage, HttpFetcher, LogSinkStage,
        PropertySelectStage, RdfExtractor, RdfFormat, Statement, StructuredModel,
    };
    pub use crate::observability::init_tracing;
    pub use crate::pipeline::{Pipeline, PipelineBuilder};
    pub use crate::runner::{Runner, RunnerBuilder, SubmissionHandle, SubmitOptions};
    pub use crate::stages::{FnStage, SplitStage, Stage};
}
