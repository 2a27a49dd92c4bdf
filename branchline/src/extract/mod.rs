//! External collaborator interfaces and the workflow stages built on them.
//!
//! Fetching and extraction are supplied by the host environment through the
//! [`HttpFetcher`] and [`RdfExtractor`] capabilities. This module defines
//! those seams, the data they exchange, and prebuilt stages that wire them
//! into pipelines: fetch a page, extract a structured model, select a
//! property's values, fan the values out, and log results.

mod config;
#[cfg(feature = "http")]
mod http;
mod model;
mod protocols;
mod stages;

pub use config::{ExtractConfig, FetchConfig};
#[cfg(feature = "http")]
pub use http::ReqwestFetcher;
pub use model::{RdfFormat, Statement, StructuredModel};
pub use protocols::{HttpFetcher, RdfExtractor};
#[cfg(test)]
pub(crate) use protocols::{MockHttpFetcher, MockRdfExtractor};
pub use stages::{ExtractStage, FetchStage, LogSinkStage, PropertySelectStage};
