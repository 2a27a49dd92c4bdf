//! Event-driven observability for branch execution.
//!
//! The engine reports branch and stage lifecycle transitions
//! (`branch.started`, `stage.completed`, `branch.failed`, ...) through an
//! [`EventSink`]; hosts pick how those observations are consumed.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
