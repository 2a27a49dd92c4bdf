//! Named-pipeline registry, submission, and result aggregation.


use crate::cancellation::CancellationToken;
use crate::core::{CorrelationId, ExecutionRecord, Item, RecordCollector, SubmissionStatus};
use crate::errors::ConfigError;
use crate::events::{EventSink, NoOpEventSink};
use crate::pipeline::{run_branch, BranchContext, Pipeline};
use dashmap::DashMap;
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Options for a single submission.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    correlation: Option<String>,
    forward_to: Option<String>,
}

impl SubmitOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an explicit root correlation key instead of a generated one.
    #[must_use]
    pub fn with_correlation(mut self, key: impl Into<String>) -> Self {
        self.correlation = Some(key.into());
        self
    }

    /// Re-dispatches the pipeline's terminal outputs into another registered
    /// pipeline, one new branch per output item. The originating branch then
    /// retains no direct output and ends `Empty`.
    #[must_use]
    pub fn forward_to(mut self, pipeline: impl Into<String>) -> Self {
        self.forward_to = Some(pipeline.into());
        self
    }
}

/// Handle to one submitted top-level item.
#[derive(Clone)]
pub struct SubmissionHandle {
    id: Uuid,
    correlation_id: CorrelationId,
    cancel: Arc<CancellationToken>,
}

impl SubmissionHandle {
    /// The submission id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Root correlation id shared by the submission's branches.
    #[must_use]
    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Cancels every in-flight descendant branch of this submission.
    ///
    /// Unrelated submissions are unaffected. Branches that already reached a
    /// terminal state keep their records.
    pub fn cancel(&self, reason: impl Into<String>) {
        self.cancel.cancel(reason);
    }

    /// Whether cancellation was requested for this submission.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl fmt::Debug for SubmissionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionHandle")
            .field("id", &self.id)
            .field("correlation_id", &self.correlation_id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

struct ActiveSubmission {
    origin: Item,
    pipeline: String,
    task: JoinHandle<()>,
}

/// Dispatches named pipelines and aggregates branch records.
///
/// The pipeline registry is populated through [`RunnerBuilder`] and immutable
/// once the runner is built.
pub struct Runner {
    pipelines: HashMap<String, Arc<Pipeline>>,
    collector: Arc<RecordCollector>,
    sink: Arc<dyn EventSink>,
    active: DashMap<Uuid, ActiveSubmission>,
}

impl Runner {
    /// Starts building a runner.
    #[must_use]
    pub fn builder() -> RunnerBuilder {
        RunnerBuilder::new()
    }

    fn lookup(&self, name: &str) -> Result<Arc<Pipeline>, ConfigError> {
        self.pipelines
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownPipeline {
                name: name.to_string(),
            })
    }

    /// Registered pipeline names.
    #[must_use]
    pub fn pipeline_names(&self) -> Vec<&str> {
        self.pipelines.keys().map(String::as_str).collect()
    }

    /// Submits a payload to a named pipeline.
    ///
    /// Must be called from within a tokio runtime; the branch starts
    /// executing immediately.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownPipeline`] if the name was never registered; no
    /// execution record is produced in that case.
    pub fn submit(
        &self,
        pipeline: &str,
        payload: serde_json::Value,
    ) -> Result<SubmissionHandle, ConfigError> {
        self.submit_with(pipeline, payload, SubmitOptions::default())
    }

    /// Submits a payload with explicit options.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownPipeline`] if the target or the forwarding
    /// pipeline was never registered; no execution record is produced.
    pub fn submit_with(
        &self,
        pipeline: &str,
        payload: serde_json::Value,
        options: SubmitOptions,
    ) -> Result<SubmissionHandle, ConfigError> {
        let target = self.lookup(pipeline)?;
        let forward_to = options
            .forward_to
            .as_deref()
            .map(|name| self.lookup(name))
            .transpose()?;

        let correlation_id = options
            .correlation
            .map_or_else(CorrelationId::generate, CorrelationId::new);
        let item = Item::with_correlation(payload, correlation_id.clone());
        let cancel = Arc::new(CancellationToken::new());

        let ctx = Arc::new(BranchContext {
            pipeline: target,
            forward_to,
            collector: Arc::clone(&self.collector),
            sink: Arc::clone(&self.sink),
            cancel: Arc::clone(&cancel),
        });

        let id = Uuid::new_v4();
        self.sink.try_emit(
            "submission.accepted",
            Some(json!({
                "submission_id": id.to_string(),
                "pipeline": pipeline,
                "correlation_id": correlation_id.as_str(),
            })),
        );

        let task = tokio::spawn(run_branch(ctx, item.clone(), 0, Vec::new()));
        self.active.insert(
            id,
            ActiveSubmission {
                origin: item,
                pipeline: pipeline.to_string(),
                task,
            },
        );

        Ok(SubmissionHandle {
            id,
            correlation_id,
            cancel,
        })
    }

    /// Waits for all submitted work and returns every branch record.
    ///
    /// The result set is complete — one record per leaf branch actually
    /// produced, which fan-out may make larger or smaller than the number of
    /// submissions — and sorted by correlation id. Branch failures never turn
    /// into an error here; inspect each record's status.
    pub async fn await_all(&self) -> Vec<ExecutionRecord> {
        let ids: Vec<Uuid> = self.active.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            if let Some((_, submission)) = self.active.remove(&id) {
                if let Err(err) = submission.task.await {
                    // The root branch task itself died; synthesize its record.
                    let mut record =
                        ExecutionRecord::new(&submission.pipeline, submission.origin);
                    record.mark_running();
                    if err.is_panic() {
                        record.fail_with("branch task panicked");
                    } else {
                        record.cancel("branch task aborted");
                    }
                    self.collector.push(record);
                }
            }
        }
        self.collector.sorted()
    }

    /// All records collected so far, sorted by correlation id.
    #[must_use]
    pub fn records(&self) -> Vec<ExecutionRecord> {
        self.collector.sorted()
    }

    /// Aggregate status of one submission's branches.
    #[must_use]
    pub fn status_of(&self, handle: &SubmissionHandle) -> SubmissionStatus {
        let records = self.collector.records_within(handle.correlation_id());
        SubmissionStatus::from_records(&records)
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("pipelines", &self.pipelines.keys().collect::<Vec<_>>())
            .field("active", &self.active.len())
            .field("records", &self.collector.len())
            .finish()
    }
}

/// Builder populating the pipeline registry.
pub struct RunnerBuilder {
    pipelines: HashMap<String, Arc<Pipeline>>,
    sink: Arc<dyn EventSink>,
}

impl RunnerBuilder {
    /// Creates an empty builder with a no-op event sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pipelines: HashMap::new(),
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Registers a pipeline under its own name.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicatePipeline`] if the name is already taken.
    pub fn pipeline(mut self, pipeline: Pipeline) -> Result<Self, ConfigError> {
        let name = pipeline.name().to_string();
        if self.pipelines.contains_key(&name) {
            return Err(ConfigError::DuplicatePipeline { name });
        }
        self.pipelines.insert(name, Arc::new(pipeline));
        Ok(self)
    }

    /// Installs an event sink for branch lifecycle events.
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Builds the runner; the registry is immutable from here on.
    #[must_use]
    pub fn build(self) -> Runner {
        Runner {
            pipelines: self.pipelines,
            collector: Arc::new(RecordCollector::new()),
            sink: self.sink,
            active: DashMap::new(),
        }
    }
}

impl Default for RunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RunnerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerBuilder")
            .field("pipelines", &self.pipelines.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BranchStatus, Item};
    use crate::stages::FnStage;
    use serde_json::json;

    fn echo_pipeline(name: &str) -> Pipeline {
        Pipeline::builder(name)
            .stage(Arc::new(FnStage::new("echo", |item: &Item| {
                Ok(vec![item.derive(item.payload().clone(), "echo")])
            })))
            .build()
            .unwrap()
    }

    #[test]
    fn duplicate_pipeline_registration_fails() {
        let err = Runner::builder()
            .pipeline(echo_pipeline("p"))
            .unwrap()
            .pipeline(echo_pipeline("p"))
            .unwrap_err();

        assert_eq!(
            err,
            ConfigError::DuplicatePipeline {
                name: "p".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unknown_pipeline_dispatch_fails_without_a_record() {
        let runner = Runner::builder()
            .pipeline(echo_pipeline("p"))
            .unwrap()
            .build();

        let err = runner.submit("missing", json!(1)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownPipeline {
                name: "missing".to_string()
            }
        );

        assert!(runner.await_all().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_forwarding_target_fails_up_front() {
        let runner = Runner::builder()
            .pipeline(echo_pipeline("p"))
            .unwrap()
            .build();

        let err = runner
            .submit_with("p", json!(1), SubmitOptions::new().forward_to("missing"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPipeline { .. }));
        assert!(runner.await_all().await.is_empty());
    }

    #[tokio::test]
    async fn submit_and_await_returns_the_branch_record() {
        let runner = Runner::builder()
            .pipeline(echo_pipeline("p"))
            .unwrap()
            .build();

        let handle = runner.submit("p", json!("hello")).unwrap();
        let records = runner.await_all().await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, BranchStatus::Completed);
        assert_eq!(&records[0].correlation_id, handle.correlation_id());
        assert_eq!(runner.status_of(&handle), SubmissionStatus::Completed);
    }

    #[tokio::test]
    async fn await_all_is_idempotent_over_collected_records() {
        let runner = Runner::builder()
            .pipeline(echo_pipeline("p"))
            .unwrap()
            .build();

        runner.submit("p", json!(1)).unwrap();
        let first = runner.await_all().await;
        let second = runner.await_all().await;

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }
}
