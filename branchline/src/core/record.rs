//! Per-branch execution records and their aggregation.

use super::{BranchStatus, CorrelationId, Item};
use crate::errors::StageError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Outcome of a single stage execution within a branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name.
    pub stage: String,
    /// Number of items the stage produced.
    pub produced: usize,
    /// Error message if the stage failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stage execution time in milliseconds.
    pub duration_ms: f64,
}

impl StageRecord {
    /// Records a successful stage execution.
    #[must_use]
    pub fn ok(stage: impl Into<String>, produced: usize, duration_ms: f64) -> Self {
        Self {
            stage: stage.into(),
            produced,
            error: None,
            duration_ms,
        }
    }

    /// Records a failed stage execution.
    #[must_use]
    pub fn failed(stage: impl Into<String>, error: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            stage: stage.into(),
            produced: 0,
            error: Some(error.into()),
            duration_ms,
        }
    }

    /// Returns true if the stage completed without error.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-branch outcome record.
///
/// One record exists per leaf branch: fan-out replaces a lineage with its
/// children, each of which carries the per-stage outcomes of the stages it
/// inherited from its ancestors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Name of the pipeline the branch ran in.
    pub pipeline: String,
    /// Correlation id of the branch.
    pub correlation_id: CorrelationId,
    /// The item that entered the branch.
    pub origin: Item,
    /// Per-stage outcomes along the branch lineage, oldest first.
    pub stages: Vec<StageRecord>,
    /// Current (or terminal) status of the branch.
    pub status: BranchStatus,
    /// Final outputs retained by the branch.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Item>,
    /// Error message for failed branches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Cancellation reason for cancelled branches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    /// When the branch started.
    pub started_at: DateTime<Utc>,
    /// When the branch reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExecutionRecord {
    /// Creates a pending record for a branch about to run.
    #[must_use]
    pub fn new(pipeline: impl Into<String>, origin: Item) -> Self {
        let correlation_id = origin.correlation_id().clone();
        Self {
            pipeline: pipeline.into(),
            correlation_id,
            origin,
            stages: Vec::new(),
            status: BranchStatus::Pending,
            outputs: Vec::new(),
            error: None,
            cancel_reason: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Seeds the record with the stage outcomes of its lineage prefix.
    #[must_use]
    pub fn with_stage_prefix(mut self, stages: Vec<StageRecord>) -> Self {
        self.stages = stages;
        self
    }

    /// Moves the branch into the running state.
    pub fn mark_running(&mut self) {
        self.status = BranchStatus::Running;
    }

    /// Appends a stage outcome.
    pub fn push_stage(&mut self, stage: StageRecord) {
        self.stages.push(stage);
    }

    /// Marks the branch completed with its retained outputs.
    pub fn complete(&mut self, outputs: Vec<Item>) {
        self.status = BranchStatus::Completed;
        self.outputs = outputs;
        self.finished_at = Some(Utc::now());
    }

    /// Marks the branch terminal with zero retained outputs.
    pub fn complete_empty(&mut self) {
        self.status = BranchStatus::Empty;
        self.finished_at = Some(Utc::now());
    }

    /// Marks the branch failed with the stage error that terminated it.
    pub fn fail(&mut self, error: &StageError) {
        self.fail_with(error.to_string());
    }

    /// Marks the branch failed with a rendered message.
    pub fn fail_with(&mut self, message: impl Into<String>) {
        self.status = BranchStatus::Failed;
        self.error = Some(message.into());
        self.finished_at = Some(Utc::now());
    }

    /// Marks the branch cancelled.
    pub fn cancel(&mut self, reason: impl Into<String>) {
        self.status = BranchStatus::Cancelled;
        self.cancel_reason = Some(reason.into());
        self.finished_at = Some(Utc::now());
    }

    /// Returns true if the branch reached a terminal status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Wall-clock duration of the branch in milliseconds, once finished.
    #[must_use]
    pub fn duration_ms(&self) -> Option<f64> {
        self.finished_at.map(|finished| {
            let elapsed = finished - self.started_at;
            elapsed
                .num_microseconds()
                .map_or_else(|| elapsed.num_milliseconds() as f64, |us| us as f64 / 1000.0)
        })
    }
}

/// Aggregate status of one top-level submission, derived from the branch
/// records it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// No branch failed.
    Completed,
    /// Some branches failed and some succeeded.
    PartiallyFailed,
    /// Every branch failed.
    Failed,
}

impl SubmissionStatus {
    /// Derives the aggregate status from a submission's branch records.
    ///
    /// Cancelled branches do not count as failures.
    #[must_use]
    pub fn from_records(records: &[ExecutionRecord]) -> Self {
        let failed = records.iter().filter(|r| r.status.is_failure()).count();
        if failed == 0 {
            Self::Completed
        } else if failed == records.len() {
            Self::Failed
        } else {
            Self::PartiallyFailed
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::PartiallyFailed => write!(f, "partially_failed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Concurrency-safe, append-only collection of branch records.
///
/// The single serialization point of the engine: every branch's record is
/// retained, appends never overwrite.
#[derive(Debug, Default)]
pub struct RecordCollector {
    records: Mutex<Vec<ExecutionRecord>>,
}

impl RecordCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn push(&self, record: ExecutionRecord) {
        self.records.lock().push(record);
    }

    /// Number of records collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns true if no records have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Snapshot of the records in arrival order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ExecutionRecord> {
        self.records.lock().clone()
    }

    /// Snapshot sorted by correlation id, giving a stable reporting order
    /// independent of branch completion order.
    #[must_use]
    pub fn sorted(&self) -> Vec<ExecutionRecord> {
        let mut records = self.snapshot();
        records.sort_by(|a, b| a.correlation_id.cmp(&b.correlation_id));
        records
    }

    /// Records whose correlation id lies within `root`.
    #[must_use]
    pub fn records_within(&self, root: &CorrelationId) -> Vec<ExecutionRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.correlation_id.is_within(root))
            .cloned()
            .collect()
    }
}
