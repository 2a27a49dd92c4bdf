//! Pipeline construction and branch execution.

mod exec;

pub(crate) use exec::{run_branch, BranchContext};

use crate::cancellation::CancellationToken;
use crate::core::{ExecutionRecord, Item, RecordCollector};
use crate::errors::ConfigError;
use crate::events::NoOpEventSink;
use crate::stages::Stage;
use std::collections::HashSet;
use std::sync::Arc;

/// An ordered, validated sequence of stages.
///
/// Pipelines are configured once at startup and immutable for the process
/// lifetime. Build one with [`Pipeline::builder`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    /// Starts building a pipeline.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// The pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub(crate) fn stages(&self) -> &[Arc<dyn Stage>] {
        &self.stages
    }

    /// Runs one item through this pipeline without a runner.
    ///
    /// Fan-out may turn the single input into several leaf branches; the
    /// records of all of them are returned, sorted by correlation id.
    pub async fn run(self: Arc<Self>, item: Item) -> Vec<ExecutionRecord> {
        let collector = Arc::new(RecordCollector::new());
        let ctx = Arc::new(BranchContext {
            pipeline: self,
            forward_to: None,
            collector: Arc::clone(&collector),
            sink: Arc::new(NoOpEventSink),
            cancel: Arc::new(CancellationToken::new()),
        });

        run_branch(ctx, item, 0, Vec::new()).await;
        collector.sorted()
    }
}

/// Builder validating pipelines at configuration time.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    name: String,
    stages: Vec<Arc<dyn Stage>>,
}

impl PipelineBuilder {
    /// Appends a stage.
    #[must_use]
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Validates and builds the pipeline.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyPipeline`] if no stage was added;
    /// [`ConfigError::DuplicateStage`] if two stages share a name.
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::EmptyPipeline {
                pipeline: self.name,
            });
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage.name().to_string()) {
                return Err(ConfigError::DuplicateStage {
                    pipeline: self.name,
                    stage: stage.name().to_string(),
                });
            }
        }

        Ok(Pipeline {
            name: self.name,
            stages: self.stages,
        })
    }
}
