//! Branch execution engine.
//!
//! Drives one item's descendant chain through a pipeline: strictly
//! sequential within a branch, forking the pipeline remainder per output item
//! when a stage fans out, and forwarding terminal outputs into a continuation
//! pipeline when one is configured. Only leaf branches produce records; a
//! forking lineage lives on through its children, each of which inherits the
//! per-stage outcomes accumulated so far.

use super::Pipeline;
use crate::cancellation::CancellationToken;
use crate::core::{ExecutionRecord, Item, RecordCollector, StageRecord};
use crate::events::EventSink;
use crate::stages::Stage;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::warn;

/// Shared execution state for all branches of one submission.
pub(crate) struct BranchContext {
    pub(crate) pipeline: Arc<Pipeline>,
    pub(crate) forward_to: Option<Arc<Pipeline>>,
    pub(crate) collector: Arc<RecordCollector>,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) cancel: Arc<CancellationToken>,
}

impl BranchContext {
    /// Context for branches re-dispatched into the continuation pipeline.
    /// Forwarding is single-hop, so the child context has no continuation of
    /// its own.
    fn forwarded(&self, pipeline: Arc<Pipeline>) -> Arc<Self> {
        Arc::new(Self {
            pipeline,
            forward_to: None,
            collector: Arc::clone(&self.collector),
            sink: Arc::clone(&self.sink),
            cancel: Arc::clone(&self.cancel),
        })
    }
}

/// Runs one branch from stage `start` through the remaining stages.
///
/// The returned future resolves only after every descendant branch spawned by
/// fan-out or forwarding has pushed its record, so awaiting the root branch
/// is enough to drain a whole submission.
pub(crate) fn run_branch(
    ctx: Arc<BranchContext>,
    item: Item,
    start: usize,
    stage_prefix: Vec<StageRecord>,
) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        let pipeline_name = ctx.pipeline.name().to_string();
        let mut record =
            ExecutionRecord::new(&pipeline_name, item.clone()).with_stage_prefix(stage_prefix);
        record.mark_running();
        ctx.sink.try_emit(
            "branch.started",
            Some(json!({
                "pipeline": pipeline_name,
                "correlation_id": item.correlation_id().as_str(),
            })),
        );

        let mut current = item;
        let mut index = start;
        let stage_total = ctx.pipeline.stage_count();

        loop {
            if ctx.cancel.is_cancelled() {
                let reason = ctx
                    .cancel
                    .reason()
                    .unwrap_or_else(|| "cancelled".to_string());
                record.cancel(reason.clone());
                ctx.sink.try_emit(
                    "branch.cancelled",
                    Some(json!({
                        "pipeline": pipeline_name,
                        "correlation_id": record.correlation_id.as_str(),
                        "reason": reason,
                    })),
                );
                ctx.collector.push(record);
                return;
            }

            let stage = Arc::clone(&ctx.pipeline.stages()[index]);
            let started = Instant::now();
            let result = stage.execute(&current).await;
            let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

            let outputs = match result {
                Ok(outputs) => outputs,
                Err(err) => {
                    record.push_stage(StageRecord::failed(
                        stage.name(),
                        err.message.clone(),
                        duration_ms,
                    ));
                    record.fail(&err);
                    ctx.sink.try_emit(
                        "stage.failed",
                        Some(json!({
                            "pipeline": pipeline_name,
                            "stage": stage.name(),
                            "correlation_id": record.correlation_id.as_str(),
                            "error": err.message,
                        })),
                    );
                    ctx.sink.try_emit(
                        "branch.failed",
                        Some(json!({
                            "pipeline": pipeline_name,
                            "correlation_id": record.correlation_id.as_str(),
                        })),
                    );
                    ctx.collector.push(record);
                    return;
                }
            };

            let mut outputs = adopt_outputs(stage.as_ref(), &current, outputs);
            record.push_stage(StageRecord::ok(stage.name(), outputs.len(), duration_ms));
            ctx.sink.try_emit(
                "stage.completed",
                Some(json!({
                    "pipeline": pipeline_name,
                    "stage": stage.name(),
                    "correlation_id": record.correlation_id.as_str(),
                    "produced": outputs.len(),
                })),
            );

            let last = index + 1 == stage_total;

            if last {
                if let Some(next) = ctx.forward_to.as_ref().map(Arc::clone) {
                    let child_ctx = ctx.forwarded(next);
                    let forwarded = outputs.len();
                    let handles = spawn_children(&child_ctx, outputs, 0, Vec::new());

                    record.complete_empty();
                    ctx.sink.try_emit(
                        "branch.forwarded",
                        Some(json!({
                            "pipeline": pipeline_name,
                            "correlation_id": record.correlation_id.as_str(),
                            "to": child_ctx.pipeline.name(),
                            "count": forwarded,
                        })),
                    );
                    ctx.collector.push(record);
                    join_children(&child_ctx, handles).await;
                    return;
                }

                if outputs.is_empty() {
                    record.complete_empty();
                    ctx.sink.try_emit(
                        "branch.empty",
                        Some(json!({
                            "pipeline": pipeline_name,
                            "correlation_id": record.correlation_id.as_str(),
                        })),
                    );
                } else {
                    record.complete(outputs);
                    ctx.sink.try_emit(
                        "branch.completed",
                        Some(json!({
                            "pipeline": pipeline_name,
                            "correlation_id": record.correlation_id.as_str(),
                        })),
                    );
                }
                ctx.collector.push(record);
                return;
            }

            if outputs.is_empty() {
                record.complete_empty();
                ctx.sink.try_emit(
                    "branch.empty",
                    Some(json!({
                        "pipeline": pipeline_name,
                        "correlation_id": record.correlation_id.as_str(),
                    })),
                );
                ctx.collector.push(record);
                return;
            }

            if outputs.len() == 1 {
                current = outputs.remove(0);
                // A one-to-many stage that produced a single child renames
                // the branch to the child's correlation id.
                if current.correlation_id() != &record.correlation_id {
                    record.correlation_id = current.correlation_id().clone();
                }
                index += 1;
                continue;
            }

            // Fan-out: the remainder of the pipeline forks per output item.
            // This lineage continues only through its children; they inherit
            // the stage outcomes accumulated so far.
            let handles = spawn_children(&ctx, outputs, index + 1, record.stages.clone());
            join_children(&ctx, handles).await;
            return;
        }
    })
}

/// Normalizes stage outputs before dispatch: stamps the stage into each
/// output's history and derives `parent/i` correlations for fan-out outputs
/// whose stage did not already assign child ids.
fn adopt_outputs(stage: &dyn Stage, parent: &Item, mut outputs: Vec<Item>) -> Vec<Item> {
    if !stage.arity().admits(outputs.len()) {
        warn!(
            stage = stage.name(),
            arity = %stage.arity(),
            produced = outputs.len(),
            "stage output cardinality contradicts its declared arity"
        );
    }

    let fan_out = outputs.len() > 1;
    for (index, output) in outputs.iter_mut().enumerate() {
        output.ensure_history(stage.name());
        if fan_out && output.correlation_id() == parent.correlation_id() {
            output.set_correlation(parent.correlation_id().child(index));
        }
    }
    outputs
}

type ChildHandle = (Item, JoinHandle<()>);

fn spawn_children(
    ctx: &Arc<BranchContext>,
    items: Vec<Item>,
    start: usize,
    prefix: Vec<StageRecord>,
) -> Vec<ChildHandle> {
    items
        .into_iter()
        .map(|child| {
            let handle = tokio::spawn(run_branch(
                Arc::clone(ctx),
                child.clone(),
                start,
                prefix.clone(),
            ));
            (child, handle)
        })
        .collect()
}

/// Awaits spawned child branches, converting join failures into recorded
/// outcomes so a panicking branch cannot take its siblings down with it.
async fn join_children(ctx: &BranchContext, handles: Vec<ChildHandle>) {
    let mut pending: FuturesUnordered<_> = handles
        .into_iter()
        .map(|(child, handle)| async move { (child, handle.await) })
        .collect();

    while let Some((child, joined)) = pending.next().await {
        if let Err(err) = joined {
            let mut record = ExecutionRecord::new(ctx.pipeline.name(), child);
            record.mark_running();
            if err.is_panic() {
                record.fail_with("branch task panicked");
            } else {
                record.cancel("branch task aborted");
            }
            ctx.collector.push(record);
        }
    }
}
