//! Stage trait and adapters.
//!
//! Stages are the units of work a pipeline sequences: one item in, zero or
//! more items out, or a recorded failure.

use crate::core::{Item, StageArity};
use crate::errors::StageError;
use async_trait::async_trait;
use std::fmt::Debug;

mod split;

pub use split::SplitStage;

/// A named unit of work transforming one item into zero or more items.
///
/// Implementations must be safe for concurrent invocation across different
/// items: branches run in parallel and share stage instances. A stage must
/// not mutate items it did not produce; inputs arrive by shared reference and
/// outputs are built with [`Item::derive`] or [`Item::child`].
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// The stage's name, unique within its pipeline.
    fn name(&self) -> &str;

    /// The declared output cardinality.
    fn arity(&self) -> StageArity {
        StageArity::OneToOne
    }

    /// Executes the stage on one item.
    ///
    /// Any underlying failure (I/O, malformed payload) is converted into a
    /// [`StageError`]; the engine then terminates only this branch.
    async fn execute(&self, item: &Item) -> Result<Vec<Item>, StageError>;
}

/// A stage backed by a synchronous closure.
///
/// The closure returns `anyhow::Result`, so `?` works on any error type
/// inside; a failure is rendered into a [`StageError`] carrying this stage's
/// name.
pub struct FnStage<F>
where
    F: Fn(&Item) -> anyhow::Result<Vec<Item>> + Send + Sync,
{
    name: String,
    arity: StageArity,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(&Item) -> anyhow::Result<Vec<Item>> + Send + Sync,
{
    /// Creates a one-to-one closure stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            arity: StageArity::OneToOne,
            func,
        }
    }

    /// Overrides the declared arity.
    #[must_use]
    pub fn with_arity(mut self, arity: StageArity) -> Self {
        self.arity = arity;
        self
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(&Item) -> anyhow::Result<Vec<Item>> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(&Item) -> anyhow::Result<Vec<Item>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> StageArity {
        self.arity
    }

    async fn execute(&self, item: &Item) -> Result<Vec<Item>, StageError> {
        (self.func)(item).map_err(|e| StageError::new(&self.name, format!("{e:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn fn_stage_derives_output() {
        let stage = FnStage::new("upper", |item: &Item| {
            let text = item.payload().as_str().unwrap_or_default().to_uppercase();
            Ok(vec![item.derive(json!(text), "upper")])
        });

        assert_eq!(stage.name(), "upper");
        assert_eq!(stage.arity(), StageArity::OneToOne);

        let outputs = stage.execute(&Item::new(json!("hi"))).await.unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].payload(), &json!("HI"));
        assert_eq!(outputs[0].history(), ["upper"]);
    }

    #[tokio::test]
    async fn fn_stage_failure_names_the_stage() {
        let stage = FnStage::new("parse", |_item: &Item| anyhow::bail!("bad input"));

        let err = stage.execute(&Item::new(json!(null))).await.unwrap_err();
        assert_eq!(err.stage, "parse");
        assert!(err.message.contains("bad input"));
    }

    #[tokio::test]
    async fn fn_stage_arity_override() {
        let stage =
            FnStage::new("drain", |_item: &Item| Ok(Vec::new())).with_arity(StageArity::Sink);

        assert_eq!(stage.arity(), StageArity::Sink);
        let outputs = stage.execute(&Item::new(json!("x"))).await.unwrap();
        assert!(outputs.is_empty());
    }
}
