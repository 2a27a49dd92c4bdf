//! Item-level fan-out.

use super::Stage;
use crate::core::{Item, StageArity};
use crate::errors::StageError;
use async_trait::async_trait;

/// Fans one sequence-valued item out into independent per-element items.
///
/// The payload must be a JSON array; anything else is a stage failure. Each
/// element becomes a child item with correlation `parent/index` and the
/// parent's history extended by this stage's name, preserving element order.
/// An empty array produces zero children, which is not an error.
#[derive(Debug, Clone)]
pub struct SplitStage {
    name: String,
}

impl SplitStage {
    /// Creates a splitter.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Stage for SplitStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> StageArity {
        StageArity::OneToMany
    }

    async fn execute(&self, item: &Item) -> Result<Vec<Item>, StageError> {
        let elements = item
            .payload()
            .as_array()
            .ok_or_else(|| StageError::new(&self.name, "payload is not a sequence"))?;

        Ok(elements
            .iter()
            .enumerate()
            .map(|(index, value)| item.child(value.clone(), index, &self.name))
            .collect())
    }
}
