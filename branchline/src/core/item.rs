//! Items and correlation identifiers.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// Trace key linking a branch to its originating submission and split path.
///
/// Correlation ids are path-shaped: a root key (a UUID unless the submitter
/// chose one) with one `/index` segment appended per fan-out, e.g. `root`,
/// `root/0`, `root/0/2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Creates a correlation id from an explicit root key.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self(root.into())
    }

    /// Creates a correlation id with a generated root key.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Derives the child id for the fan-out branch at `index`.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        Self(format!("{}/{index}", self.0))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `self` is `other` or a fan-out descendant of it.
    #[must_use]
    pub fn is_within(&self, other: &Self) -> bool {
        match self.0.strip_prefix(&other.0) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for CorrelationId {
    /// Componentwise order. Numeric segments compare numerically, so `p/2`
    /// sorts before `p/10` and reporting order matches input order.
    fn cmp(&self, other: &Self) -> Ordering {
        let mut left = self.components();
        let mut right = other.components();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(a), Some(b)) => {
                    let ordering = match (a.parse::<u64>(), b.parse::<u64>()) {
                        (Ok(m), Ok(n)) => m.cmp(&n),
                        _ => a.cmp(b),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
            }
        }
    }
}

impl PartialOrd for CorrelationId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An opaque payload value flowing between stages.
///
/// Items are immutable once produced: stages receive `&Item` and build their
/// outputs through [`Item::derive`] and [`Item::child`], which thread the
/// correlation id and the stage history forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    payload: serde_json::Value,
    correlation_id: CorrelationId,
    history: Vec<String>,
}

impl Item {
    /// Creates a root item with a generated correlation id.
    #[must_use]
    pub fn new(payload: serde_json::Value) -> Self {
        Self::with_correlation(payload, CorrelationId::generate())
    }

    /// Creates a root item with an explicit correlation id.
    #[must_use]
    pub fn with_correlation(payload: serde_json::Value, correlation_id: CorrelationId) -> Self {
        Self {
            payload,
            correlation_id,
            history: Vec::new(),
        }
    }

    /// The payload.
    #[must_use]
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// The correlation id.
    #[must_use]
    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Names of the stages this item has passed through, oldest first.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Produces the successor item for a one-to-one stage: same correlation
    /// id, history extended with `stage`.
    #[must_use]
    pub fn derive(&self, payload: serde_json::Value, stage: &str) -> Self {
        let mut history = self.history.clone();
        history.push(stage.to_string());
        Self {
            payload,
            correlation_id: self.correlation_id.clone(),
            history,
        }
    }

    /// Produces the fan-out child at `index`: correlation `parent/index`,
    /// history extended with `stage`.
    #[must_use]
    pub fn child(&self, payload: serde_json::Value, index: usize, stage: &str) -> Self {
        let mut history = self.history.clone();
        history.push(stage.to_string());
        Self {
            payload,
            correlation_id: self.correlation_id.child(index),
            history,
        }
    }

    /// Stamps `stage` into the history unless it is already the newest entry.
    pub(crate) fn ensure_history(&mut self, stage: &str) {
        if self.history.last().map(String::as_str) != Some(stage) {
            self.history.push(stage.to_string());
        }
    }

    pub(crate) fn set_correlation(&mut self, correlation_id: CorrelationId) {
        self.correlation_id = correlation_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn derive_keeps_correlation_and_extends_history() {
        let root = Item::with_correlation(json!("a"), CorrelationId::new("root"));
        let next = root.derive(json!("b"), "first");

        assert_eq!(next.correlation_id(), root.correlation_id());
        assert_eq!(next.history(), ["first"]);
        assert_eq!(next.payload(), &json!("b"));
        // The source item is untouched.
        assert!(root.history().is_empty());
    }

    #[test]
    fn child_derives_indexed_correlation() {
        let root = Item::with_correlation(json!(["x", "y"]), CorrelationId::new("root"));
        let second = root.child(json!("y"), 1, "split");

        assert_eq!(second.correlation_id().as_str(), "root/1");
        assert_eq!(second.history(), ["split"]);
    }

    #[test]
    fn correlation_order_is_numeric_aware() {
        let parent = CorrelationId::new("p");
        let two = parent.child(2);
        let ten = parent.child(10);

        assert!(two < ten);
        assert!(parent < two);

        let mut ids = vec![ten.clone(), parent.clone(), two.clone()];
        ids.sort();
        assert_eq!(ids, vec![parent, two, ten]);
    }

    #[test]
    fn is_within_matches_descendants_only() {
        let root = CorrelationId::new("page");
        assert!(root.is_within(&root));
        assert!(root.child(0).is_within(&root));
        assert!(root.child(0).child(3).is_within(&root));
        assert!(!CorrelationId::new("pagex").is_within(&root));
        assert!(!root.is_within(&root.child(0)));
    }

    #[test]
    fn item_serialization_round_trips() {
        let item = Item::with_correlation(json!({"k": 1}), CorrelationId::new("root"))
            .derive(json!({"k": 2}), "s1");
        let encoded = serde_json::to_string(&item).unwrap();
        let decoded: Item = serde_json::from_str(&encoded).unwrap();

        assert_eq!(item, decoded);
    }
}
