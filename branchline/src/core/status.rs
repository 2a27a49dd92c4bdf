//! Branch status and stage arity enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The execution state of a branch.
///
/// A branch moves `Pending -> Running` and ends in exactly one of the
/// terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchStatus {
    /// Branch has been created but not started.
    Pending,
    /// Branch is executing stages.
    Running,
    /// Branch reached the last stage and retained output.
    Completed,
    /// A stage legitimately produced zero retained outputs (sink, empty
    /// filter, or outputs forwarded to another pipeline).
    Empty,
    /// A stage failed; only this branch terminated.
    Failed,
    /// The submission was cancelled while this branch was in flight.
    Cancelled,
}

impl Default for BranchStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for BranchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Empty => write!(f, "empty"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl BranchStatus {
    /// Returns true if the status is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Empty | Self::Failed | Self::Cancelled
        )
    }

    /// Returns true if the branch ended without error. Cancellation is not
    /// counted as a success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::Empty)
    }

    /// Returns true if the branch ended in error. Cancellation is not
    /// counted as a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Declared output cardinality of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageArity {
    /// Transforms one item into one item.
    OneToOne,
    /// Fans one item out into any number of items (e.g. a splitter).
    OneToMany,
    /// Consumes the item and emits nothing.
    Sink,
}

impl Default for StageArity {
    fn default() -> Self {
        Self::OneToOne
    }
}

impl fmt::Display for StageArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneToOne => write!(f, "one-to-one"),
            Self::OneToMany => write!(f, "one-to-many"),
            Self::Sink => write!(f, "sink"),
        }
    }
}

impl StageArity {
    /// Whether an observed output count is consistent with the declaration.
    ///
    /// A one-to-one stage may still produce zero items (an empty filter).
    #[must_use]
    pub fn admits(&self, produced: usize) -> bool {
        match self {
            Self::OneToOne => produced <= 1,
            Self::OneToMany => true,
            Self::Sink => produced == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_status_display() {
        assert_eq!(BranchStatus::Completed.to_string(), "completed");
        assert_eq!(BranchStatus::Empty.to_string(), "empty");
        assert_eq!(BranchStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn branch_status_classification() {
        assert!(BranchStatus::Completed.is_terminal());
        assert!(BranchStatus::Empty.is_success());
        assert!(!BranchStatus::Running.is_terminal());

        assert!(BranchStatus::Failed.is_failure());
        assert!(!BranchStatus::Cancelled.is_failure());
        assert!(!BranchStatus::Cancelled.is_success());
    }

    #[test]
    fn branch_status_serialize() {
        let json = serde_json::to_string(&BranchStatus::Empty).unwrap();
        assert_eq!(json, r#""empty""#);

        let decoded: BranchStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, BranchStatus::Empty);
    }

    #[test]
    fn arity_admits_observed_counts() {
        assert!(StageArity::OneToOne.admits(1));
        assert!(StageArity::OneToOne.admits(0));
        assert!(!StageArity::OneToOne.admits(2));
        assert!(StageArity::OneToMany.admits(17));
        assert!(StageArity::Sink.admits(0));
        assert!(!StageArity::Sink.admits(1));
    }
}
