//! Structured models produced by extraction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Serialization formats an extractor may be asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RdfFormat {
    /// Whatever the extractor considers its native output.
    Default,
    /// JSON-LD.
    JsonLd,
    /// Turtle.
    Turtle,
    /// N-Triples.
    NTriples,
}

impl Default for RdfFormat {
    fn default() -> Self {
        Self::Default
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::JsonLd => write!(f, "json-ld"),
            Self::Turtle => write!(f, "turtle"),
            Self::NTriples => write!(f, "n-triples"),
        }
    }
}

/// A single extracted statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Subject IRI or node key.
    pub subject: String,
    /// Predicate / property IRI.
    pub predicate: String,
    /// Object value, rendered as a string.
    pub object: String,
}

/// An opaque bag of extracted statements.
///
/// Carries no RDF semantics of its own: it is a queryable data carrier that
/// serializes cleanly, so it can ride in an item payload between stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredModel {
    /// Format the statements were extracted as.
    pub format: RdfFormat,
    /// The statements, in extraction order.
    pub statements: Vec<Statement>,
}

impl StructuredModel {
    /// Creates an empty model in the given format.
    #[must_use]
    pub fn new(format: RdfFormat) -> Self {
        Self {
            format,
            statements: Vec::new(),
        }
    }

    /// Appends a statement.
    pub fn push(
        &mut self,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) {
        self.statements.push(Statement {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        });
    }

    /// Builder-style append.
    #[must_use]
    pub fn with_statement(
        mut self,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        self.push(subject, predicate, object);
        self
    }

    /// Number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Returns true if the model holds no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Distinct object values of statements with the given predicate, in
    /// first-seen order.
    #[must_use]
    pub fn objects_of(&self, predicate: &str) -> Vec<String> {
        let mut values: Vec<String> = Vec::new();
        for statement in &self.statements {
            if statement.predicate == predicate && !values.contains(&statement.object) {
                values.push(statement.object.clone());
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_of_deduplicates_preserving_order() {
        let model = StructuredModel::new(RdfFormat::Default)
            .with_statement("s", "leader", "b")
            .with_statement("s", "leader", "a")
            .with_statement("s", "leader", "b")
            .with_statement("s", "other", "c");

        assert_eq!(model.objects_of("leader"), ["b", "a"]);
        assert!(model.objects_of("missing").is_empty());
        assert_eq!(model.len(), 4);
    }

    #[test]
    fn model_serialization_round_trips() {
        let model = StructuredModel::new(RdfFormat::JsonLd).with_statement("s", "p", "o");
        let value = serde_json::to_value(&model).unwrap();
        let decoded: StructuredModel = serde_json::from_value(value).unwrap();

        assert_eq!(model, decoded);
        assert_eq!(decoded.format, RdfFormat::JsonLd);
    }

    #[test]
    fn format_display() {
        assert_eq!(RdfFormat::JsonLd.to_string(), "json-ld");
        assert_eq!(RdfFormat::Default.to_string(), "default");
    }
}
