use crate::error::{LineageError, LineageResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Core types for the lineage tracker

/// Dense node identifier, equal to the insertion position of the individual
pub type NodeId = usize;

/// One candidate solution: a required fitness plus an open-ended payload
/// (genome, generation number, anything the algorithm wants to carry along).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub fitness: f64,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Individual {
    pub fn new(fitness: f64) -> Self {
        Self {
            fitness,
            details: Map::new(),
        }
    }

    /// Attach an extra payload field
    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    /// Build an individual from a mapping-like JSON record.
    ///
    /// The record must be an object with a numeric `fitness` field; every
    /// other field is carried through unchanged.
    pub fn from_value(value: Value) -> LineageResult<Self> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(LineageError::InvalidRecord {
                    reason: format!("expected a mapping, got {}", other),
                })
            }
        };

        let fitness = fields
            .remove("fitness")
            .ok_or_else(|| LineageError::InvalidRecord {
                reason: "missing 'fitness' field".to_string(),
            })?;

        let fitness = fitness.as_f64().ok_or_else(|| LineageError::InvalidRecord {
            reason: format!("'fitness' is not numeric: {}", fitness),
        })?;

        Ok(Self {
            fitness,
            details: fields,
        })
    }
}

/// How a child was derived from a parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Crossover,
    Mutation,
    Generic,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Crossover => "crossover",
            EdgeKind::Mutation => "mutation",
            EdgeKind::Generic => "generic",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node weight stored in the lineage graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageNode {
    pub id: NodeId,
    pub fitness: f64,
    pub details: Individual,
    /// Explicit generation, when the caller supplied one
    pub generation: Option<u64>,
    pub mutation: Option<Value>,
}

/// Edge weight stored in the lineage graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEdge {
    pub kind: EdgeKind,
}

/// Plain node data handed to renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    pub fitness: f64,
    pub generation: u64,
    pub mutation: Option<Value>,
}

/// Plain edge data handed to renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeView {
    pub parent: NodeId,
    pub child: NodeId,
    pub kind: EdgeKind,
}

/// Average fitness of one generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationFitness {
    pub generation: u64,
    pub average_fitness: f64,
    pub individuals: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_individual_from_value_keeps_payload() {
        let individual = Individual::from_value(json!({
            "fitness": 1.5,
            "genome": [1, 0, 1],
            "generation": 3
        }))
        .unwrap();

        assert_eq!(individual.fitness, 1.5);
        assert_eq!(individual.detail("genome"), Some(&json!([1, 0, 1])));
        assert_eq!(individual.detail("generation"), Some(&json!(3)));
        assert!(individual.detail("fitness").is_none());
    }

    #[test]
    fn test_individual_from_value_requires_fitness() {
        let missing = Individual::from_value(json!({ "genome": [] }));
        assert!(matches!(missing, Err(LineageError::InvalidRecord { .. })));

        let not_numeric = Individual::from_value(json!({ "fitness": "high" }));
        assert!(matches!(not_numeric, Err(LineageError::InvalidRecord { .. })));

        let not_mapping = Individual::from_value(json!([1.0]));
        assert!(matches!(not_mapping, Err(LineageError::InvalidRecord { .. })));
    }

    #[test]
    fn test_individual_serializes_flat() {
        let individual = Individual::new(2.0).with_detail("genome", json!("abc"));
        let value = serde_json::to_value(&individual).unwrap();
        assert_eq!(value, json!({ "fitness": 2.0, "genome": "abc" }));
    }

    #[test]
    fn test_edge_kind_names() {
        assert_eq!(EdgeKind::Crossover.to_string(), "crossover");
        assert_eq!(
            serde_json::to_value(EdgeKind::Mutation).unwrap(),
            json!("mutation")
        );
    }
}
