use std::fmt;

use crate::graph::{VertexId, VertexKind};

/// Structural rules every validated pedigree graph satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    PersonSingleProducingPregnancy,
    PersonOutEdgesToRelationships,
    RelationshipHasChildhub,
    RelationshipSingleOutEdge,
    RelationshipOutEdgeToChildhub,
    RelationshipTwoPartners,
    ChildhubHasChildren,
    ChildhubOutEdgesToPersons,
    ChildhubSingleRelationship,
    VirtualSingleInEdge,
    VirtualSingleOutEdge,
    Acyclic,
    Connected,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Rule::PersonSingleProducingPregnancy => {
                "a person is produced by at most one pregnancy"
            }
            Rule::PersonOutEdgesToRelationships => "a person only connects down to relationships",
            Rule::RelationshipHasChildhub => "every relationship has a childhub",
            Rule::RelationshipSingleOutEdge => "a relationship has exactly one out-edge",
            Rule::RelationshipOutEdgeToChildhub => "a relationship only connects to a childhub",
            Rule::RelationshipTwoPartners => "a relationship has exactly two partners",
            Rule::ChildhubHasChildren => "every childhub has at least one child",
            Rule::ChildhubOutEdgesToPersons => "a childhub only connects to persons",
            Rule::ChildhubSingleRelationship => "a childhub belongs to exactly one relationship",
            Rule::VirtualSingleInEdge => "a virtual vertex has exactly one in-edge",
            Rule::VirtualSingleOutEdge => "a virtual vertex has exactly one out-edge",
            Rule::Acyclic => "a pedigree has no cycles",
            Rule::Connected => "a pedigree is connected",
        };
        f.write_str(message)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("structural invariant violated: {rule} (vertex {vertex})")]
    StructuralInvariant { rule: Rule, vertex: String },
    #[error("edge {from} -> {to} already exists")]
    DuplicateEdge { from: VertexId, to: VertexId },
    #[error("no edge {from} -> {to}")]
    MissingEdge { from: VertexId, to: VertexId },
    #[error("invalid vertex id {0}")]
    InvalidId(VertexId),
    #[error("vertex {vertex} is a {found}, expected a {expected}")]
    UnexpectedKind {
        vertex: VertexId,
        expected: VertexKind,
        found: VertexKind,
    },
    #[error("{a} and {b} cannot become partners")]
    IncompatiblePartners { a: VertexId, b: VertexId },
    #[error("{parent} cannot become a parent of {child}")]
    IllegalParent { parent: VertexId, child: VertexId },
}

impl GraphError {
    pub(crate) fn invariant(rule: Rule, vertex: impl Into<String>) -> Self {
        GraphError::StructuralInvariant {
            rule,
            vertex: vertex.into(),
        }
    }

    pub fn rule(&self) -> Option<Rule> {
        match self {
            GraphError::StructuralInvariant { rule, .. } => Some(*rule),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptimizerError {
    #[error("min levels length {found} does not match edge count {expected}")]
    MinLevelsMismatch { expected: usize, found: usize },
    #[error("levels length {found} does not match edge count {expected}")]
    LevelsMismatch { expected: usize, found: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Optimizer(#[from] OptimizerError),
    #[error("invalid pedigree JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
