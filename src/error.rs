//! Error types for every pipeline phase.
//!
//! Extraction and graph errors abort the pipeline. Validator findings are not
//! errors; they live in [`crate::validate::ValidationReport`].

use thiserror::Error;

use crate::graph::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Extract,
    Build,
    Validate,
    Compile,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Extract => write!(f, "Extract"),
            Phase::Build => write!(f, "Build"),
            Phase::Validate => write!(f, "Validate"),
            Phase::Compile => write!(f, "Compile"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Input text is empty and no attachments were provided")]
    EmptyInput,

    #[error("Attachment '{name}' is {byte_size} bytes, above the {limit} byte limit")]
    AttachmentTooLarge {
        name: String,
        byte_size: u64,
        limit: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Cycle detected between nodes {}", join_ids(.involved))]
    CycleDetected { involved: Vec<NodeId> },

    #[error("Node '{node_id}' refers to step '{step}', which does not exist")]
    UnknownStep { node_id: NodeId, step: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("Graph violates compiler invariants: {reason}")]
    InvalidGraph {
        reason: String,
        node_id: Option<NodeId>,
    },

    #[error("Failed to serialize {format} rendering: {reason}")]
    Serialization { format: String, reason: String },
}

/// Any failure that aborts the design pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DesignError {
    #[error("[{}:{}] {}", Phase::Extract, .0.code(), .0)]
    Extraction(#[from] ExtractionError),

    #[error("[{}:{}] {}", Phase::Build, .0.code(), .0)]
    Graph(#[from] GraphError),

    #[error("[{}:{}] {}", Phase::Compile, .0.code(), .0)]
    Compile(#[from] CompileError),
}

impl ExtractionError {
    pub fn code(&self) -> &'static str {
        match self {
            ExtractionError::EmptyInput => "EmptyInput",
            ExtractionError::AttachmentTooLarge { .. } => "AttachmentTooLarge",
        }
    }
}

impl GraphError {
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::CycleDetected { .. } => "CycleDetected",
            GraphError::UnknownStep { .. } => "UnknownStep",
        }
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        match self {
            GraphError::CycleDetected { involved } => involved.clone(),
            GraphError::UnknownStep { node_id, .. } => vec![*node_id],
        }
    }
}

impl CompileError {
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::InvalidGraph { .. } => "InvalidGraph",
            CompileError::Serialization { .. } => "Serialization",
        }
    }
}

impl DesignError {
    pub fn phase(&self) -> Phase {
        match self {
            DesignError::Extraction(_) => Phase::Extract,
            DesignError::Graph(_) => Phase::Build,
            DesignError::Compile(_) => Phase::Compile,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DesignError::Extraction(e) => e.code(),
            DesignError::Graph(e) => e.code(),
            DesignError::Compile(e) => e.code(),
        }
    }

    /// Nodes the failure refers to, in id order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        match self {
            DesignError::Extraction(_) => Vec::new(),
            DesignError::Graph(e) => e.node_ids(),
            DesignError::Compile(CompileError::InvalidGraph { node_id, .. }) => {
                node_id.iter().copied().collect()
            }
            DesignError::Compile(CompileError::Serialization { .. }) => Vec::new(),
        }
    }
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(|id| format!("'{id}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_names_every_node() {
        let err = GraphError::CycleDetected {
            involved: vec![NodeId::new(1), NodeId::new(2)],
        };
        assert_eq!(err.to_string(), "Cycle detected between nodes 'n1', 'n2'");
    }

    #[test]
    fn design_error_display_carries_phase_and_code() {
        let err = DesignError::from(ExtractionError::EmptyInput);
        assert_eq!(
            err.to_string(),
            "[Extract:EmptyInput] Input text is empty and no attachments were provided"
        );
        assert_eq!(err.phase(), Phase::Extract);
        assert!(err.node_ids().is_empty());
    }
}
