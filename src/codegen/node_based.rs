//! NodeBased rendering: a platform-agnostic node/edge document.
//!
//! Schema: `{ nodes: [{id, kind, label, attributes}], edges: [{from, to}] }`.
//! Nodes appear in id order, edges in declaration order.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::extract::EntityKind;
use crate::graph::{Edge, NodeId, WorkflowGraph};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeBasedDocument<'g> {
    pub nodes: Vec<NodeEntry<'g>>,
    pub edges: &'g [Edge],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeEntry<'g> {
    pub id: NodeId,
    pub kind: EntityKind,
    pub label: &'g str,
    pub attributes: &'g BTreeMap<String, String>,
}

pub fn render(graph: &WorkflowGraph) -> NodeBasedDocument<'_> {
    NodeBasedDocument {
        nodes: graph
            .nodes()
            .map(|node| NodeEntry {
                id: node.id,
                kind: node.kind(),
                label: node.label(),
                attributes: &node.entity.attributes,
            })
            .collect(),
        edges: graph.edges(),
    }
}
