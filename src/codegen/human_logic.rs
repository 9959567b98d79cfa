//! HumanLogic rendering: a one-line trace in topological order, followed by a
//! numbered step listing with attributes.

use super::writer::TextWriter;
use crate::graph::{NodeId, WorkflowGraph, WorkflowNode};

pub fn render(graph: &WorkflowGraph, order: &[NodeId]) -> String {
    let nodes: Vec<&WorkflowNode> = order.iter().filter_map(|id| graph.node(*id)).collect();
    let mut w = TextWriter::new();

    let trace: Vec<String> = nodes.iter().map(|n| describe(n)).collect();
    w.line(&trace.join(" → "));
    w.blank();

    for (position, node) in nodes.iter().enumerate() {
        w.line(&format!("{}. {} [{}]", position + 1, describe(node), node.id));
        w.indent();
        for (key, value) in &node.entity.attributes {
            w.line(&format!("{key}: {value}"));
        }
        w.dedent();
    }

    w.finish()
}

fn describe(node: &WorkflowNode) -> String {
    format!("{}: {}", node.kind(), node.label())
}
