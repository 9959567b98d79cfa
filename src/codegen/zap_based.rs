//! ZapBased rendering: a flat step list for platforms without branching.
//!
//! Conditions do not become steps. Each Action carries every condition
//! upstream of it, including those inherited through earlier actions, as a
//! single `conditionExpression` evaluated by the target platform at runtime.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::extract::EntityKind;
use crate::graph::{NodeId, WorkflowGraph, WorkflowNode};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZapDocument {
    pub steps: Vec<ZapStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZapStep {
    #[serde(rename = "type")]
    pub step_type: EntityKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,
}

pub fn render(graph: &WorkflowGraph, order: &[NodeId]) -> ZapDocument {
    let steps = order
        .iter()
        .filter_map(|id| graph.node(*id))
        .filter(|node| node.kind() != EntityKind::Condition)
        .map(|node| ZapStep {
            step_type: node.kind(),
            label: node.label().to_string(),
            condition_expression: condition_expression(graph, node),
        })
        .collect();
    ZapDocument { steps }
}

/// Conditions guarding `node`, joined with `&&` in id order.
fn condition_expression(graph: &WorkflowGraph, node: &WorkflowNode) -> Option<String> {
    if node.kind() != EntityKind::Action {
        return None;
    }
    let guards = guards_of(graph, node);
    if guards.is_empty() {
        return None;
    }
    let parts: Vec<String> = guards
        .into_iter()
        .filter_map(|id| graph.node(id))
        .map(expression_for)
        .collect();
    Some(parts.join(" && "))
}

/// Every condition upstream of `node`. The walk passes through earlier
/// actions and stops at triggers.
fn guards_of(graph: &WorkflowGraph, node: &WorkflowNode) -> BTreeSet<NodeId> {
    let mut guards = BTreeSet::new();
    let mut visited = BTreeSet::new();
    let mut stack: Vec<NodeId> = node.incoming.iter().copied().collect();
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Some(upstream) = graph.node(id) else { continue };
        match upstream.kind() {
            EntityKind::Trigger => {}
            EntityKind::Condition => {
                guards.insert(id);
                stack.extend(upstream.incoming.iter().copied());
            }
            EntityKind::Action => stack.extend(upstream.incoming.iter().copied()),
        }
    }
    guards
}

fn expression_for(condition: &WorkflowNode) -> String {
    let entity = &condition.entity;
    match (
        entity.attribute("subject"),
        entity.attribute("operator"),
        entity.attribute("value"),
    ) {
        (Some(subject), Some(operator), Some(value)) => format!("{subject} {operator} {value}"),
        _ => condition.label().to_string(),
    }
}
