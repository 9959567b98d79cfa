//! Individual validation rules.

use std::collections::BTreeSet;

use super::{Diagnostic, DiagnosticCode};
use crate::extract::EntityKind;
use crate::graph::{NodeId, WorkflowGraph, WorkflowNode};

/// Run every rule. Graph-level rules first, then node rules per node.
pub fn run_all(graph: &WorkflowGraph, confidence_threshold: f32) -> Vec<Diagnostic> {
    let mut out = Vec::new();

    no_trigger(graph, &mut out);

    let reachable = graph.reachable_from_triggers();
    for node in graph.nodes() {
        idle_trigger(node, &mut out);
        unreachable_action(node, &reachable, &mut out);
        dangling_condition(graph, node, &mut out);
        branching_condition(node, &mut out);
        ambiguous_classification(node, confidence_threshold, &mut out);
    }

    out
}

fn no_trigger(graph: &WorkflowGraph, out: &mut Vec<Diagnostic>) {
    if graph.triggers().next().is_none() {
        out.push(Diagnostic::new(
            DiagnosticCode::NoTrigger,
            "Workflow has no trigger; describe the event that starts it (e.g. \"when a form is submitted\")",
            None,
        ));
    }
}

fn idle_trigger(node: &WorkflowNode, out: &mut Vec<Diagnostic>) {
    if node.kind() == EntityKind::Trigger && node.outgoing.is_empty() {
        out.push(Diagnostic::new(
            DiagnosticCode::IdleTrigger,
            format!("Trigger '{}' starts nothing", node.label()),
            Some(node.id),
        ));
    }
}

fn unreachable_action(node: &WorkflowNode, reachable: &BTreeSet<NodeId>, out: &mut Vec<Diagnostic>) {
    if node.kind() == EntityKind::Action && !reachable.contains(&node.id) {
        out.push(Diagnostic::new(
            DiagnosticCode::UnreachableAction,
            format!("Action '{}' is not reachable from any trigger", node.label()),
            Some(node.id),
        ));
    }
}

fn dangling_condition(graph: &WorkflowGraph, node: &WorkflowNode, out: &mut Vec<Diagnostic>) {
    if node.kind() != EntityKind::Condition {
        return;
    }
    let guards_action = graph
        .descendants(node.id)
        .into_iter()
        .filter_map(|id| graph.node(id))
        .any(|n| n.kind() == EntityKind::Action);
    if !guards_action {
        out.push(Diagnostic::new(
            DiagnosticCode::DanglingCondition,
            format!("Condition '{}' does not guard any action", node.label()),
            Some(node.id),
        ));
    }
}

/// A condition guards exactly one branch.
fn branching_condition(node: &WorkflowNode, out: &mut Vec<Diagnostic>) {
    if node.kind() == EntityKind::Condition && node.outgoing.len() > 1 {
        let targets: Vec<String> = node.outgoing.iter().map(|id| format!("'{id}'")).collect();
        out.push(Diagnostic::new(
            DiagnosticCode::BranchingCondition,
            format!(
                "Condition '{}' guards {} branches ({}); split it into one condition per branch",
                node.label(),
                node.outgoing.len(),
                targets.join(", ")
            ),
            Some(node.id),
        ));
    }
}

fn ambiguous_classification(node: &WorkflowNode, threshold: f32, out: &mut Vec<Diagnostic>) {
    let confidence = node.entity.confidence;
    if confidence < threshold {
        out.push(Diagnostic::new(
            DiagnosticCode::AmbiguousClassification,
            format!(
                "'{}' was classified as {} with low confidence ({:.2})",
                node.label(),
                node.kind(),
                confidence
            ),
            Some(node.id),
        ));
    }
}
