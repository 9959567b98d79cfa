//! Graph construction from an ordered entity list.
//!
//! Default wiring, in declaration order:
//! - a Trigger feeds the next Condition or Action;
//! - a Condition feeds the next Action (or the next Condition, which chains);
//! - Actions chain one after another until a new Trigger resets the chain,
//!   which also closes any Condition still waiting for an Action;
//! - a Condition seen before any feeder is hoisted under the next Trigger.
//!
//! Explicit `gotoStep` attributes add back-edges once every node exists.

use tracing::debug;

use super::{NodeId, WorkflowGraph};
use crate::error::GraphError;
use crate::extract::{Entity, EntityKind, GOTO_STEP_ATTRIBUTE};

/// Build a workflow graph, rejecting cycles.
///
/// Actions with no path from a trigger do not fail the build; they are kept
/// and listed in [`WorkflowGraph::orphans`] for the validator.
pub fn build(entities: &[Entity]) -> Result<WorkflowGraph, GraphError> {
    let mut graph = WorkflowGraph::new();
    let mut wiring = Wiring::default();
    let mut jumps = Vec::new();

    for entity in entities {
        let id = graph.add_node(entity.clone());
        match entity.kind {
            EntityKind::Trigger => wiring.trigger(&mut graph, id),
            EntityKind::Condition => wiring.condition(&mut graph, id),
            EntityKind::Action => wiring.action(&mut graph, id),
        }
        if let Some(step) = entity.attribute(GOTO_STEP_ATTRIBUTE) {
            jumps.push((id, step.trim()));
        }
    }

    for (from, step) in jumps {
        let target = step
            .parse::<u32>()
            .ok()
            .filter(|&n| n >= 1 && n as usize <= entities.len())
            .ok_or_else(|| GraphError::UnknownStep {
                node_id: from,
                step: step.to_string(),
            })?;
        graph.add_edge(from, NodeId::new(target));
    }

    let mut involved: Vec<NodeId> = graph.cycles().into_iter().flatten().collect();
    if !involved.is_empty() {
        involved.sort();
        involved.dedup();
        debug!(nodes = ?involved, "cycle rejected");
        return Err(GraphError::CycleDetected { involved });
    }

    let reachable = graph.reachable_from_triggers();
    let orphans: Vec<NodeId> = graph
        .nodes_of_kind(EntityKind::Action)
        .map(|n| n.id)
        .filter(|id| !reachable.contains(id))
        .collect();
    if !orphans.is_empty() {
        debug!(orphans = ?orphans, "actions unreachable from any trigger");
    }
    graph.set_orphans(orphans);

    debug!(nodes = graph.len(), edges = graph.edges().len(), "graph built");
    Ok(graph)
}

#[derive(Debug, Default)]
struct Wiring {
    /// Triggers waiting for the next Condition or Action.
    pending_triggers: Vec<NodeId>,
    /// Tail of the current condition chain, waiting for an Action.
    open_conditions: Vec<NodeId>,
    /// Conditions nothing feeds yet.
    floating_conditions: Vec<NodeId>,
    last_action: Option<NodeId>,
}

impl Wiring {
    fn trigger(&mut self, graph: &mut WorkflowGraph, id: NodeId) {
        self.last_action = None;
        if self.floating_conditions.is_empty() {
            // Conditions opened under an earlier trigger never guard this one.
            self.open_conditions.clear();
            self.pending_triggers.push(id);
        } else {
            for condition in self.floating_conditions.drain(..) {
                graph.add_edge(id, condition);
            }
        }
    }

    fn condition(&mut self, graph: &mut WorkflowGraph, id: NodeId) {
        if !self.pending_triggers.is_empty() {
            for trigger in self.pending_triggers.drain(..) {
                graph.add_edge(trigger, id);
            }
        } else if !self.open_conditions.is_empty() {
            for condition in self.open_conditions.drain(..) {
                graph.add_edge(condition, id);
            }
        } else if let Some(action) = self.last_action {
            graph.add_edge(action, id);
        } else {
            self.floating_conditions.push(id);
        }
        self.open_conditions.push(id);
    }

    fn action(&mut self, graph: &mut WorkflowGraph, id: NodeId) {
        let feeders: Vec<NodeId> = self
            .pending_triggers
            .drain(..)
            .chain(self.open_conditions.drain(..))
            .collect();
        self.floating_conditions.clear();

        if feeders.is_empty() {
            if let Some(previous) = self.last_action {
                graph.add_edge(previous, id);
            }
        } else {
            for feeder in feeders {
                graph.add_edge(feeder, id);
            }
        }
        self.last_action = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;

    fn n(i: u32) -> NodeId {
        NodeId::new(i)
    }

    fn edges(graph: &WorkflowGraph) -> Vec<(u32, u32)> {
        graph
            .edges()
            .iter()
            .map(|Edge { from, to }| (from.index(), to.index()))
            .collect()
    }

    #[test]
    fn trigger_feeds_action() {
        let graph = build(&[Entity::trigger("new email"), Entity::action("send slack")]).unwrap();
        assert_eq!(edges(&graph), vec![(1, 2)]);
        assert!(graph.orphans().is_empty());
    }

    #[test]
    fn actions_chain_until_new_trigger() {
        let graph = build(&[
            Entity::trigger("t1"),
            Entity::action("a1"),
            Entity::action("a2"),
            Entity::trigger("t2"),
            Entity::action("a3"),
        ])
        .unwrap();
        assert_eq!(edges(&graph), vec![(1, 2), (2, 3), (4, 5)]);
    }

    #[test]
    fn condition_guards_next_action() {
        let graph = build(&[
            Entity::trigger("t"),
            Entity::action("a1"),
            Entity::condition("c"),
            Entity::action("a2"),
        ])
        .unwrap();
        assert_eq!(edges(&graph), vec![(1, 2), (2, 3), (3, 4)]);
    }

    #[test]
    fn leading_condition_is_hoisted_under_trigger() {
        let graph = build(&[
            Entity::condition("amount is over 100"),
            Entity::trigger("payment received"),
            Entity::action("notify finance"),
        ])
        .unwrap();
        assert_eq!(edges(&graph), vec![(2, 1), (1, 3)]);
    }

    #[test]
    fn conditions_chain() {
        let graph = build(&[
            Entity::trigger("t"),
            Entity::condition("c1"),
            Entity::condition("c2"),
            Entity::action("a"),
        ])
        .unwrap();
        assert_eq!(edges(&graph), vec![(1, 2), (2, 3), (3, 4)]);
    }

    #[test]
    fn actions_without_trigger_are_orphans() {
        let graph = build(&[Entity::action("a1"), Entity::action("a2")]).unwrap();
        assert_eq!(graph.orphans(), &[n(1), n(2)]);
    }

    #[test]
    fn back_reference_cycle_names_both_nodes() {
        let err = build(&[
            Entity::action("send a Slack message"),
            Entity::action("create a ticket").with_attribute(GOTO_STEP_ATTRIBUTE, "1"),
        ])
        .unwrap_err();
        assert_eq!(err, GraphError::CycleDetected { involved: vec![n(1), n(2)] });
    }

    #[test]
    fn forward_reference_is_allowed() {
        let graph = build(&[
            Entity::trigger("t").with_attribute(GOTO_STEP_ATTRIBUTE, "3"),
            Entity::action("a1"),
            Entity::action("a2"),
        ])
        .unwrap();
        assert_eq!(edges(&graph), vec![(1, 2), (2, 3), (1, 3)]);
    }

    #[test]
    fn unknown_step_is_rejected() {
        let err = build(&[Entity::action("a").with_attribute(GOTO_STEP_ATTRIBUTE, "7")]).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownStep {
                node_id: n(1),
                step: "7".into()
            }
        );
    }

    #[test]
    fn oversized_step_keeps_its_text() {
        let err = build(&[
            Entity::trigger("t"),
            Entity::action("a").with_attribute(GOTO_STEP_ATTRIBUTE, "99999999999999999999"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownStep {
                node_id: n(2),
                step: "99999999999999999999".into()
            }
        );
        assert_eq!(
            err.to_string(),
            "Node 'n2' refers to step '99999999999999999999', which does not exist"
        );
    }

    #[test]
    fn new_trigger_closes_open_conditions() {
        let graph = build(&[
            Entity::trigger("file uploaded"),
            Entity::condition("size is over 10"),
            Entity::trigger("form submitted"),
            Entity::action("send a receipt"),
        ])
        .unwrap();
        assert_eq!(edges(&graph), vec![(1, 2), (3, 4)]);
    }

    #[test]
    fn empty_input_builds_empty_graph() {
        let graph = build(&[]).unwrap();
        assert!(graph.is_empty());
    }
}
