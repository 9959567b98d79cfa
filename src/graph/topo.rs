//! Deterministic topological order of the workflow graph.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use super::{NodeId, WorkflowGraph};

/// Kahn's algorithm. Among ready nodes, triggers go first, then conditions,
/// then actions; ties break on node id.
///
/// On a cycle, returns the nodes that could not be ordered.
pub fn topo_sort(graph: &WorkflowGraph) -> Result<Vec<NodeId>, Vec<NodeId>> {
    let mut in_degree: BTreeMap<NodeId, usize> =
        graph.nodes().map(|n| (n.id, n.incoming.len())).collect();

    let mut ready: BinaryHeap<Reverse<(u8, NodeId)>> = graph
        .nodes()
        .filter(|n| n.incoming.is_empty())
        .map(|n| Reverse((n.kind().rank(), n.id)))
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(Reverse((_, id))) = ready.pop() {
        order.push(id);
        let Some(node) = graph.node(id) else { continue };
        for next in &node.outgoing {
            let Some(degree) = in_degree.get_mut(next) else {
                continue;
            };
            *degree -= 1;
            if *degree == 0
                && let Some(successor) = graph.node(*next)
            {
                ready.push(Reverse((successor.kind().rank(), *next)));
            }
        }
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        Err(in_degree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(id, _)| id)
            .collect())
    }
}
