//! Workflow graph: an arena of nodes keyed by id, plus a petgraph view used
//! for cycle and reachability queries.

pub mod builder;
pub mod topo;

pub use builder::build;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use serde::{Serialize, Serializer};

use crate::extract::{Entity, EntityKind};

/// Node identifier, assigned in extraction order and rendered as `n1`, `n2`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(n: u32) -> Self {
        NodeId(n)
    }

    pub fn index(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowNode {
    pub id: NodeId,
    pub entity: Entity,
    pub incoming: BTreeSet<NodeId>,
    pub outgoing: BTreeSet<NodeId>,
}

impl WorkflowNode {
    pub fn kind(&self) -> EntityKind {
        self.entity.kind
    }

    pub fn label(&self) -> &str {
        &self.entity.label
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    nodes: BTreeMap<NodeId, WorkflowNode>,
    /// Declaration order.
    edges: Vec<Edge>,
    dag: DiGraph<NodeId, ()>,
    indices: HashMap<NodeId, NodeIndex>,
    orphans: Vec<NodeId>,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node for `entity`; ids count up from 1.
    pub fn add_node(&mut self, entity: Entity) -> NodeId {
        let id = NodeId(self.nodes.len() as u32 + 1);
        let idx = self.dag.add_node(id);
        self.indices.insert(id, idx);
        self.nodes.insert(
            id,
            WorkflowNode {
                id,
                entity,
                incoming: BTreeSet::new(),
                outgoing: BTreeSet::new(),
            },
        );
        id
    }

    /// Add `from → to`. Returns false for unknown ids or an existing edge.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        let (Some(&from_idx), Some(&to_idx)) = (self.indices.get(&from), self.indices.get(&to)) else {
            return false;
        };
        if self.dag.contains_edge(from_idx, to_idx) {
            return false;
        }
        self.dag.add_edge(from_idx, to_idx, ());
        self.edges.push(Edge { from, to });
        if let Some(node) = self.nodes.get_mut(&from) {
            node.outgoing.insert(to);
        }
        if let Some(node) = self.nodes.get_mut(&to) {
            node.incoming.insert(from);
        }
        true
    }

    pub fn node(&self, id: NodeId) -> Option<&WorkflowNode> {
        self.nodes.get(&id)
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &WorkflowNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &WorkflowNode> {
        self.nodes.values().filter(move |n| n.kind() == kind)
    }

    pub fn triggers(&self) -> impl Iterator<Item = &WorkflowNode> {
        self.nodes_of_kind(EntityKind::Trigger)
    }

    /// Actions the builder found with no path from any trigger.
    pub fn orphans(&self) -> &[NodeId] {
        &self.orphans
    }

    pub(crate) fn set_orphans(&mut self, orphans: Vec<NodeId>) {
        self.orphans = orphans;
    }

    /// Every node reachable from at least one trigger, triggers included.
    pub fn reachable_from_triggers(&self) -> BTreeSet<NodeId> {
        let mut reachable = BTreeSet::new();
        for trigger in self.triggers() {
            let Some(&start) = self.indices.get(&trigger.id) else {
                continue;
            };
            let mut bfs = Bfs::new(&self.dag, start);
            while let Some(nx) = bfs.next(&self.dag) {
                reachable.insert(self.dag[nx]);
            }
        }
        reachable
    }

    /// Every node reachable from `id`, excluding `id` unless it lies on a cycle.
    pub fn descendants(&self, id: NodeId) -> BTreeSet<NodeId> {
        let mut found = BTreeSet::new();
        let Some(&start) = self.indices.get(&id) else {
            return found;
        };
        let mut bfs = Bfs::new(&self.dag, start);
        bfs.next(&self.dag);
        while let Some(nx) = bfs.next(&self.dag) {
            found.insert(self.dag[nx]);
        }
        if self
            .nodes
            .get(&id)
            .is_some_and(|n| n.incoming.contains(&id) || !n.incoming.is_disjoint(&found))
        {
            found.insert(id);
        }
        found
    }

    /// Groups of nodes that form cycles, each sorted by id, ordered by their
    /// smallest member. Self-loops count as single-node cycles.
    pub fn cycles(&self) -> Vec<Vec<NodeId>> {
        let mut cycles: Vec<Vec<NodeId>> = tarjan_scc(&self.dag)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&idx| self.dag.contains_edge(idx, idx))
            })
            .map(|component| {
                let mut ids: Vec<NodeId> = component.into_iter().map(|idx| self.dag[idx]).collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();
        cycles
    }
}
