//! Compile pass: validated WorkflowGraph → Blueprint renderings.
//!
//! Public API: `compile(graph, formats) -> Result<Blueprint, CompileError>`.
//! Pure and deterministic: identical graphs give byte-identical renderings.

pub mod architecture_notes;
pub mod human_logic;
pub mod node_based;
mod writer;
pub mod zap_based;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::CompileError;
use crate::extract::EntityKind;
use crate::graph::topo::topo_sort;
use crate::graph::{NodeId, WorkflowGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TargetFormat {
    HumanLogic,
    NodeBased,
    ZapBased,
    ArchitectureNotes,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 4] = [
        TargetFormat::HumanLogic,
        TargetFormat::NodeBased,
        TargetFormat::ZapBased,
        TargetFormat::ArchitectureNotes,
    ];
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::str::FromStr for TargetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "humanlogic" | "human" => Ok(TargetFormat::HumanLogic),
            "nodebased" | "node" => Ok(TargetFormat::NodeBased),
            "zapbased" | "zap" => Ok(TargetFormat::ZapBased),
            "architecturenotes" | "notes" => Ok(TargetFormat::ArchitectureNotes),
            _ => Err(format!("unknown target format '{s}'")),
        }
    }
}

/// One serialized rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Rendering {
    Text(String),
    Json(serde_json::Value),
}

impl Rendering {
    /// The serialized form; JSON is pretty-printed.
    pub fn render(&self) -> String {
        match self {
            Rendering::Text(text) => text.clone(),
            Rendering::Json(value) => format!("{value:#}"),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Rendering::Text(text) => Some(text),
            Rendering::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Rendering::Json(value) => Some(value),
            Rendering::Text(_) => None,
        }
    }
}

/// Compiled multi-format representation of a validated graph.
#[derive(Debug, Clone)]
pub struct Blueprint<'g> {
    pub graph: &'g WorkflowGraph,
    pub target_formats: BTreeSet<TargetFormat>,
    pub renderings: BTreeMap<TargetFormat, Rendering>,
}

impl Blueprint<'_> {
    pub fn rendering(&self, format: TargetFormat) -> Option<&Rendering> {
        self.renderings.get(&format)
    }
}

/// Compile a graph whose validation report had zero errors.
pub fn compile<'g>(
    graph: &'g WorkflowGraph,
    formats: &BTreeSet<TargetFormat>,
) -> Result<Blueprint<'g>, CompileError> {
    let order = check_invariants(graph).inspect_err(|e| {
        error!(error = %e, "compiler invoked on a graph the validator should have rejected");
    })?;

    let mut renderings = BTreeMap::new();
    for format in formats {
        let rendering = match format {
            TargetFormat::HumanLogic => Rendering::Text(human_logic::render(graph, &order)),
            TargetFormat::NodeBased => to_json(*format, &node_based::render(graph))?,
            TargetFormat::ZapBased => to_json(*format, &zap_based::render(graph, &order))?,
            TargetFormat::ArchitectureNotes => {
                to_json(*format, &architecture_notes::render(graph))?
            }
        };
        renderings.insert(*format, rendering);
    }

    Ok(Blueprint {
        graph,
        target_formats: formats.clone(),
        renderings,
    })
}

/// Returns the topological order if the graph is acyclic, has a trigger, and
/// every action is reachable from one.
fn check_invariants(graph: &WorkflowGraph) -> Result<Vec<NodeId>, CompileError> {
    let order = topo_sort(graph).map_err(|stuck| CompileError::InvalidGraph {
        reason: "graph contains a cycle".into(),
        node_id: stuck.first().copied(),
    })?;

    if graph.triggers().next().is_none() {
        return Err(CompileError::InvalidGraph {
            reason: "graph has no trigger".into(),
            node_id: None,
        });
    }

    let reachable = graph.reachable_from_triggers();
    if let Some(orphan) = graph
        .nodes_of_kind(EntityKind::Action)
        .find(|n| !reachable.contains(&n.id))
    {
        return Err(CompileError::InvalidGraph {
            reason: format!("action '{}' is unreachable from any trigger", orphan.label()),
            node_id: Some(orphan.id),
        });
    }

    Ok(order)
}

fn to_json<T: Serialize>(format: TargetFormat, document: &T) -> Result<Rendering, CompileError> {
    serde_json::to_value(document)
        .map(Rendering::Json)
        .map_err(|e| CompileError::Serialization {
            format: format.to_string(),
            reason: e.to_string(),
        })
}
