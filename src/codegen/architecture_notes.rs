//! ArchitectureNotes rendering: operational limits, retries and risks of a
//! workflow, derived from the graph.
//!
//! Notes are grouped by topic in a fixed order (schedules, services, fan-out,
//! attachments). Within a topic they follow node id order, except services,
//! which follow service name order.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::extract::{EntityKind, REFERENCE_FILE_ATTRIBUTE, REFERENCE_IMAGE_ATTRIBUTE};
use crate::graph::{NodeId, WorkflowGraph, WorkflowNode};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchitectureNotes {
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoteTopic {
    Schedule,
    Service,
    FanOut,
    Attachment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub topic: NoteTopic,
    pub node_ids: Vec<NodeId>,
    pub message: String,
}

pub fn render(graph: &WorkflowGraph) -> ArchitectureNotes {
    let mut notes = Vec::new();
    schedules(graph, &mut notes);
    services(graph, &mut notes);
    fan_out(graph, &mut notes);
    attachments(graph, &mut notes);
    ArchitectureNotes { notes }
}

fn schedules(graph: &WorkflowGraph, notes: &mut Vec<Note>) {
    for trigger in graph.triggers() {
        if let Some(schedule) = trigger.entity.attribute("schedule") {
            notes.push(Note {
                topic: NoteTopic::Schedule,
                node_ids: vec![trigger.id],
                message: format!(
                    "'{}' runs on schedule '{}'; runs missed while the platform is down are not replayed",
                    trigger.label(),
                    schedule
                ),
            });
        }
    }
}

fn services(graph: &WorkflowGraph, notes: &mut Vec<Note>) {
    let mut by_service: BTreeMap<&str, Vec<NodeId>> = BTreeMap::new();
    for node in graph.nodes() {
        if let Some(service) = node.entity.attribute("service") {
            by_service.entry(service).or_default().push(node.id);
        }
    }
    for (service, node_ids) in by_service {
        notes.push(Note {
            topic: NoteTopic::Service,
            message: format!(
                "Calls {} from {}; subject to its rate limits, retry transient failures with backoff",
                service,
                join_ids(&node_ids)
            ),
            node_ids,
        });
    }
}

/// Triggers and actions that start two or more actions directly.
fn fan_out(graph: &WorkflowGraph, notes: &mut Vec<Note>) {
    for node in graph.nodes().filter(|n| n.kind() != EntityKind::Condition) {
        let branches: Vec<NodeId> = node
            .outgoing
            .iter()
            .copied()
            .filter(|id| graph.node(*id).is_some_and(|n| n.kind() == EntityKind::Action))
            .collect();
        if branches.len() > 1 {
            notes.push(Note {
                topic: NoteTopic::FanOut,
                message: format!(
                    "'{}' starts {} unguarded branches ({}); they run independently and can partially fail",
                    node.label(),
                    branches.len(),
                    join_ids(&branches)
                ),
                node_ids: vec![node.id],
            });
        }
    }
}

fn attachments(graph: &WorkflowGraph, notes: &mut Vec<Note>) {
    for node in graph.nodes() {
        let names = referenced_files(node);
        if !names.is_empty() {
            notes.push(Note {
                topic: NoteTopic::Attachment,
                node_ids: vec![node.id],
                message: format!(
                    "'{}' references {}; uploads above the attachment size limit are rejected",
                    node.label(),
                    names.join(", ")
                ),
            });
        }
    }
}

fn referenced_files(node: &WorkflowNode) -> Vec<&str> {
    [REFERENCE_IMAGE_ATTRIBUTE, REFERENCE_FILE_ATTRIBUTE]
        .into_iter()
        .filter_map(|key| node.entity.attribute(key))
        .collect()
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter().map(NodeId::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Entity, GOTO_STEP_ATTRIBUTE};
    use crate::graph::build;

    fn topics(notes: &ArchitectureNotes) -> Vec<NoteTopic> {
        notes.notes.iter().map(|n| n.topic).collect()
    }

    #[test]
    fn plain_workflow_has_no_notes() {
        let graph = build(&[Entity::trigger("t"), Entity::action("a")]).unwrap();
        assert!(render(&graph).notes.is_empty());
    }

    #[test]
    fn services_are_grouped_by_name() {
        let graph = build(&[
            Entity::trigger("new email arrives").with_attribute("service", "email"),
            Entity::action("post to Slack").with_attribute("service", "slack"),
            Entity::action("reply by email").with_attribute("service", "email"),
        ])
        .unwrap();
        let notes = render(&graph);
        assert_eq!(topics(&notes), vec![NoteTopic::Service, NoteTopic::Service]);
        assert_eq!(notes.notes[0].node_ids, vec![NodeId::new(1), NodeId::new(3)]);
        assert_eq!(
            notes.notes[0].message,
            "Calls email from n1, n3; subject to its rate limits, retry transient failures with backoff"
        );
        assert_eq!(notes.notes[1].node_ids, vec![NodeId::new(2)]);
    }

    #[test]
    fn forward_jump_is_fan_out() {
        let graph = build(&[
            Entity::trigger("t").with_attribute(GOTO_STEP_ATTRIBUTE, "3"),
            Entity::action("a1"),
            Entity::action("a2"),
        ])
        .unwrap();
        let notes = render(&graph);
        assert_eq!(topics(&notes), vec![NoteTopic::FanOut]);
        assert_eq!(
            notes.notes[0].message,
            "'t' starts 2 unguarded branches (n2, n3); they run independently and can partially fail"
        );
    }

    #[test]
    fn topics_come_in_fixed_order() {
        let graph = build(&[
            Entity::trigger("every day").with_attribute("schedule", "daily"),
            Entity::action("export the sheet")
                .with_attribute("service", "sheets")
                .with_attribute(REFERENCE_FILE_ATTRIBUTE, "template.xlsx"),
        ])
        .unwrap();
        let notes = render(&graph);
        assert_eq!(
            topics(&notes),
            vec![NoteTopic::Schedule, NoteTopic::Service, NoteTopic::Attachment]
        );
        assert_eq!(
            notes.notes[2].message,
            "'export the sheet' references template.xlsx; uploads above the attachment size limit are rejected"
        );
    }
}
