//! Integration tests for graph construction.

mod helpers;

use blueprint_compiler::error::GraphError;
use blueprint_compiler::extract::{EntityKind, extract};
use blueprint_compiler::graph::{NodeId, build};
use blueprint_compiler::graph::topo::topo_sort;

#[test]
fn single_edge_trigger_to_action() {
    let graph = helpers::graph_from_text("When a new email arrives, send a Slack message");
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.edges().len(), 1);
    let edge = graph.edges()[0];
    assert_eq!(graph.node(edge.from).unwrap().kind(), EntityKind::Trigger);
    assert_eq!(graph.node(edge.to).unwrap().kind(), EntityKind::Action);
}

#[test]
fn cyclic_phrasing_is_rejected_naming_both_nodes() {
    let entities = extract(
        "Send a Slack message, then create a ticket, then go back to step 1",
        &[],
    )
    .unwrap();
    let err = build(&entities).unwrap_err();
    assert_eq!(
        err,
        GraphError::CycleDetected {
            involved: vec![NodeId::new(1), NodeId::new(2)]
        }
    );
}

#[test]
fn step_reference_out_of_range() {
    let entities = extract("When a form is submitted, create a ticket, then go back to step 9", &[]).unwrap();
    let err = build(&entities).unwrap_err();
    assert_eq!(err.code(), "UnknownStep");
}

#[test]
fn orphans_are_kept_for_the_validator() {
    let graph = helpers::graph_from_text("Send a Slack message, then create a ticket");
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.orphans(), &[NodeId::new(1), NodeId::new(2)]);
}

#[test]
fn condition_is_hoisted_under_later_trigger() {
    let graph = helpers::graph_from_text("If the amount is over 100, when payment received, notify finance");
    let order = topo_sort(&graph).unwrap();
    let kinds: Vec<_> = order
        .iter()
        .map(|id| graph.node(*id).unwrap().kind())
        .collect();
    assert_eq!(
        kinds,
        vec![EntityKind::Trigger, EntityKind::Condition, EntityKind::Action]
    );
}

#[test]
fn sample_graphs_are_acyclic_with_sorted_edges() {
    for text in helpers::SAMPLES {
        let graph = helpers::graph_from_text(text);
        assert!(graph.cycles().is_empty(), "{text}");
        let order = topo_sort(&graph).unwrap();
        assert_eq!(order.len(), graph.len());
        for edge in graph.edges() {
            let from = order.iter().position(|id| *id == edge.from).unwrap();
            let to = order.iter().position(|id| *id == edge.to).unwrap();
            assert!(from < to, "edge {:?} out of order in {text}", edge);
        }
    }
}
