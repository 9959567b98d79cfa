#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use blueprint_compiler::codegen::{Rendering, TargetFormat};
use blueprint_compiler::config::DesignOptions;
use blueprint_compiler::design::{DesignOutcome, DesignRequest, design};
use blueprint_compiler::extract::extract;
use blueprint_compiler::graph::{WorkflowGraph, build};
use blueprint_compiler::validate::{Diagnostic, ValidationReport};

// =============================================================================
// Pipeline shortcuts
// =============================================================================

/// Extract + build with defaults. Panics on extraction or graph errors.
pub fn graph_from_text(text: &str) -> WorkflowGraph {
    let entities = extract(text, &[]).expect("extraction should succeed");
    build(&entities).expect("graph should build")
}

pub fn run(text: &str) -> DesignOutcome {
    design(&DesignRequest::text(text), &DesignOptions::default()).expect("pipeline should not abort")
}

/// Renderings + warnings of a design that must compile.
pub fn compiled(text: &str) -> (BTreeMap<TargetFormat, Rendering>, Vec<Diagnostic>) {
    match run(text) {
        DesignOutcome::Compiled {
            renderings,
            warnings,
        } => (renderings, warnings),
        DesignOutcome::Rejected { report } => panic!("expected a blueprint, got {:?}", report),
    }
}

/// Report of a design that must be rejected by the validator.
pub fn rejected(text: &str) -> ValidationReport {
    match run(text) {
        DesignOutcome::Rejected { report } => report,
        DesignOutcome::Compiled { .. } => panic!("expected a rejection for {text:?}"),
    }
}

// =============================================================================
// Rendering accessors
// =============================================================================

pub fn human_logic(renderings: &BTreeMap<TargetFormat, Rendering>) -> &str {
    renderings
        .get(&TargetFormat::HumanLogic)
        .and_then(Rendering::as_text)
        .expect("HumanLogic rendering should be text")
}

pub fn json(renderings: &BTreeMap<TargetFormat, Rendering>, format: TargetFormat) -> &serde_json::Value {
    renderings
        .get(&format)
        .and_then(Rendering::as_json)
        .expect("rendering should be JSON")
}

/// Node ids listed in the numbered section of a HumanLogic rendering.
pub fn human_logic_node_ids(text: &str) -> BTreeSet<String> {
    text.lines()
        .filter_map(|line| {
            let start = line.rfind('[')?;
            let end = line.rfind(']')?;
            (start < end).then(|| line[start + 1..end].to_string())
        })
        .collect()
}

pub fn node_based_ids(document: &serde_json::Value) -> BTreeSet<String> {
    document["nodes"]
        .as_array()
        .expect("nodes should be an array")
        .iter()
        .filter_map(|n| n["id"].as_str().map(str::to_string))
        .collect()
}

// =============================================================================
// Sample descriptions
// =============================================================================

pub const SAMPLES: &[&str] = &[
    "When a new email arrives, send a Slack message",
    "If the amount is over 100, when payment received, notify finance",
    "Every Monday at 9am, generate the weekly report, then email it to boss@example.com",
    "When a form is submitted, create a Trello card. If the budget is at least 5000, notify #finance on Slack",
    "When a build fails, post to #ops. When a deploy finishes, update the status page",
];
