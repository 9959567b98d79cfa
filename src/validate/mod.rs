//! Validation phase: platform-capability checks over a built graph.
//!
//! Findings never abort. They are collected into a [`ValidationReport`];
//! only a report with zero errors may be compiled.

pub mod rules;

use serde::Serialize;

use crate::graph::{NodeId, WorkflowGraph};

/// Confidence threshold used by [`validate`].
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    NoTrigger,
    UnreachableAction,
    DanglingCondition,
    BranchingCondition,
    AmbiguousClassification,
    IdleTrigger,
}

impl DiagnosticCode {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticCode::NoTrigger
            | DiagnosticCode::UnreachableAction
            | DiagnosticCode::DanglingCondition
            | DiagnosticCode::BranchingCondition => Severity::Error,
            DiagnosticCode::AmbiguousClassification | DiagnosticCode::IdleTrigger => {
                Severity::Warning
            }
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub node_id: Option<NodeId>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>, node_id: Option<NodeId>) -> Self {
        Diagnostic {
            code,
            severity: code.severity(),
            message: message.into(),
            node_id,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node_id {
            Some(id) => write!(f, "[{}] {} (node '{}')", self.code, self.message, id),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_code(&self, code: DiagnosticCode) -> bool {
        self.errors
            .iter()
            .chain(&self.warnings)
            .any(|d| d.code == code)
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors.push(diagnostic),
            Severity::Warning => self.warnings.push(diagnostic),
        }
    }
}

/// Validate with [`DEFAULT_CONFIDENCE_THRESHOLD`].
pub fn validate(graph: &WorkflowGraph) -> ValidationReport {
    validate_with_threshold(graph, DEFAULT_CONFIDENCE_THRESHOLD)
}

/// Graph-level findings first, then per-node findings in node-id order.
pub fn validate_with_threshold(graph: &WorkflowGraph, confidence_threshold: f32) -> ValidationReport {
    let mut report = ValidationReport::default();
    for diagnostic in rules::run_all(graph, confidence_threshold) {
        report.push(diagnostic);
    }
    report
}
