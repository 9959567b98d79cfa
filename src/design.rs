//! Full pipeline: extract → build → validate → compile.
//!
//! Extraction and graph errors abort immediately. Validator errors stop the
//! pipeline before compilation but still come back as a structured report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::codegen::{self, Rendering, TargetFormat};
use crate::config::DesignOptions;
use crate::error::{DesignError, Phase};
use crate::extract::{Attachment, Extractor};
use crate::graph::{self, NodeId};
use crate::validate::{self, Diagnostic, ValidationReport};

const INTERNAL_ERROR_MESSAGE: &str = "The blueprint could not be compiled due to an internal error";

/// Caller input: the automation description plus attachment metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub files: Vec<Attachment>,
}

impl DesignRequest {
    pub fn text(text: impl Into<String>) -> Self {
        DesignRequest {
            text: text.into(),
            files: Vec::new(),
        }
    }

    pub fn with_file(mut self, attachment: Attachment) -> Self {
        self.files.push(attachment);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DesignOutcome {
    Compiled {
        renderings: BTreeMap<TargetFormat, Rendering>,
        warnings: Vec<Diagnostic>,
    },
    Rejected {
        report: ValidationReport,
    },
}

/// Run the pipeline with the keyword classifier configured by `options`.
pub fn design(request: &DesignRequest, options: &DesignOptions) -> Result<DesignOutcome, DesignError> {
    design_with(&Extractor::from_options(options), request, options)
}

/// Run the pipeline with a caller-supplied extractor.
pub fn design_with(
    extractor: &Extractor,
    request: &DesignRequest,
    options: &DesignOptions,
) -> Result<DesignOutcome, DesignError> {
    let entities = extractor.extract(&request.text, &request.files)?;
    let graph = graph::build(&entities)?;

    let report = validate::validate_with_threshold(&graph, options.confidence_threshold);
    if !report.is_ok() {
        info!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "design rejected by validator"
        );
        return Ok(DesignOutcome::Rejected { report });
    }

    let blueprint = codegen::compile(&graph, &options.formats)?;
    debug!(
        nodes = graph.len(),
        formats = blueprint.renderings.len(),
        "blueprint compiled"
    );
    Ok(DesignOutcome::Compiled {
        renderings: blueprint.renderings,
        warnings: report.warnings,
    })
}

// =============================================================================
// Response payloads
// =============================================================================

/// Echo of what the caller sent. Blank text is reported as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Received {
    pub text: Option<String>,
    pub files: Vec<ReceivedFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceivedFile {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl From<&DesignRequest> for Received {
    fn from(request: &DesignRequest) -> Self {
        Received {
            text: Some(request.text.clone()).filter(|t| !t.trim().is_empty()),
            files: request
                .files
                .iter()
                .map(|f| ReceivedFile {
                    name: f.name.clone(),
                    size: f.byte_size,
                    mime_type: f.mime_type.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSuccess {
    pub received: Received,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_logic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_based: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zap_based: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture_notes: Option<serde_json::Value>,
    pub warnings: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    pub code: String,
    pub phase: String,
    pub message: String,
    pub node_id: Option<NodeId>,
}

/// Failure payload. `warnings` carries validator warnings when the validator
/// rejected the graph, and is empty for every other failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignFailure {
    pub errors: Vec<ErrorEntry>,
    pub warnings: Vec<Diagnostic>,
}

impl DesignFailure {
    pub(crate) fn new(errors: Vec<ErrorEntry>) -> Self {
        DesignFailure {
            errors,
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Success(DesignSuccess),
    Failure(DesignFailure),
}

/// HTTP-shaped result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl DesignResponse {
    pub fn from_result(request: &DesignRequest, result: Result<DesignOutcome, DesignError>) -> Self {
        match result {
            Ok(DesignOutcome::Compiled {
                mut renderings,
                warnings,
            }) => {
                let mut take_json = |format: TargetFormat| match renderings.remove(&format) {
                    Some(Rendering::Json(value)) => Some(value),
                    _ => None,
                };
                let node_based = take_json(TargetFormat::NodeBased);
                let zap_based = take_json(TargetFormat::ZapBased);
                let architecture_notes = take_json(TargetFormat::ArchitectureNotes);
                let human_logic = match renderings.remove(&TargetFormat::HumanLogic) {
                    Some(Rendering::Text(text)) => Some(text),
                    _ => None,
                };
                DesignResponse {
                    status: 200,
                    body: ResponseBody::Success(DesignSuccess {
                        received: Received::from(request),
                        human_logic,
                        node_based,
                        zap_based,
                        architecture_notes,
                        warnings,
                    }),
                }
            }
            Ok(DesignOutcome::Rejected { report }) => DesignResponse {
                status: 422,
                body: ResponseBody::Failure(DesignFailure {
                    errors: report
                        .errors
                        .into_iter()
                        .map(|d| ErrorEntry {
                            code: d.code.to_string(),
                            phase: Phase::Validate.to_string(),
                            message: d.message,
                            node_id: d.node_id,
                        })
                        .collect(),
                    warnings: report.warnings,
                }),
            },
            Err(e) => DesignResponse::from_error(e),
        }
    }

    /// Response for a pipeline that aborted before validation finished.
    pub fn from_error(err: DesignError) -> Self {
        match err {
            DesignError::Compile(e) => {
                error!(error = %e, "internal compile failure");
                DesignResponse {
                    status: 500,
                    body: ResponseBody::Failure(DesignFailure::new(vec![ErrorEntry {
                        code: "InternalError".into(),
                        phase: Phase::Compile.to_string(),
                        message: INTERNAL_ERROR_MESSAGE.into(),
                        node_id: None,
                    }])),
                }
            }
            e => DesignResponse {
                status: 422,
                body: ResponseBody::Failure(DesignFailure::new(error_entries(&e))),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.body, ResponseBody::Success(_))
    }
}

/// One entry per referenced node, or a single entry with no node.
fn error_entries(error: &DesignError) -> Vec<ErrorEntry> {
    let message = match error {
        DesignError::Extraction(e) => e.to_string(),
        DesignError::Graph(e) => e.to_string(),
        DesignError::Compile(e) => e.to_string(),
    };
    let entry = |node_id| ErrorEntry {
        code: error.code().to_string(),
        phase: error.phase().to_string(),
        message: message.clone(),
        node_id,
    };
    let node_ids = error.node_ids();
    if node_ids.is_empty() {
        vec![entry(None)]
    } else {
        node_ids.into_iter().map(|id| entry(Some(id))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;

    #[test]
    fn request_deserializes_without_files() {
        let request: DesignRequest = serde_json::from_str(r#"{ "text": "hi" }"#).unwrap();
        assert_eq!(request, DesignRequest::text("hi"));
    }

    #[test]
    fn cycle_error_lists_each_node() {
        let err = DesignError::from(GraphError::CycleDetected {
            involved: vec![NodeId::new(1), NodeId::new(2)],
        });
        let response = DesignResponse::from_error(err);
        assert_eq!(response.status, 422);
        let ResponseBody::Failure(failure) = response.body else {
            panic!("expected failure body");
        };
        let ids: Vec<_> = failure.errors.iter().map(|e| e.node_id).collect();
        assert_eq!(ids, vec![Some(NodeId::new(1)), Some(NodeId::new(2))]);
        assert!(failure.errors.iter().all(|e| e.code == "CycleDetected"));
    }

    #[test]
    fn compile_fault_is_generic() {
        let err = DesignError::from(crate::error::CompileError::InvalidGraph {
            reason: "secret detail".into(),
            node_id: Some(NodeId::new(3)),
        });
        let response = DesignResponse::from_error(err);
        assert_eq!(response.status, 500);
        let json = serde_json::to_string(&response.body).unwrap();
        assert!(!json.contains("secret detail"));
        assert!(json.contains("InternalError"));
    }

    #[test]
    fn received_echoes_file_metadata() {
        let request = DesignRequest::text("   ").with_file(Attachment::new("flow.png", 10, "image/png"));
        let received = serde_json::to_value(Received::from(&request)).unwrap();
        assert_eq!(
            received,
            serde_json::json!({
                "text": null,
                "files": [{ "name": "flow.png", "size": 10, "type": "image/png" }]
            })
        );
    }
}
