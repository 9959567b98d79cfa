//! WASM entry points for browser and edge use.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::DesignOptions;
use crate::design::{self, DesignFailure, DesignRequest, DesignResponse, ErrorEntry, ResponseBody};
use crate::error::Phase;
use crate::extract::{self, Attachment};
use crate::graph;
use crate::validate::{self, ValidationReport};

/// Full pipeline. `files_json` is an array of `{name, byteSize, mimeType}`;
/// `options_json` may be empty for defaults.
/// Returns the success payload or `{ errors }`.
#[wasm_bindgen]
pub fn design_automation(text: &str, files_json: &str, options_json: &str) -> JsValue {
    to_js(&design_automation_inner(text, files_json, options_json).body)
}

fn design_automation_inner(text: &str, files_json: &str, options_json: &str) -> DesignResponse {
    let files = match parse_files(files_json) {
        Ok(files) => files,
        Err(entry) => return bad_request(entry),
    };

    let options = if options_json.trim().is_empty() {
        DesignOptions::default()
    } else {
        match DesignOptions::from_json(options_json) {
            Ok(options) => options,
            Err(e) => return bad_request(parse_error(e.to_string())),
        }
    };

    let request = DesignRequest {
        text: text.to_string(),
        files,
    };
    DesignResponse::from_result(&request, design::design(&request, &options))
}

/// Extract, build and validate without compiling.
/// Returns the validation report, or `{ errors }` when the pipeline aborts.
#[wasm_bindgen]
pub fn validate_automation(text: &str) -> JsValue {
    match validate_automation_inner(text) {
        Ok(report) => to_js(&report),
        Err(response) => to_js(&response.body),
    }
}

fn validate_automation_inner(text: &str) -> Result<ValidationReport, DesignResponse> {
    let entities =
        extract::extract(text, &[]).map_err(|e| DesignResponse::from_error(e.into()))?;
    let graph = graph::build(&entities).map_err(|e| DesignResponse::from_error(e.into()))?;
    Ok(validate::validate(&graph))
}

fn parse_files(files_json: &str) -> Result<Vec<Attachment>, ErrorEntry> {
    if files_json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(files_json)
        .map_err(|e| parse_error(format!("Failed to parse attachment metadata: {e}")))
}

fn parse_error(message: String) -> ErrorEntry {
    ErrorEntry {
        code: "InvalidRequest".into(),
        phase: Phase::Extract.to_string(),
        message,
        node_id: None,
    }
}

fn bad_request(entry: ErrorEntry) -> DesignResponse {
    DesignResponse {
        status: 400,
        body: ResponseBody::Failure(DesignFailure::new(vec![entry])),
    }
}

/// Plain JS objects rather than `Map`s for JSON values.
fn to_js<T: Serialize>(value: &T) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}
