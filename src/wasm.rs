//! WASM entry points for browser use.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::compile::{PolicyCompilation, compile_policy_by_id};
use crate::dry_run::{DryRunConfig, OfflineEndpoint, PolicyDryRunReport, check_policy_async};
use crate::error::{PolicyCheckError, PolicyError};
use crate::parse::{self, PolicyGraph};

/// Compile the policy `node_id` of a workspace JSON snapshot.
/// Returns a JSON object with the branch results and, when valid, the policy.
#[wasm_bindgen]
pub fn compile_policy(state_json: &str, node_id: &str) -> JsValue {
    let result = match compile_policy_inner(state_json, node_id) {
        Ok(compilation) => CompileResult::Compiled {
            errors: compilation.errors(),
            compilation,
        },
        Err(e) => CompileResult::Rejected {
            message: e.to_string(),
        },
    };
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn compile_policy_inner(state_json: &str, node_id: &str) -> Result<PolicyCompilation, PolicyError> {
    let state = parse::parse(state_json)?;
    compile_policy_by_id(&state, node_id)
}

/// Dry-run the policy `node_id` with the checks that need no gateway.
/// `config_json` may be empty to use the defaults.
#[wasm_bindgen]
pub fn check_policy(state_json: &str, node_id: &str, config_json: &str) -> JsValue {
    let result = match check_policy_inner(state_json, node_id, config_json) {
        Ok(report) => CheckResult::Report(report),
        Err(e) => CheckResult::Rejected {
            message: e.to_string(),
        },
    };
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn check_policy_inner(
    state_json: &str,
    node_id: &str,
    config_json: &str,
) -> Result<PolicyDryRunReport, PolicyError> {
    let state = parse::parse(state_json)?;
    let config = if config_json.trim().is_empty() {
        DryRunConfig::default()
    } else {
        DryRunConfig::from_json(config_json)?
    };
    let node = state
        .node(node_id)
        .ok_or_else(|| PolicyError::NodeNotFound(node_id.to_string()))?;

    // OfflineEndpoint never suspends.
    futures::executor::block_on(check_policy_async(node, &state, &OfflineEndpoint, &config))
}

/// Ids of the nodes and edges owned by the policy `node_id`, e.g. to confirm
/// what a delete would remove.
#[wasm_bindgen]
pub fn sub_flow(state_json: &str, node_id: &str) -> JsValue {
    let result = match parse::parse(state_json) {
        Ok(state) => {
            let graph = PolicyGraph::build(&state);
            let flow = graph.sub_flow(node_id);
            SubFlowResult::SubFlow {
                nodes: flow.node_ids().into_iter().map(String::from).collect(),
                edges: flow.edge_ids().into_iter().map(String::from).collect(),
            }
        }
        Err(e) => SubFlowResult::Rejected {
            message: e.to_string(),
        },
    };
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(tag = "status")]
enum CompileResult {
    #[serde(rename = "compiled")]
    Compiled {
        compilation: PolicyCompilation,
        errors: Vec<PolicyCheckError>,
    },
    #[serde(rename = "rejected")]
    Rejected { message: String },
}

#[derive(Serialize)]
#[serde(tag = "status")]
enum CheckResult {
    #[serde(rename = "report")]
    Report(PolicyDryRunReport),
    #[serde(rename = "rejected")]
    Rejected { message: String },
}

#[derive(Serialize)]
#[serde(tag = "status")]
enum SubFlowResult {
    #[serde(rename = "subFlow")]
    SubFlow { nodes: Vec<String>, edges: Vec<String> },
    #[serde(rename = "rejected")]
    Rejected { message: String },
}
