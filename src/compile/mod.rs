//! Compile phase: assemble resolver branches into a policy.
//!
//! Compilers never stop at the first failing branch. All branch results are
//! kept so a single pass reports every problem in the graph.

pub mod behavior_policy;
pub mod data_policy;

use serde::Serialize;
use tracing::debug;

use crate::error::{PolicyCheckError, PolicyError};
use crate::parse::graph::PolicyGraph;
use crate::parse::types::{PolicyNode, WorkspaceState};
use crate::policy::types::CompiledPolicy;
use crate::resolve::{DryRunResult, PolicyPayload, collect_errors};

pub use behavior_policy::compile_behavior_policy;
pub use data_policy::compile_data_policy;

/// Every branch result of one policy, the policy's own result last.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyCompilation {
    pub results: Vec<DryRunResult<PolicyPayload>>,
    /// Present only when no branch reported an error.
    pub policy: Option<CompiledPolicy>,
}

impl PolicyCompilation {
    pub fn errors(&self) -> Vec<PolicyCheckError> {
        collect_errors(&self.results)
    }

    pub fn is_valid(&self) -> bool {
        self.policy.is_some()
    }
}

/// Dispatch on the node type. Only policy nodes can be compiled.
pub fn compile_policy(
    node: &PolicyNode,
    graph: &PolicyGraph,
) -> Result<PolicyCompilation, PolicyError> {
    let compilation = match node {
        PolicyNode::DataPolicy(p) => compile_data_policy(node, &p.data, graph),
        PolicyNode::BehaviorPolicy(p) => compile_behavior_policy(node, &p.data, graph),
        PolicyNode::TopicFilter(_)
        | PolicyNode::ClientFilter(_)
        | PolicyNode::Validator(_)
        | PolicyNode::Schema(_)
        | PolicyNode::Operation(_)
        | PolicyNode::Transition(_)
        | PolicyNode::Function(_)
        | PolicyNode::Unknown(_) => {
            return Err(PolicyError::UnsupportedPolicyType(
                node.node_type().to_string(),
            ));
        }
    };

    debug!(
        policy = node.id(),
        results = compilation.results.len(),
        valid = compilation.is_valid(),
        "Compiled policy"
    );
    Ok(compilation)
}

/// Look the node up by id in `state` and compile it.
pub fn compile_policy_by_id(
    state: &WorkspaceState,
    node_id: &str,
) -> Result<PolicyCompilation, PolicyError> {
    let graph = PolicyGraph::build(state);
    let node = graph
        .node(node_id)
        .ok_or_else(|| PolicyError::NodeNotFound(node_id.to_string()))?;
    compile_policy(node, &graph)
}

/// Policy id on the gateway: the configured one, else the node id.
pub(crate) fn policy_id(configured: Option<&str>, node: &PolicyNode) -> String {
    configured
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(node.id())
        .to_string()
}
