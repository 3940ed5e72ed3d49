//! Resolution phase: one resolver per node kind.
//!
//! Every resolver is a pure function of a node and the indexed snapshot and
//! always returns a `DryRunResult`. Structural problems are carried in the
//! result, never returned as `Err`.
//! SYNC NOTE: A new node type in `parse/types.rs` needs a resolver here and a
//! branch in the matching compiler under `compile/`.

pub mod filter;
pub mod pipeline;
pub mod transform;
pub mod transition;
pub mod validator;

use serde::Serialize;

use crate::error::PolicyCheckError;
use crate::parse::types::PolicyNode;
use crate::policy::types::*;

/// Resolution outcome for one node: success data or a structural error, plus
/// the nested results of the resources it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DryRunResult<T, R = PolicyPayload> {
    pub node: PolicyNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PolicyCheckError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<DryRunResult<R>>>,
}

impl<T, R> DryRunResult<T, R> {
    pub fn success(node: &PolicyNode, data: T) -> Self {
        DryRunResult {
            node: node.clone(),
            data: Some(data),
            error: None,
            resources: None,
        }
    }

    pub fn failure(node: &PolicyNode, error: PolicyCheckError) -> Self {
        DryRunResult {
            node: node.clone(),
            data: None,
            error: Some(error),
            resources: None,
        }
    }

    /// Neither data nor error: the node itself is fine but depends on a
    /// branch that failed.
    pub fn incomplete(node: &PolicyNode) -> Self {
        DryRunResult {
            node: node.clone(),
            data: None,
            error: None,
            resources: None,
        }
    }

    pub fn with_resources(mut self, resources: Vec<DryRunResult<R>>) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DryRunResult<U, R> {
        DryRunResult {
            node: self.node,
            data: self.data.map(f),
            error: self.error,
            resources: self.resources,
        }
    }

    pub fn map_resources<S>(self, f: impl Fn(R) -> S) -> DryRunResult<T, S> {
        DryRunResult {
            node: self.node,
            data: self.data,
            error: self.error,
            resources: self
                .resources
                .map(|rs| rs.into_iter().map(|r| r.map(&f)).collect()),
        }
    }

    /// This result's error followed by every nested error, depth first.
    pub fn errors(&self) -> Vec<PolicyCheckError> {
        let mut errors: Vec<_> = self.error.iter().cloned().collect();
        for resource in self.resources.iter().flatten() {
            errors.extend(resource.errors());
        }
        errors
    }
}

/// Data of every successful result, in order.
pub fn values<T: Clone, R>(results: &[DryRunResult<T, R>]) -> Vec<T> {
    results.iter().filter_map(|r| r.data.clone()).collect()
}

/// Every error in `results`, including nested resources.
pub fn collect_errors<T, R>(results: &[DryRunResult<T, R>]) -> Vec<PolicyCheckError> {
    results.iter().flat_map(|r| r.errors()).collect()
}

/// Appends the nested resources of `result` that carry data, recursively.
/// `result` itself is not appended.
pub fn only_non_null_resources<T>(
    mut acc: Vec<DryRunResult<PolicyPayload>>,
    result: &DryRunResult<T>,
) -> Vec<DryRunResult<PolicyPayload>> {
    for resource in result.resources.iter().flatten() {
        if resource.data.is_some() {
            acc.push(resource.clone());
        }
        acc = only_non_null_resources(acc, resource);
    }
    acc
}

/// Type-erased result data, used once branches are merged into one list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PolicyPayload {
    TopicFilter(String),
    ClientFilter(String),
    Schema(PolicySchema),
    Script(PolicyScript),
    Validator(DataPolicyValidator),
    Operation(PolicyOperation),
    Model(BehaviorModel),
    Transition(BehaviorPolicyTransition),
    DataPolicy(DataPolicy),
    BehaviorPolicy(BehaviorPolicy),
}

impl PolicyPayload {
    /// Payloads the remote dry-run endpoint accepts.
    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            PolicyPayload::Schema(_)
                | PolicyPayload::Script(_)
                | PolicyPayload::Validator(_)
                | PolicyPayload::Operation(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PolicyPayload::TopicFilter(_) => "topicFilter",
            PolicyPayload::ClientFilter(_) => "clientFilter",
            PolicyPayload::Schema(_) => "schema",
            PolicyPayload::Script(_) => "script",
            PolicyPayload::Validator(_) => "validator",
            PolicyPayload::Operation(_) => "operation",
            PolicyPayload::Model(_) => "model",
            PolicyPayload::Transition(_) => "transition",
            PolicyPayload::DataPolicy(_) => "dataPolicy",
            PolicyPayload::BehaviorPolicy(_) => "behaviorPolicy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::types::{NodeBase, OperationData, TopicFilterData};

    fn topic(id: &str) -> PolicyNode {
        PolicyNode::TopicFilter(NodeBase::new(id, TopicFilterData::default()))
    }

    fn operation(id: &str) -> PolicyNode {
        PolicyNode::Operation(NodeBase::new(id, OperationData::default()))
    }

    fn op_payload(id: &str) -> PolicyPayload {
        PolicyPayload::Operation(PolicyOperation {
            id: id.into(),
            function_id: "System.log".into(),
            arguments: Default::default(),
        })
    }

    #[test]
    fn only_non_null_resources_keeps_resources_with_data() {
        let child = DryRunResult::<PolicyPayload>::success(&operation("op-1"), op_payload("op-1"));
        let result = DryRunResult::<String>::success(&topic("t"), "a/b".into())
            .with_resources(vec![child.clone()]);

        let flat = only_non_null_resources(vec![], &result);
        assert_eq!(flat, vec![child]);
    }

    #[test]
    fn only_non_null_resources_without_resources_returns_acc() {
        let existing = DryRunResult::<PolicyPayload>::success(&operation("op-0"), op_payload("op-0"));
        let result = DryRunResult::<String>::success(&topic("t"), "a/b".into());

        let flat = only_non_null_resources(vec![existing.clone()], &result);
        assert_eq!(flat, vec![existing]);
    }

    #[test]
    fn only_non_null_resources_skips_errors_but_walks_their_children() {
        let node = operation("op-1");
        let grandchild = DryRunResult::<PolicyPayload>::success(&operation("op-2"), op_payload("op-2"));
        let child = DryRunResult::<PolicyPayload>::failure(
            &node,
            PolicyCheckError::not_configured(&node, "missing"),
        )
        .with_resources(vec![grandchild.clone()]);
        let result = DryRunResult::<String>::incomplete(&topic("t")).with_resources(vec![child]);

        let flat = only_non_null_resources(vec![], &result);
        assert_eq!(flat, vec![grandchild]);
    }

    #[test]
    fn errors_are_collected_depth_first() {
        let a = operation("a");
        let b = operation("b");
        let child = DryRunResult::<PolicyPayload>::failure(&b, PolicyCheckError::not_configured(&b, "b"));
        let result = DryRunResult::<String>::failure(&a, PolicyCheckError::not_configured(&a, "a"))
            .with_resources(vec![child]);

        let ids: Vec<_> = result.errors().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
