//! `BEHAVIOR_POLICY` compiler.

use crate::parse::graph::PolicyGraph;
use crate::parse::types::{BehaviorPolicyData, PolicyNode};
use crate::policy::types::{BehaviorPolicy, BehaviorPolicyMatching, CompiledPolicy};
use crate::resolve::filter::resolve_client_filter;
use crate::resolve::transition::{resolve_model, resolve_transitions};
use crate::resolve::{DryRunResult, PolicyPayload, collect_errors, values};

use super::{PolicyCompilation, policy_id};

/// Client filter, behavior model, transitions, then the policy.
pub fn compile_behavior_policy(
    node: &PolicyNode,
    data: &BehaviorPolicyData,
    graph: &PolicyGraph,
) -> PolicyCompilation {
    let client = resolve_client_filter(node, graph);
    let model = resolve_model(node, data);
    let transitions = resolve_transitions(node, data, graph);

    let mut results: Vec<DryRunResult<PolicyPayload>> = vec![
        client.clone().map(PolicyPayload::ClientFilter),
        model.clone().map(PolicyPayload::Model),
    ];
    results.extend(transitions.iter().cloned().map(|t| {
        t.map(PolicyPayload::Transition)
            .map_resources(PolicyPayload::Operation)
    }));

    let policy = match (&client.data, &model.data, collect_errors(&results).is_empty()) {
        (Some(client_id_filter), Some(model), true) => Some(BehaviorPolicy {
            id: policy_id(data.id.as_deref(), node),
            matching: BehaviorPolicyMatching {
                client_id_filter: client_id_filter.clone(),
            },
            model: model.clone(),
            transitions: values(&transitions),
        }),
        _ => None,
    };

    results.push(match &policy {
        Some(p) => DryRunResult::success(node, PolicyPayload::BehaviorPolicy(p.clone())),
        None => DryRunResult::incomplete(node),
    });

    PolicyCompilation {
        results,
        policy: policy.map(CompiledPolicy::Behavior),
    }
}
