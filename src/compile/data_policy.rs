//! `DATA_POLICY` compiler.

use crate::parse::graph::PolicyGraph;
use crate::parse::types::{DataPolicyData, PolicyNode, handles};
use crate::policy::types::{
    CompiledPolicy, DataPolicy, DataPolicyMatching, DataPolicyValidation, PolicyAction,
    PolicyOperation,
};
use crate::resolve::filter::resolve_topic_filter;
use crate::resolve::pipeline::resolve_pipeline;
use crate::resolve::validator::resolve_validators;
use crate::resolve::{DryRunResult, PolicyPayload, collect_errors, values};

use super::{PolicyCompilation, policy_id};

/// Filter, validators, `onSuccess` and `onError` pipelines, then the policy.
pub fn compile_data_policy(
    node: &PolicyNode,
    data: &DataPolicyData,
    graph: &PolicyGraph,
) -> PolicyCompilation {
    let filter = resolve_topic_filter(node, graph);
    let validators = resolve_validators(node, graph);
    let on_success = resolve_pipeline(node, handles::ON_SUCCESS, graph);
    let on_error = resolve_pipeline(node, handles::ON_ERROR, graph);

    let mut results: Vec<DryRunResult<PolicyPayload>> = Vec::new();
    results.push(filter.clone().map(PolicyPayload::TopicFilter));
    results.extend(validators.iter().cloned().map(|v| {
        v.map(PolicyPayload::Validator)
            .map_resources(PolicyPayload::Schema)
    }));
    results.extend(operations(&on_success));
    results.extend(operations(&on_error));

    let policy = match (&filter.data, collect_errors(&results).is_empty()) {
        (Some(topic_filter), true) => Some(DataPolicy {
            id: policy_id(data.id.as_deref(), node),
            matching: DataPolicyMatching {
                topic_filter: topic_filter.clone(),
            },
            validation: DataPolicyValidation {
                validators: values(&validators),
            },
            on_success: action(&on_success),
            on_error: action(&on_error),
        }),
        _ => None,
    };

    results.push(match &policy {
        Some(p) => DryRunResult::success(node, PolicyPayload::DataPolicy(p.clone())),
        None => DryRunResult::incomplete(node),
    });

    PolicyCompilation {
        results,
        policy: policy.map(CompiledPolicy::Data),
    }
}

fn operations(
    pipeline: &[DryRunResult<PolicyOperation>],
) -> impl Iterator<Item = DryRunResult<PolicyPayload>> + '_ {
    pipeline
        .iter()
        .cloned()
        .map(|op| op.map(PolicyPayload::Operation))
}

fn action(pipeline: &[DryRunResult<PolicyOperation>]) -> Option<PolicyAction> {
    let operations = values(pipeline);
    (!operations.is_empty()).then_some(PolicyAction {
        pipeline: operations,
    })
}
