//! Behavior model and state-machine transition resolution.

use serde_json::Value;

use crate::error::PolicyCheckError;
use crate::parse::graph::PolicyGraph;
use crate::parse::types::{BehaviorPolicyData, PolicyNode, TransitionData, handles};
use crate::policy::fsm::{BehaviorPolicyType, FiniteStateMachine, state_machine};
use crate::policy::types::{BehaviorModel, BehaviorPolicyTransition, PolicyOperation};

use super::pipeline::resolve_pipeline;
use super::{DryRunResult, values};

const QUOTA_ARGUMENTS: [&str; 2] = ["minPublishes", "maxPublishes"];

/// The behavior model of a policy node, with its arguments.
pub fn resolve_model(policy: &PolicyNode, data: &BehaviorPolicyData) -> DryRunResult<BehaviorModel> {
    if data.model == BehaviorPolicyType::PublishQuota {
        for name in QUOTA_ARGUMENTS {
            if let Some(value) = data.arguments.get(name) {
                if !matches!(value, Value::Number(n) if n.is_u64()) {
                    return DryRunResult::failure(
                        policy,
                        PolicyCheckError::not_configured(
                            policy,
                            format!("Argument '{}' of {} must be a non-negative integer", name, data.model),
                        ),
                    );
                }
            }
        }
    }

    DryRunResult::success(
        policy,
        BehaviorModel {
            id: data.model.as_str().to_string(),
            arguments: data.arguments.clone(),
        },
    )
}

/// Every `TRANSITION` wired to the policy, checked against the model's table.
pub fn resolve_transitions(
    policy: &PolicyNode,
    data: &BehaviorPolicyData,
    graph: &PolicyGraph,
) -> Vec<DryRunResult<BehaviorPolicyTransition, PolicyOperation>> {
    let fsm = state_machine(data.model);

    graph
        .outgoers(policy.id(), None)
        .into_iter()
        .filter_map(|n| n.as_transition().map(|t| (n, t)))
        .map(|(node, transition)| resolve_transition(node, transition, fsm, graph))
        .collect()
}

pub fn resolve_transition(
    node: &PolicyNode,
    transition: &TransitionData,
    fsm: &FiniteStateMachine,
    graph: &PolicyGraph,
) -> DryRunResult<BehaviorPolicyTransition, PolicyOperation> {
    let not_configured =
        |detail: String| DryRunResult::failure(node, PolicyCheckError::not_configured(node, detail));

    let Some(event) = transition.event.as_deref().filter(|e| !e.is_empty()) else {
        return not_configured("Transition has no event selected".into());
    };

    if let Some(model) = transition.model {
        if model != fsm.model {
            return not_configured(format!(
                "Transition was defined for {} but the policy uses {}",
                model, fsm.model
            ));
        }
    }

    if !fsm.has_event(event) {
        return not_configured(format!("Event '{}' is not used by {}", event, fsm.model));
    }

    let (Some(from), Some(to)) = (transition.from.as_deref(), transition.to.as_deref()) else {
        return not_configured(format!("Transition '{}' has no source or target state", event));
    };

    let Some(valid) = fsm.find(event, from, to) else {
        return not_configured(format!(
            "'{}' from {} to {} is not a transition of {}",
            event, from, to, fsm.model
        ));
    };

    let pipeline = resolve_pipeline(node, handles::OUTPUT, graph);

    DryRunResult::success(
        node,
        BehaviorPolicyTransition {
            event: valid.event.to_string(),
            from_state: valid.from_state.to_string(),
            to_state: valid.to_state.to_string(),
            pipeline: values(&pipeline),
        },
    )
    .with_resources(pipeline)
}
