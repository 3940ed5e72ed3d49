//! Topic and client filter resolution.
//!
//! A policy needs exactly one filter predecessor, whichever handle the edge
//! enters through. When several are wired in, the first edge wins and the
//! second incomer carries the cardinality error.

use crate::error::PolicyCheckError;
use crate::parse::graph::PolicyGraph;
use crate::parse::types::PolicyNode;

use super::DryRunResult;

/// `DATA_POLICY ← TOPIC_FILTER`. Resolves to the filter's first topic.
pub fn resolve_topic_filter(policy: &PolicyNode, graph: &PolicyGraph) -> DryRunResult<String> {
    resolve_single_filter(policy, graph, "TOPIC_FILTER", |n| {
        n.as_topic_filter().map(|d| d.topics.as_slice())
    })
}

/// `BEHAVIOR_POLICY ← CLIENT_FILTER`. Resolves to the filter's first client id.
pub fn resolve_client_filter(policy: &PolicyNode, graph: &PolicyGraph) -> DryRunResult<String> {
    resolve_single_filter(policy, graph, "CLIENT_FILTER", |n| {
        n.as_client_filter().map(|d| d.clients.as_slice())
    })
}

fn resolve_single_filter<'a>(
    policy: &PolicyNode,
    graph: &PolicyGraph<'a>,
    expected: &str,
    entries: impl Fn(&'a PolicyNode) -> Option<&'a [String]>,
) -> DryRunResult<String> {
    let incomers: Vec<(&PolicyNode, &[String])> = graph
        .incomers(policy.id(), None)
        .into_iter()
        .filter_map(|n| entries(n).map(|list| (n, list)))
        .collect();

    match incomers.as_slice() {
        [] => DryRunResult::failure(
            policy,
            PolicyCheckError::not_connected(policy, expected, None),
        ),
        [(filter, list)] => match list.first() {
            Some(first) if !first.trim().is_empty() => DryRunResult::success(filter, first.clone()),
            _ => DryRunResult::failure(
                filter,
                PolicyCheckError::not_configured(
                    filter,
                    format!("{} must define at least one entry", expected),
                ),
            ),
        },
        [_, (extra, _), ..] => DryRunResult::failure(
            extra,
            PolicyCheckError::cardinality(extra, policy),
        ),
    }
}
