//! Operation pipeline resolution.
//!
//! A pipeline starts at a named output handle of a policy or transition and
//! follows one `OPERATION` successor per step through the `output` handle.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::PolicyCheckError;
use crate::parse::graph::PolicyGraph;
use crate::parse::types::{OperationData, PolicyNode, handles};
use crate::policy::types::PolicyOperation;

use super::DryRunResult;
use super::transform::{TRANSFORM_FUNCTION_ID, resolve_transform};

/// Resolve the operation chain leaving `source` through `handle`.
///
/// An unconnected handle is an empty pipeline. Every operation is resolved
/// even after one fails, so the result lists all problems of the chain.
pub fn resolve_pipeline(
    source: &PolicyNode,
    handle: &str,
    graph: &PolicyGraph,
) -> Vec<DryRunResult<PolicyOperation>> {
    let mut results = Vec::new();
    let mut visited = HashSet::new();
    let mut terminal: Option<&PolicyNode> = None;
    let mut next = next_operation(graph, source, handle);

    while let Some((node, operation)) = next {
        if !visited.insert(node.id()) {
            warn!(node = node.id(), "Pipeline loops back on itself; stopping");
            break;
        }

        match terminal {
            Some(last) => results.push(DryRunResult::failure(
                node,
                PolicyCheckError::cardinality(node, last).with_detail(format!(
                    "Operation '{}' follows the terminal operation '{}'",
                    node.id(),
                    last.id()
                )),
            )),
            None => results.extend(resolve_operation(node, operation, graph)),
        }

        if terminal.is_none() && is_terminal(operation, graph) {
            terminal = Some(node);
        }
        next = next_operation(graph, node, handles::OUTPUT);
    }

    debug!(
        source = source.id(),
        handle,
        operations = results.len(),
        "Resolved pipeline"
    );
    results
}

fn next_operation<'a>(
    graph: &PolicyGraph<'a>,
    node: &PolicyNode,
    handle: &str,
) -> Option<(&'a PolicyNode, &'a OperationData)> {
    let mut successors = graph
        .outgoers(node.id(), Some(handle))
        .into_iter()
        .filter_map(|n| n.as_operation().map(|op| (n, op)));

    let first = successors.next();
    if successors.next().is_some() {
        debug!(
            node = node.id(),
            handle, "Pipeline branches; following the first edge only"
        );
    }
    first
}

fn is_terminal(operation: &OperationData, graph: &PolicyGraph) -> bool {
    operation.is_terminal.unwrap_or_else(|| {
        operation
            .function_id
            .as_deref()
            .and_then(|id| graph.function(id))
            .is_some_and(|f| f.metadata.is_terminal)
    })
}

/// A single operation node. Transform operations expand into several steps.
pub fn resolve_operation(
    node: &PolicyNode,
    operation: &OperationData,
    graph: &PolicyGraph,
) -> Vec<DryRunResult<PolicyOperation>> {
    let function_id = match operation.function_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => {
            return vec![DryRunResult::failure(
                node,
                PolicyCheckError::not_configured(node, "Operation has no function selected"),
            )];
        }
    };

    if function_id == TRANSFORM_FUNCTION_ID {
        return resolve_transform(node, operation, graph);
    }

    let catalog = &graph.state().functions;
    if !catalog.is_empty() && graph.function(function_id).is_none() {
        return vec![DryRunResult::failure(
            node,
            PolicyCheckError::not_configured(
                node,
                format!("Function '{}' is not offered by the gateway", function_id),
            ),
        )];
    }

    vec![DryRunResult::success(
        node,
        PolicyOperation {
            id: node.id().to_string(),
            function_id: function_id.to_string(),
            arguments: operation.form_data.clone(),
        },
    )]
}
