//! Validator and schema resolution.

use crate::error::PolicyCheckError;
use crate::parse::graph::PolicyGraph;
use crate::parse::types::{PolicyNode, SchemaData};
use crate::policy::types::{
    DataPolicyValidator, PolicySchema, ValidatorArguments,
};

use super::DryRunResult;

/// A schema node on its own. Needs an id and a version to be referenced.
pub fn resolve_schema(node: &PolicyNode, schema: &SchemaData) -> DryRunResult<PolicySchema> {
    if schema.id.trim().is_empty() {
        return DryRunResult::failure(
            node,
            PolicyCheckError::not_configured(node, "Schema id must not be empty"),
        );
    }
    if schema.version.trim().is_empty() {
        return DryRunResult::failure(
            node,
            PolicyCheckError::not_configured(
                node,
                format!("Schema '{}' has no version", schema.id),
            ),
        );
    }

    DryRunResult::success(
        node,
        PolicySchema {
            id: schema.id.clone(),
            version: schema.version.clone(),
            schema_type: schema.schema_type,
            schema_definition: schema.schema_source.clone(),
            message_type: schema.message_type.clone(),
        },
    )
}

/// `VALIDATOR ← SCHEMA[]`. Each schema becomes a nested resource so it can be
/// dry-run on its own.
pub fn resolve_validator(
    node: &PolicyNode,
    graph: &PolicyGraph,
) -> DryRunResult<DataPolicyValidator, PolicySchema> {
    let Some(validator) = node.as_validator() else {
        return DryRunResult::failure(
            node,
            PolicyCheckError::not_configured(node, "Node is not a validator"),
        );
    };

    let schemas: Vec<(&PolicyNode, &SchemaData)> = graph
        .incomers(node.id(), None)
        .into_iter()
        .filter_map(|n| n.as_schema().map(|s| (n, s)))
        .collect();

    if schemas.is_empty() {
        return DryRunResult::failure(node, PolicyCheckError::not_connected(node, "SCHEMA", None));
    }

    let resources: Vec<_> = schemas
        .iter()
        .map(|(n, s)| resolve_schema(n, s))
        .collect();
    let references = resources
        .iter()
        .filter_map(|r| r.data.as_ref().map(PolicySchema::reference))
        .collect();

    DryRunResult::success(
        node,
        DataPolicyValidator {
            validator_type: validator.validator_type,
            arguments: ValidatorArguments {
                schemas: references,
                strategy: validator.strategy,
            },
        },
    )
    .with_resources(resources)
}

/// `DATA_POLICY ← VALIDATOR[]`. An unconnected policy yields a single error
/// entry rather than an empty list.
pub fn resolve_validators(
    policy: &PolicyNode,
    graph: &PolicyGraph,
) -> Vec<DryRunResult<DataPolicyValidator, PolicySchema>> {
    let validators: Vec<&PolicyNode> = graph
        .incomers(policy.id(), None)
        .into_iter()
        .filter(|n| n.as_validator().is_some())
        .collect();

    if validators.is_empty() {
        return vec![DryRunResult::failure(
            policy,
            PolicyCheckError::not_connected(policy, "VALIDATOR", None),
        )];
    }

    validators
        .into_iter()
        .map(|v| resolve_validator(v, graph))
        .collect()
}
