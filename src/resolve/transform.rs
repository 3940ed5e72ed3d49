//! `DataHub.transform` expansion.
//!
//! A transform operation is wired to a deserialiser schema, a serialiser
//! schema and one or more function scripts. It compiles to
//! `Serdes.deserialize`, one `fn:<name>:latest` step per script, then
//! `Serdes.serialize`.

use serde_json::{Map, Value, json};

use crate::error::PolicyCheckError;
use crate::parse::graph::PolicyGraph;
use crate::parse::types::{FunctionData, OperationData, PolicyNode, SchemaData, handles};
use crate::policy::types::{PolicyOperation, PolicyScript};

use super::validator::resolve_schema;
use super::{DryRunResult, PolicyPayload};

pub const TRANSFORM_FUNCTION_ID: &str = "DataHub.transform";
pub const DESERIALIZE_FUNCTION_ID: &str = "Serdes.deserialize";
pub const SERIALIZE_FUNCTION_ID: &str = "Serdes.serialize";

pub fn resolve_transform(
    node: &PolicyNode,
    operation: &OperationData,
    graph: &PolicyGraph,
) -> Vec<DryRunResult<PolicyOperation>> {
    let schema_on = |handle: &str| {
        graph
            .incomers(node.id(), Some(handle))
            .into_iter()
            .find_map(|n| n.as_schema().map(|s| (n, s)))
    };
    let deserialiser = schema_on(handles::DESERIALISER);
    let serialiser = schema_on(handles::SERIALISER);
    let scripts: Vec<(&PolicyNode, &FunctionData)> = graph
        .incomers(node.id(), Some(handles::FUNCTION))
        .into_iter()
        .filter_map(|n| n.as_function().map(|f| (n, f)))
        .collect();

    let mut errors = Vec::new();
    if deserialiser.is_none() {
        errors.push(PolicyCheckError::not_connected(
            node,
            "SCHEMA",
            Some(handles::DESERIALISER),
        ));
    }
    if scripts.is_empty() {
        errors.push(PolicyCheckError::not_connected(
            node,
            "FUNCTION",
            Some(handles::FUNCTION),
        ));
    }
    if serialiser.is_none() {
        errors.push(PolicyCheckError::not_connected(
            node,
            "SCHEMA",
            Some(handles::SERIALISER),
        ));
    }

    let (Some(deserialiser), Some(serialiser), false) = (deserialiser, serialiser, scripts.is_empty())
    else {
        return errors
            .into_iter()
            .map(|e| DryRunResult::failure(node, e))
            .collect();
    };

    let mut steps = Vec::with_capacity(scripts.len() + 2);
    steps.push(serdes_step(
        node,
        DESERIALIZE_FUNCTION_ID,
        "deserializer",
        deserialiser,
    ));
    for (script_node, script) in &scripts {
        steps.push(
            DryRunResult::success(
                node,
                PolicyOperation {
                    id: format!("{}-{}", node.id(), script.name),
                    function_id: format!("fn:{}:latest", script.name),
                    arguments: operation.form_data.clone(),
                },
            )
            .with_resources(vec![resolve_script(script_node, script).map(PolicyPayload::Script)]),
        );
    }
    steps.push(serdes_step(
        node,
        SERIALIZE_FUNCTION_ID,
        "serializer",
        serialiser,
    ));
    steps
}

fn serdes_step(
    node: &PolicyNode,
    function_id: &str,
    suffix: &str,
    (schema_node, schema): (&PolicyNode, &SchemaData),
) -> DryRunResult<PolicyOperation> {
    let mut arguments = Map::new();
    arguments.insert("schemaId".into(), Value::String(schema.id.clone()));
    arguments.insert("schemaVersion".into(), json!(schema.version));

    DryRunResult::success(
        node,
        PolicyOperation {
            id: format!("{}-{}", node.id(), suffix),
            function_id: function_id.to_string(),
            arguments,
        },
    )
    .with_resources(vec![resolve_schema(schema_node, schema).map(PolicyPayload::Schema)])
}

pub fn resolve_script(node: &PolicyNode, script: &FunctionData) -> DryRunResult<PolicyScript> {
    if script.name.trim().is_empty() {
        return DryRunResult::failure(
            node,
            PolicyCheckError::not_configured(node, "Function script has no name"),
        );
    }

    DryRunResult::success(
        node,
        PolicyScript {
            id: script.name.clone(),
            version: script.version,
            function_type: script.language,
            source: script.source_code.clone(),
        },
    )
}
