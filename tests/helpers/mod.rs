use policy_compiler::parse::*;
use policy_compiler::policy::BehaviorPolicyType;
use serde_json::{Map, Value};

// =============================================================================
// Workspace builders
// =============================================================================

pub fn workspace(nodes: Vec<PolicyNode>, edges: Vec<PolicyEdge>) -> WorkspaceState {
    WorkspaceState {
        nodes,
        edges,
        functions: vec![],
    }
}

pub fn function_spec(function_id: &str, is_terminal: bool) -> FunctionSpec {
    FunctionSpec {
        function_id: function_id.into(),
        metadata: FunctionMetadata {
            is_terminal,
            is_data_only: false,
            has_arguments: true,
        },
        schema: None,
    }
}

// =============================================================================
// Edge builders
// =============================================================================

/// Edge without handles.
pub fn edge(source: &str, target: &str) -> PolicyEdge {
    PolicyEdge {
        id: format!("{}->{}", source, target),
        source: source.into(),
        target: target.into(),
        source_handle: None,
        target_handle: None,
    }
}

/// Edge leaving `source` through `source_handle` and entering `target`
/// through `target_handle`.
pub fn wire(source: &str, source_handle: &str, target: &str, target_handle: &str) -> PolicyEdge {
    PolicyEdge {
        id: format!("{}:{}->{}:{}", source, source_handle, target, target_handle),
        source: source.into(),
        target: target.into(),
        source_handle: Some(source_handle.into()),
        target_handle: Some(target_handle.into()),
    }
}

// =============================================================================
// Node builders
// =============================================================================

pub fn topic_filter(id: &str, topics: &[&str]) -> PolicyNode {
    PolicyNode::TopicFilter(NodeBase::new(
        id,
        TopicFilterData {
            topics: topics.iter().map(|t| t.to_string()).collect(),
        },
    ))
}

pub fn client_filter(id: &str, clients: &[&str]) -> PolicyNode {
    PolicyNode::ClientFilter(NodeBase::new(
        id,
        ClientFilterData {
            clients: clients.iter().map(|c| c.to_string()).collect(),
        },
    ))
}

pub fn data_policy(id: &str) -> PolicyNode {
    PolicyNode::DataPolicy(NodeBase::new(id, DataPolicyData::default()))
}

pub fn behavior_policy(id: &str, model: BehaviorPolicyType) -> PolicyNode {
    PolicyNode::BehaviorPolicy(NodeBase::new(
        id,
        BehaviorPolicyData {
            id: None,
            model,
            arguments: Map::new(),
        },
    ))
}

pub fn validator(id: &str) -> PolicyNode {
    PolicyNode::Validator(NodeBase::new(
        id,
        ValidatorData {
            validator_type: ValidatorType::Schema,
            strategy: ValidationStrategy::AllOf,
        },
    ))
}

pub fn json_schema(id: &str, schema_id: &str, source: &str) -> PolicyNode {
    PolicyNode::Schema(NodeBase::new(
        id,
        SchemaData {
            id: schema_id.into(),
            version: "1".into(),
            schema_type: SchemaType::Json,
            schema_source: Some(source.into()),
            message_type: None,
        },
    ))
}

pub fn schema(id: &str, schema_id: &str) -> PolicyNode {
    json_schema(id, schema_id, r#"{"type":"object"}"#)
}

pub fn operation(id: &str, function_id: Option<&str>) -> PolicyNode {
    PolicyNode::Operation(NodeBase::new(
        id,
        OperationData {
            function_id: function_id.map(String::from),
            form_data: Map::new(),
            is_terminal: None,
        },
    ))
}

pub fn operation_with_args(id: &str, function_id: &str, args: Value) -> PolicyNode {
    let form_data = match args {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    PolicyNode::Operation(NodeBase::new(
        id,
        OperationData {
            function_id: Some(function_id.into()),
            form_data,
            is_terminal: None,
        },
    ))
}

pub fn transition(id: &str, event: Option<&str>, from: &str, to: &str) -> PolicyNode {
    PolicyNode::Transition(NodeBase::new(
        id,
        TransitionData {
            event: event.map(String::from),
            from: Some(from.into()),
            to: Some(to.into()),
            model: None,
        },
    ))
}

pub fn script(id: &str, name: &str, source: &str) -> PolicyNode {
    PolicyNode::Function(NodeBase::new(
        id,
        FunctionData {
            name: name.into(),
            version: Some(1),
            language: ScriptLanguage::Javascript,
            source_code: source.into(),
        },
    ))
}

// =============================================================================
// Canonical graphs
// =============================================================================

/// `topic → policy ← validator ← schema`, with a two-step `onSuccess`
/// pipeline and a one-step `onError` pipeline.
pub fn complete_data_policy() -> WorkspaceState {
    workspace(
        vec![
            topic_filter("topic-1", &["sensors/+/temperature"]),
            schema("schema-1", "temperature"),
            validator("validator-1"),
            data_policy("policy-1"),
            operation_with_args(
                "op-log",
                "System.log",
                serde_json::json!({"level": "INFO", "message": "valid"}),
            ),
            operation_with_args(
                "op-redirect",
                "Delivery.redirectTo",
                serde_json::json!({"topic": "valid/temperature"}),
            ),
            operation("op-drop", Some("Mqtt.drop")),
        ],
        vec![
            wire("topic-1", "output", "policy-1", handles::TOPIC_FILTER),
            edge("schema-1", "validator-1"),
            wire("validator-1", "output", "policy-1", handles::VALIDATION),
            wire("policy-1", handles::ON_SUCCESS, "op-log", handles::INPUT),
            wire("op-log", handles::OUTPUT, "op-redirect", handles::INPUT),
            wire("policy-1", handles::ON_ERROR, "op-drop", handles::INPUT),
        ],
    )
}
