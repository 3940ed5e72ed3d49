//! Rust types mirroring the policy designer's graph snapshot.
//!
//! These types are the serde target for the designer's workspace JSON.
//! SYNC NOTE: When a node type or its data shape changes in the designer,
//! also review the resolvers in `resolve/` and the dispatch in `compile/`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::policy::fsm::BehaviorPolicyType;

// =============================================================================
// WORKSPACE SNAPSHOT
// =============================================================================

/// Read-only snapshot of the designer canvas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceState {
    pub nodes: Vec<PolicyNode>,
    pub edges: Vec<PolicyEdge>,
    #[serde(default)]
    pub functions: Vec<FunctionSpec>,
}

impl WorkspaceState {
    pub fn node(&self, id: &str) -> Option<&PolicyNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn function(&self, function_id: &str) -> Option<&FunctionSpec> {
        self.functions.iter().find(|f| f.function_id == function_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

/// Catalog entry describing a pipeline function offered by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSpec {
    pub function_id: String,
    #[serde(default)]
    pub metadata: FunctionMetadata,
    /// JSON schema of the function arguments, as published by the gateway.
    #[serde(default)]
    pub schema: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionMetadata {
    #[serde(default)]
    pub is_terminal: bool,
    #[serde(default)]
    pub is_data_only: bool,
    #[serde(default)]
    pub has_arguments: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

// =============================================================================
// HANDLES
// =============================================================================

/// Port names used on `sourceHandle` / `targetHandle`.
pub mod handles {
    pub const TOPIC_FILTER: &str = "topicFilter";
    pub const CLIENT_FILTER: &str = "clientFilter";
    pub const VALIDATION: &str = "validation";
    pub const ON_SUCCESS: &str = "onSuccess";
    pub const ON_ERROR: &str = "onError";
    pub const TRANSITIONS: &str = "transitions";
    pub const INPUT: &str = "input";
    pub const OUTPUT: &str = "output";
    pub const FUNCTION: &str = "function";
    pub const SERIALISER: &str = "serialiser";
    pub const DESERIALISER: &str = "deserialiser";
}

// =============================================================================
// POLICY NODE: tagged union over the designer's node types
// =============================================================================

/// A node of the designer canvas.
///
/// Tags this crate does not know deserialize into `Unknown` rather than
/// failing the whole snapshot; resolvers never match them and compiling one
/// is rejected as an unsupported policy type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", remote = "Self")]
pub enum PolicyNode {
    #[serde(rename = "TOPIC_FILTER")]
    TopicFilter(NodeBase<TopicFilterData>),
    #[serde(rename = "CLIENT_FILTER")]
    ClientFilter(NodeBase<ClientFilterData>),
    #[serde(rename = "DATA_POLICY")]
    DataPolicy(NodeBase<DataPolicyData>),
    #[serde(rename = "BEHAVIOR_POLICY")]
    BehaviorPolicy(NodeBase<BehaviorPolicyData>),
    #[serde(rename = "VALIDATOR")]
    Validator(NodeBase<ValidatorData>),
    #[serde(rename = "SCHEMA")]
    Schema(NodeBase<SchemaData>),
    #[serde(rename = "OPERATION")]
    Operation(NodeBase<OperationData>),
    #[serde(rename = "TRANSITION")]
    Transition(NodeBase<TransitionData>),
    #[serde(rename = "FUNCTION")]
    Function(NodeBase<FunctionData>),
    #[serde(skip)]
    Unknown(UnknownNode),
}

/// Tags with a typed variant in `PolicyNode`.
pub const NODE_TYPES: [&str; 9] = [
    "TOPIC_FILTER",
    "CLIENT_FILTER",
    "DATA_POLICY",
    "BEHAVIOR_POLICY",
    "VALIDATOR",
    "SCHEMA",
    "OPERATION",
    "TRANSITION",
    "FUNCTION",
];

/// A node whose tag is not in `NODE_TYPES`, kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Serialize for PolicyNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PolicyNode::Unknown(node) => node.serialize(serializer),
            _ => PolicyNode::serialize(self, serializer),
        }
    }
}

impl<'de> Deserialize<'de> for PolicyNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let known = value
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|tag| NODE_TYPES.contains(&tag));

        if known {
            PolicyNode::deserialize(value).map_err(D::Error::custom)
        } else {
            UnknownNode::deserialize(value)
                .map(PolicyNode::Unknown)
                .map_err(D::Error::custom)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeBase<D> {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    pub data: D,
}

impl<D> NodeBase<D> {
    pub fn new(id: impl Into<String>, data: D) -> Self {
        NodeBase {
            id: id.into(),
            position: None,
            data,
        }
    }
}

impl PolicyNode {
    pub fn id(&self) -> &str {
        match self {
            PolicyNode::TopicFilter(n) => &n.id,
            PolicyNode::ClientFilter(n) => &n.id,
            PolicyNode::DataPolicy(n) => &n.id,
            PolicyNode::BehaviorPolicy(n) => &n.id,
            PolicyNode::Validator(n) => &n.id,
            PolicyNode::Schema(n) => &n.id,
            PolicyNode::Operation(n) => &n.id,
            PolicyNode::Transition(n) => &n.id,
            PolicyNode::Function(n) => &n.id,
            PolicyNode::Unknown(n) => &n.id,
        }
    }

    pub fn node_type(&self) -> &str {
        match self {
            PolicyNode::TopicFilter(_) => "TOPIC_FILTER",
            PolicyNode::ClientFilter(_) => "CLIENT_FILTER",
            PolicyNode::DataPolicy(_) => "DATA_POLICY",
            PolicyNode::BehaviorPolicy(_) => "BEHAVIOR_POLICY",
            PolicyNode::Validator(_) => "VALIDATOR",
            PolicyNode::Schema(_) => "SCHEMA",
            PolicyNode::Operation(_) => "OPERATION",
            PolicyNode::Transition(_) => "TRANSITION",
            PolicyNode::Function(_) => "FUNCTION",
            PolicyNode::Unknown(n) => &n.node_type,
        }
    }

    /// Policy containers bound a sub-flow: each owns the nodes wired to it.
    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            PolicyNode::DataPolicy(_) | PolicyNode::BehaviorPolicy(_)
        )
    }

    pub fn as_topic_filter(&self) -> Option<&TopicFilterData> {
        match self {
            PolicyNode::TopicFilter(n) => Some(&n.data),
            _ => None,
        }
    }

    pub fn as_client_filter(&self) -> Option<&ClientFilterData> {
        match self {
            PolicyNode::ClientFilter(n) => Some(&n.data),
            _ => None,
        }
    }

    pub fn as_validator(&self) -> Option<&ValidatorData> {
        match self {
            PolicyNode::Validator(n) => Some(&n.data),
            _ => None,
        }
    }

    pub fn as_schema(&self) -> Option<&SchemaData> {
        match self {
            PolicyNode::Schema(n) => Some(&n.data),
            _ => None,
        }
    }

    pub fn as_operation(&self) -> Option<&OperationData> {
        match self {
            PolicyNode::Operation(n) => Some(&n.data),
            _ => None,
        }
    }

    pub fn as_transition(&self) -> Option<&TransitionData> {
        match self {
            PolicyNode::Transition(n) => Some(&n.data),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionData> {
        match self {
            PolicyNode::Function(n) => Some(&n.data),
            _ => None,
        }
    }
}

// =============================================================================
// NODE DATA
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicFilterData {
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientFilterData {
    #[serde(default)]
    pub clients: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPolicyData {
    /// Policy id on the gateway. The node id is used when absent.
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorPolicyData {
    #[serde(default)]
    pub id: Option<String>,
    pub model: BehaviorPolicyType,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidatorType {
    #[serde(rename = "SCHEMA")]
    Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStrategy {
    AllOf,
    AnyOf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorData {
    #[serde(rename = "type")]
    pub validator_type: ValidatorType,
    pub strategy: ValidationStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    Json,
    Protobuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaData {
    pub id: String,
    pub version: String,
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(default)]
    pub schema_source: Option<String>,
    #[serde(default)]
    pub message_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationData {
    #[serde(default)]
    pub function_id: Option<String>,
    #[serde(default)]
    pub form_data: Map<String, Value>,
    #[serde(default)]
    pub is_terminal: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionData {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    /// Behavior model the transition was authored for.
    #[serde(rename = "type", default)]
    pub model: Option<BehaviorPolicyType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptLanguage {
    Javascript,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionData {
    pub name: String,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(rename = "type")]
    pub language: ScriptLanguage,
    #[serde(default)]
    pub source_code: String,
}
