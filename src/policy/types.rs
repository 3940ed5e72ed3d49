//! Compiled policy objects, in the gateway's wire shape.
//!
//! These are produced by the compilers in `compile/` and handed to the
//! publish collaborator unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::parse::types::{ScriptLanguage, SchemaType, ValidationStrategy, ValidatorType};

// =============================================================================
// DATA POLICY
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPolicy {
    pub id: String,
    pub matching: DataPolicyMatching,
    pub validation: DataPolicyValidation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_success: Option<PolicyAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_error: Option<PolicyAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPolicyMatching {
    pub topic_filter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPolicyValidation {
    pub validators: Vec<DataPolicyValidator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPolicyValidator {
    #[serde(rename = "type")]
    pub validator_type: ValidatorType,
    pub arguments: ValidatorArguments,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorArguments {
    pub schemas: Vec<SchemaReference>,
    pub strategy: ValidationStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaReference {
    pub schema_id: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAction {
    pub pipeline: Vec<PolicyOperation>,
}

/// One step of an `onSuccess` / `onError` / transition pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyOperation {
    pub id: String,
    pub function_id: String,
    pub arguments: Map<String, Value>,
}

// =============================================================================
// RESOURCES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySchema {
    pub id: String,
    pub version: String,
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
}

impl PolicySchema {
    pub fn reference(&self) -> SchemaReference {
        SchemaReference {
            schema_id: self.id.clone(),
            version: self.version.clone(),
        }
    }
}

/// A transform function script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyScript {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    pub function_type: ScriptLanguage,
    pub source: String,
}

// =============================================================================
// BEHAVIOR POLICY
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorPolicy {
    pub id: String,
    pub matching: BehaviorPolicyMatching,
    pub model: BehaviorModel,
    pub transitions: Vec<BehaviorPolicyTransition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorPolicyMatching {
    pub client_id_filter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorModel {
    pub id: String,
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorPolicyTransition {
    pub event: String,
    pub from_state: String,
    pub to_state: String,
    pub pipeline: Vec<PolicyOperation>,
}

/// Either compiled policy, for the publish collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CompiledPolicy {
    #[serde(rename = "dataPolicy")]
    Data(DataPolicy),
    #[serde(rename = "behaviorPolicy")]
    Behavior(BehaviorPolicy),
}

impl CompiledPolicy {
    pub fn id(&self) -> &str {
        match self {
            CompiledPolicy::Data(p) => &p.id,
            CompiledPolicy::Behavior(p) => &p.id,
        }
    }
}
