//! Remote validation seam.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::parse::types::SchemaType;
use crate::resolve::PolicyPayload;

/// One resource submitted for remote validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunRequest {
    pub node_id: String,
    pub node_type: String,
    pub payload: PolicyPayload,
}

/// Rejection message returned by the validation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EndpointError {
    pub message: String,
}

impl EndpointError {
    pub fn new(message: impl Into<String>) -> Self {
        EndpointError {
            message: message.into(),
        }
    }
}

/// Validates a single resource without persisting it.
///
/// Calls for different resources are independent and may run concurrently.
#[async_trait]
pub trait DryRunEndpoint: Send + Sync {
    async fn dry_run(&self, request: &DryRunRequest) -> Result<(), EndpointError>;
}

/// Endpoint performing the checks that need no gateway.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineEndpoint;

#[async_trait]
impl DryRunEndpoint for OfflineEndpoint {
    async fn dry_run(&self, request: &DryRunRequest) -> Result<(), EndpointError> {
        offline_check(&request.payload)
    }
}

pub fn offline_check(payload: &PolicyPayload) -> Result<(), EndpointError> {
    match payload {
        PolicyPayload::Schema(schema) => match (schema.schema_type, &schema.schema_definition) {
            (SchemaType::Json, Some(source)) => match serde_json::from_str::<Value>(source) {
                Ok(Value::Object(_)) | Ok(Value::Bool(_)) => Ok(()),
                Ok(_) => Err(EndpointError::new(format!(
                    "Schema '{}' is not a JSON schema object",
                    schema.id
                ))),
                Err(e) => Err(EndpointError::new(format!(
                    "Schema '{}' is not valid JSON: {}",
                    schema.id, e
                ))),
            },
            (SchemaType::Protobuf, _) if schema.message_type.is_none() => Err(EndpointError::new(
                format!("Protobuf schema '{}' requires a message type", schema.id),
            )),
            _ => Ok(()),
        },
        PolicyPayload::Script(script) if script.source.trim().is_empty() => Err(
            EndpointError::new(format!("Function '{}' has no source code", script.id)),
        ),
        PolicyPayload::Validator(validator) if validator.arguments.schemas.is_empty() => {
            Err(EndpointError::new("Validator references no schema"))
        }
        _ => Ok(()),
    }
}
