//! Parse phase: JSON → Rust types + graph index.

pub mod graph;
pub mod types;

pub use graph::{PolicyGraph, SubFlow};
pub use types::*;

use crate::error::PolicyError;

/// Deserialize a workspace JSON string into a `WorkspaceState`.
pub fn parse(json: &str) -> Result<WorkspaceState, PolicyError> {
    Ok(serde_json::from_str::<WorkspaceState>(json)?)
}
