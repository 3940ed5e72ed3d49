//! Error types shared across all phases.
//!
//! Two families live here. `PolicyCheckError` is a structural problem found in
//! the user's graph: it is data, attached to the offending node and returned
//! inside a `DryRunResult`. `PolicyError` is a hard failure of the caller
//! (unsupported dispatch, unknown node, malformed snapshot) and is returned
//! through `Result`.

use serde::{Deserialize, Serialize};

use crate::parse::types::PolicyNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckErrorKind {
    NotConnected,
    Cardinality,
    NotConfigured,
}

impl std::fmt::Display for CheckErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckErrorKind::NotConnected => write!(f, "notConnected"),
            CheckErrorKind::Cardinality => write!(f, "cardinality"),
            CheckErrorKind::NotConfigured => write!(f, "notConfigured"),
        }
    }
}

/// A structural problem attributed to one node of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCheckError {
    #[serde(rename = "type")]
    pub kind: CheckErrorKind,
    /// Id of the offending node.
    pub id: String,
    /// Type tag of the offending node.
    pub title: String,
    pub detail: String,
}

impl std::fmt::Display for PolicyCheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} (node '{}' of type {})",
            self.kind, self.detail, self.id, self.title
        )
    }
}

impl PolicyCheckError {
    fn new(kind: CheckErrorKind, node: &PolicyNode, detail: String) -> Self {
        PolicyCheckError {
            kind,
            id: node.id().to_string(),
            title: node.node_type().to_string(),
            detail,
        }
    }

    /// `node` is missing a connection to a node of `expected` type.
    pub fn not_connected(node: &PolicyNode, expected: &str, handle: Option<&str>) -> Self {
        let detail = match handle {
            Some(h) => format!(
                "No node of type {} is connected to the '{}' handle of {}",
                expected,
                h,
                node.node_type()
            ),
            None => format!(
                "No node of type {} is connected to {}",
                expected,
                node.node_type()
            ),
        };
        Self::new(CheckErrorKind::NotConnected, node, detail)
    }

    /// `node` is one connection too many into `target`.
    pub fn cardinality(node: &PolicyNode, target: &PolicyNode) -> Self {
        Self::new(
            CheckErrorKind::Cardinality,
            node,
            format!(
                "Only one node of type {} can be connected to {} '{}'",
                node.node_type(),
                target.node_type(),
                target.id()
            ),
        )
    }

    /// Replaces the generated message.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// `node` is connected but a required property is not filled in.
    pub fn not_configured(node: &PolicyNode, detail: impl Into<String>) -> Self {
        Self::new(CheckErrorKind::NotConfigured, node, detail.into())
    }
}

/// Hard failures. Returned through `Result`, never stored in a result tree.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Policy Type not supported : {0}")]
    UnsupportedPolicyType(String),

    #[error("Node '{0}' not found in the workspace")]
    NodeNotFound(String),

    #[error("Failed to parse workspace JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
