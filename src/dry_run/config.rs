//! Dry-run settings.

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DryRunConfig {
    /// Upper bound on remote validation calls in flight for one run.
    pub max_concurrent_requests: usize,
}

impl Default for DryRunConfig {
    fn default() -> Self {
        DryRunConfig {
            max_concurrent_requests: 8,
        }
    }
}

impl DryRunConfig {
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub(crate) fn concurrency(&self) -> usize {
        self.max_concurrent_requests.max(1)
    }
}
