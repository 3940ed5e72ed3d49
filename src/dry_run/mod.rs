//! Dry-run orchestration.
//!
//! Compiles a policy node, submits every resolved resource to a validation
//! endpoint and folds structural errors and remote rejections into one report.
//! The two kinds stay in separate fields: a structural error means the graph
//! is malformed, a remote failure means a well-formed resource was rejected.

pub mod config;
pub mod endpoint;
pub mod session;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::compile::compile_policy;
use crate::error::{PolicyCheckError, PolicyError};
use crate::parse::graph::PolicyGraph;
use crate::parse::types::{PolicyNode, WorkspaceState};
use crate::policy::types::CompiledPolicy;
use crate::resolve::{DryRunResult, PolicyPayload, only_non_null_resources};

pub use config::DryRunConfig;
pub use endpoint::{DryRunEndpoint, DryRunRequest, EndpointError, OfflineEndpoint};
pub use session::{DryRunSession, DryRunStatus, RunToken};

/// A resource the endpoint rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFailure {
    pub node_id: String,
    pub resource: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDryRunReport {
    pub status: DryRunStatus,
    pub errors: Vec<PolicyCheckError>,
    pub failures: Vec<RemoteFailure>,
    pub results: Vec<DryRunResult<PolicyPayload>>,
    pub policy: Option<CompiledPolicy>,
    /// Number of resources sent to the endpoint.
    pub submitted: usize,
}

impl PolicyDryRunReport {
    pub fn is_success(&self) -> bool {
        self.status == DryRunStatus::Success
    }
}

/// Every result with data, followed by its nested resources with data,
/// restricted to payloads the endpoint accepts.
pub fn submittable_resources(results: &[DryRunResult<PolicyPayload>]) -> Vec<DryRunRequest> {
    results
        .iter()
        .fold(Vec::new(), |mut acc, result| {
            if result.data.is_some() {
                acc.push(result.clone());
            }
            only_non_null_resources(acc, result)
        })
        .into_iter()
        .filter_map(|r| match r.data {
            Some(payload) if payload.is_resource() => Some(DryRunRequest {
                node_id: r.node.id().to_string(),
                node_type: r.node.node_type().to_string(),
                payload,
            }),
            _ => None,
        })
        .collect()
}

/// Dry-run the policy `node` of `state`.
///
/// Rejects only when `node` is not a policy node. Every structural problem and
/// every endpoint rejection is reported in the returned report instead. One
/// failing resource never cancels the others.
#[instrument(skip_all, fields(node = node.id(), node_type = node.node_type()))]
pub async fn check_policy_async(
    node: &PolicyNode,
    state: &WorkspaceState,
    endpoint: &dyn DryRunEndpoint,
    config: &DryRunConfig,
) -> Result<PolicyDryRunReport, PolicyError> {
    let compilation = {
        let graph = PolicyGraph::build(state);
        compile_policy(node, &graph)?
    };
    let errors = compilation.errors();
    let requests = submittable_resources(&compilation.results);

    info!(
        structural_errors = errors.len(),
        resources = requests.len(),
        "Starting dry run"
    );

    let failures: Vec<RemoteFailure> = stream::iter(requests.iter())
        .map(|request| async move { (request, endpoint.dry_run(request).await) })
        .buffered(config.concurrency())
        .filter_map(|(request, outcome)| async move {
            outcome.err().map(|e| {
                warn!(node = %request.node_id, message = %e, "Resource rejected by dry run");
                RemoteFailure {
                    node_id: request.node_id.clone(),
                    resource: request.payload.kind().to_string(),
                    message: e.message,
                }
            })
        })
        .collect()
        .await;

    let status = if errors.is_empty() && failures.is_empty() {
        DryRunStatus::Success
    } else {
        DryRunStatus::Failure
    };

    info!(?status, remote_failures = failures.len(), "Dry run finished");

    Ok(PolicyDryRunReport {
        status,
        errors,
        failures,
        submitted: requests.len(),
        results: compilation.results,
        policy: compilation.policy,
    })
}

/// Runs dry runs against one endpoint and tracks their status.
///
/// Starting a run while another is in flight supersedes the older one: its
/// report is dropped when it arrives. Callers that want to ignore re-triggers
/// instead should check `status()` for `RUNNING` first.
pub struct PolicyChecker<E> {
    endpoint: E,
    config: DryRunConfig,
    session: DryRunSession,
}

impl<E: DryRunEndpoint> PolicyChecker<E> {
    pub fn new(endpoint: E, config: DryRunConfig) -> Self {
        PolicyChecker {
            endpoint,
            config,
            session: DryRunSession::new(),
        }
    }

    pub fn session(&self) -> &DryRunSession {
        &self.session
    }

    pub fn status(&self) -> DryRunStatus {
        self.session.status()
    }

    /// `Ok(None)` when a newer run superseded this one.
    pub async fn run(
        &self,
        node_id: &str,
        state: &WorkspaceState,
    ) -> Result<Option<PolicyDryRunReport>, PolicyError> {
        let token = self.session.begin();

        let outcome = match state.node(node_id) {
            Some(node) => check_policy_async(node, state, &self.endpoint, &self.config).await,
            None => Err(PolicyError::NodeNotFound(node_id.to_string())),
        };

        match outcome {
            Ok(report) => Ok(self
                .session
                .complete(token, report.clone())
                .then_some(report)),
            Err(e) => {
                if self.session.is_current(token) {
                    self.session.reset();
                }
                Err(e)
            }
        }
    }

    pub fn reset(&self) {
        self.session.reset();
    }
}
