//! Dry-run orchestration against scripted endpoints.

#[allow(dead_code)]
mod helpers;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use helpers::*;
use policy_compiler::dry_run::{
    DryRunConfig, DryRunEndpoint, DryRunRequest, DryRunSession, DryRunStatus, EndpointError,
    OfflineEndpoint, PolicyChecker, PolicyDryRunReport, check_policy_async,
    submittable_resources,
};
use policy_compiler::compile::compile_policy;
use policy_compiler::error::PolicyError;
use policy_compiler::parse::{PolicyGraph, handles};
use tokio::sync::Notify;

/// Records every request and rejects the node ids it was told to.
#[derive(Default)]
struct ScriptedEndpoint {
    reject: Vec<&'static str>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedEndpoint {
    fn rejecting(ids: &[&'static str]) -> Self {
        ScriptedEndpoint {
            reject: ids.to_vec(),
            ..Default::default()
        }
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl DryRunEndpoint for ScriptedEndpoint {
    async fn dry_run(&self, request: &DryRunRequest) -> Result<(), EndpointError> {
        self.seen.lock().unwrap().push(request.node_id.clone());
        if self.reject.contains(&request.node_id.as_str()) {
            return Err(EndpointError::new(format!("{} rejected", request.node_id)));
        }
        Ok(())
    }
}

/// Holds the very first call until `gate` is notified.
struct GatedEndpoint {
    gate: Arc<Notify>,
    calls: AtomicUsize,
}

#[async_trait]
impl DryRunEndpoint for GatedEndpoint {
    async fn dry_run(&self, _request: &DryRunRequest) -> Result<(), EndpointError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.gate.notified().await;
        }
        Ok(())
    }
}

fn empty_report(status: DryRunStatus) -> PolicyDryRunReport {
    PolicyDryRunReport {
        status,
        errors: vec![],
        failures: vec![],
        results: vec![],
        policy: None,
        submitted: 0,
    }
}

// =============================================================================
// Resource selection
// =============================================================================

#[test]
fn only_resources_are_submitted() {
    let state = complete_data_policy();
    let graph = PolicyGraph::build(&state);
    let compilation = compile_policy(graph.node("policy-1").unwrap(), &graph).unwrap();

    let requests: Vec<_> = submittable_resources(&compilation.results)
        .into_iter()
        .map(|r| (r.node_id, r.payload.kind()))
        .collect();
    assert_eq!(
        requests,
        vec![
            ("validator-1".to_string(), "validator"),
            ("schema-1".to_string(), "schema"),
            ("op-log".to_string(), "operation"),
            ("op-redirect".to_string(), "operation"),
            ("op-drop".to_string(), "operation"),
        ]
    );
}

// =============================================================================
// check_policy_async
// =============================================================================

#[tokio::test]
async fn valid_policy_dry_run_succeeds() {
    let state = complete_data_policy();
    let endpoint = ScriptedEndpoint::default();
    let node = state.node("policy-1").unwrap();

    let report = check_policy_async(node, &state, &endpoint, &DryRunConfig::default())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.submitted, 5);
    assert_eq!(endpoint.seen().len(), 5);
    assert!(report.policy.is_some());
}

#[tokio::test]
async fn remote_failure_does_not_cancel_other_calls() {
    let state = complete_data_policy();
    let endpoint = ScriptedEndpoint::rejecting(&["schema-1"]);
    let node = state.node("policy-1").unwrap();
    let config = DryRunConfig {
        max_concurrent_requests: 2,
    };

    let report = check_policy_async(node, &state, &endpoint, &config)
        .await
        .unwrap();

    assert_eq!(report.status, DryRunStatus::Failure);
    assert!(report.errors.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].node_id, "schema-1");
    assert_eq!(report.failures[0].resource, "schema");
    assert_eq!(report.failures[0].message, "schema-1 rejected");

    let mut seen = endpoint.seen();
    seen.sort();
    assert_eq!(
        seen,
        vec!["op-drop", "op-log", "op-redirect", "schema-1", "validator-1"]
    );
}

#[tokio::test]
async fn structural_errors_fail_the_run() {
    let state = workspace(
        vec![topic_filter("t", &["a/b"]), data_policy("p")],
        vec![wire("t", handles::OUTPUT, "p", handles::TOPIC_FILTER)],
    );
    let endpoint = ScriptedEndpoint::default();

    let report = check_policy_async(
        state.node("p").unwrap(),
        &state,
        &endpoint,
        &DryRunConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.status, DryRunStatus::Failure);
    assert_eq!(report.errors.len(), 1);
    assert!(report.failures.is_empty());
    assert_eq!(report.submitted, 0);
    assert!(report.policy.is_none());
}

#[tokio::test]
async fn non_policy_node_is_rejected() {
    let state = complete_data_policy();
    let endpoint = ScriptedEndpoint::default();

    let err = check_policy_async(
        state.node("topic-1").unwrap(),
        &state,
        &endpoint,
        &DryRunConfig::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "Policy Type not supported : TOPIC_FILTER");
    assert!(endpoint.seen().is_empty());
}

#[tokio::test]
async fn offline_endpoint_rejects_malformed_schema() {
    let state = workspace(
        vec![
            topic_filter("t", &["a/b"]),
            json_schema("s", "broken", "{\"type\": "),
            validator("v"),
            data_policy("p"),
        ],
        vec![
            wire("t", handles::OUTPUT, "p", handles::TOPIC_FILTER),
            edge("s", "v"),
            wire("v", handles::OUTPUT, "p", handles::VALIDATION),
        ],
    );

    let report = check_policy_async(
        state.node("p").unwrap(),
        &state,
        &OfflineEndpoint,
        &DryRunConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.status, DryRunStatus::Failure);
    assert!(report.errors.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].node_id, "s");
    assert!(report.failures[0].message.contains("not valid JSON"));
}

// =============================================================================
// Session and checker
// =============================================================================

#[test]
fn session_discards_superseded_report() {
    let session = DryRunSession::new();
    assert_eq!(session.status(), DryRunStatus::Idle);

    let first = session.begin();
    let second = session.begin();
    assert_eq!(session.status(), DryRunStatus::Running);

    assert!(!session.complete(first, empty_report(DryRunStatus::Failure)));
    assert_eq!(session.status(), DryRunStatus::Running);

    assert!(session.complete(second, empty_report(DryRunStatus::Success)));
    assert_eq!(session.status(), DryRunStatus::Success);
    assert!(session.report().is_some());

    session.reset();
    assert_eq!(session.status(), DryRunStatus::Idle);
    assert!(session.report().is_none());
}

#[test]
fn reset_supersedes_running_dry_run() {
    let session = DryRunSession::new();
    let token = session.begin();
    session.reset();

    assert!(!session.is_current(token));
    assert!(!session.complete(token, empty_report(DryRunStatus::Success)));
    assert_eq!(session.status(), DryRunStatus::Idle);
}

#[tokio::test]
async fn checker_tracks_status() {
    let state = complete_data_policy();
    let checker = PolicyChecker::new(OfflineEndpoint, DryRunConfig::default());
    assert_eq!(checker.status(), DryRunStatus::Idle);

    let report = checker.run("policy-1", &state).await.unwrap().unwrap();
    assert!(report.is_success());
    assert_eq!(checker.status(), DryRunStatus::Success);
    assert_eq!(checker.session().report().unwrap().submitted, 5);

    checker.reset();
    assert_eq!(checker.status(), DryRunStatus::Idle);
}

#[tokio::test]
async fn checker_resets_on_unknown_node() {
    let state = complete_data_policy();
    let checker = PolicyChecker::new(OfflineEndpoint, DryRunConfig::default());

    let err = checker.run("ghost", &state).await.unwrap_err();
    assert!(matches!(err, PolicyError::NodeNotFound(_)));
    assert_eq!(checker.status(), DryRunStatus::Idle);
}

#[tokio::test]
async fn newer_run_wins_over_slower_one() {
    let state = complete_data_policy();
    let gate = Arc::new(Notify::new());
    let checker = PolicyChecker::new(
        GatedEndpoint {
            gate: gate.clone(),
            calls: AtomicUsize::new(0),
        },
        DryRunConfig::default(),
    );

    let (slow, fast) = tokio::join!(checker.run("policy-1", &state), async {
        let report = checker.run("policy-1", &state).await;
        gate.notify_one();
        report
    });

    assert!(slow.unwrap().is_none());
    assert!(fast.unwrap().is_some());
    assert_eq!(checker.status(), DryRunStatus::Success);
}
