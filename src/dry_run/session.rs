//! Dry-run status tracking across runs.
//!
//! `IDLE → RUNNING → {SUCCESS | FAILURE} → IDLE`. Every `begin` issues a new
//! run token; completions carrying an older token are discarded so a slow,
//! superseded run cannot overwrite a newer report.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::PolicyDryRunReport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DryRunStatus {
    #[default]
    Idle,
    Running,
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunToken {
    generation: u64,
}

#[derive(Debug, Default)]
struct SessionState {
    status: DryRunStatus,
    report: Option<PolicyDryRunReport>,
}

#[derive(Debug, Default)]
pub struct DryRunSession {
    generation: AtomicU64,
    state: Mutex<SessionState>,
}

impl DryRunSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> DryRunStatus {
        self.state().status
    }

    pub fn report(&self) -> Option<PolicyDryRunReport> {
        self.state().report.clone()
    }

    /// Start a run. Any run still in flight is superseded.
    pub fn begin(&self) -> RunToken {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state();
        state.status = DryRunStatus::Running;
        state.report = None;
        RunToken { generation }
    }

    pub fn is_current(&self, token: RunToken) -> bool {
        self.generation.load(Ordering::SeqCst) == token.generation
    }

    /// Store the report of the run identified by `token`. Returns `false`
    /// and drops the report if a newer run started meanwhile.
    pub fn complete(&self, token: RunToken, report: PolicyDryRunReport) -> bool {
        let mut state = self.state();
        if !self.is_current(token) {
            debug!(
                generation = token.generation,
                "Discarding report of a superseded dry run"
            );
            return false;
        }
        state.status = report.status;
        state.report = Some(report);
        true
    }

    /// Back to `IDLE`. In-flight runs are superseded.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        state.status = DryRunStatus::Idle;
        state.report = None;
    }
}
