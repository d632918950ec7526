// src/api/mod.rs

use std::sync::Mutex;

use crate::goal::GoalError;
use crate::model::{GoalGrid, ObjectKind, PlacementObject, Position};

pub mod http;
pub use http::{ApiConfig, HttpMegaverseApi};

/// The result of one create or delete call.
///
/// A failed call is a value, never an `Err`: the submitter decides what to
/// do with it, and the orchestrator's no-abort contract depends on failures
/// staying data.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub success: bool,
    pub rate_limited: bool,
    pub error: Option<String>,
}

impl CallOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            rate_limited: false,
            error: None,
        }
    }

    pub fn failure(error: &str) -> Self {
        Self {
            success: false,
            rate_limited: false,
            error: Some(error.to_string()),
        }
    }

    /// A failure the server signalled as rate limiting; callers wait longer
    /// before trying again.
    pub fn rate_limited(error: &str) -> Self {
        Self {
            success: false,
            rate_limited: true,
            error: Some(error.to_string()),
        }
    }
}

/// Abstracts the remote object-placement endpoint so the pipeline can run
/// against the real service, a dry-run recorder, or a test stub.
pub trait MegaverseApi: Send + Sync {
    /// Issues one create call. Not assumed idempotent server-side.
    fn create_object(&self, object: &PlacementObject) -> CallOutcome;

    /// Issues one delete call for whatever occupies `position`.
    fn delete_object(&self, kind: ObjectKind, position: Position) -> CallOutcome;

    /// Fetches the full goal grid in a single request.
    fn fetch_goal(&self) -> Result<GoalGrid, GoalError>;
}

/// A call the [`DryRunApi`] accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedCall {
    pub action: CallAction,
    pub kind: ObjectKind,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallAction {
    Create,
    Delete,
}

/// In-memory endpoint that records every call and always succeeds.
///
/// Backs the CLI dry-run mode and doubles as a stub in tests: the pipeline
/// above it cannot tell it apart from the real thing.
#[derive(Debug, Default)]
pub struct DryRunApi {
    goal: Option<GoalGrid>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl DryRunApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preloads the grid `fetch_goal` will serve.
    pub fn with_goal(mut self, goal: GoalGrid) -> Self {
        self.goal = Some(goal);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }
}

impl MegaverseApi for DryRunApi {
    fn create_object(&self, object: &PlacementObject) -> CallOutcome {
        self.calls.lock().expect("call log poisoned").push(RecordedCall {
            action: CallAction::Create,
            kind: object.kind(),
            position: object.position(),
        });
        CallOutcome::success()
    }

    fn delete_object(&self, kind: ObjectKind, position: Position) -> CallOutcome {
        self.calls.lock().expect("call log poisoned").push(RecordedCall {
            action: CallAction::Delete,
            kind,
            position,
        });
        CallOutcome::success()
    }

    fn fetch_goal(&self) -> Result<GoalGrid, GoalError> {
        self.goal.clone().ok_or(GoalError::MissingGrid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_constructors() {
        let ok = CallOutcome::success();
        assert!(ok.success && !ok.rate_limited && ok.error.is_none());

        let failed = CallOutcome::failure("boom");
        assert!(!failed.success && !failed.rate_limited);
        assert_eq!(failed.error.as_deref(), Some("boom"));

        let throttled = CallOutcome::rate_limited("too many requests");
        assert!(!throttled.success && throttled.rate_limited);
    }

    #[test]
    fn dry_run_records_calls_in_order() {
        let api = DryRunApi::new();
        let polyanet = PlacementObject::Polyanet(Position::new(1, 2));

        assert!(api.create_object(&polyanet).success);
        assert!(api.delete_object(ObjectKind::Polyanet, Position::new(1, 2)).success);

        let calls = api.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].action, CallAction::Create);
        assert_eq!(calls[1].action, CallAction::Delete);
        assert_eq!(calls[0].position, Position::new(1, 2));
    }

    #[test]
    fn dry_run_goal_requires_preload() {
        let api = DryRunApi::new();
        assert!(matches!(api.fetch_goal(), Err(GoalError::MissingGrid)));

        let grid = vec![vec!["SPACE".to_string()]];
        let api = DryRunApi::new().with_goal(grid.clone());
        assert_eq!(api.fetch_goal().unwrap(), grid);
    }
}
