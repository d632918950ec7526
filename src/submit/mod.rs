// src/submit/mod.rs

use std::time::Duration;

use tracing::{debug, warn};

use crate::api::{CallOutcome, MegaverseApi};
use crate::model::{ObjectKind, PlacementObject, Position};

/// How many times one object is tried, and how long to wait between tries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum network calls per object.
    pub max_attempts: u32,
    /// Ordinary backoff unit; attempt `a` waits `base_delay * a`.
    pub base_delay: Duration,
    /// Rate-limit backoff unit; attempt `a` waits `rate_limit_delay * a`
    /// instead of (never in addition to) the ordinary backoff.
    pub rate_limit_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            rate_limit_delay: Duration::from_millis(2000),
        }
    }
}

/// Wall-clock suspension, behind a seam so tests can observe requested
/// waits instead of serving them.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// The real thing.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// The recorded result of driving one object to success or giving up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub position: Position,
    pub kind: ObjectKind,
    pub success: bool,
    pub error: Option<String>,
}

impl SubmissionOutcome {
    pub fn success(position: Position, kind: ObjectKind) -> Self {
        Self {
            position,
            kind,
            success: true,
            error: None,
        }
    }

    pub fn failure(position: Position, kind: ObjectKind, error: &str) -> Self {
        Self {
            position,
            kind,
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Drives a single create or delete call to completion with retries.
///
/// Exactly one outcome comes back per object, after at most
/// `policy.max_attempts` network calls. Failures are returned, never thrown.
pub struct Submitter<'a> {
    api: &'a dyn MegaverseApi,
    policy: RetryPolicy,
    sleeper: &'a dyn Sleeper,
}

impl<'a> Submitter<'a> {
    pub fn new(api: &'a dyn MegaverseApi, policy: RetryPolicy, sleeper: &'a dyn Sleeper) -> Self {
        Self {
            api,
            policy,
            sleeper,
        }
    }

    pub fn submit(&self, object: &PlacementObject) -> SubmissionOutcome {
        self.drive(object.kind(), object.position(), || {
            self.api.create_object(object)
        })
    }

    pub fn delete(&self, kind: ObjectKind, position: Position) -> SubmissionOutcome {
        self.drive(kind, position, || self.api.delete_object(kind, position))
    }

    fn drive(
        &self,
        kind: ObjectKind,
        position: Position,
        call: impl Fn() -> CallOutcome,
    ) -> SubmissionOutcome {
        let mut last_error = String::from("unknown error");

        for attempt in 1..=self.policy.max_attempts {
            let outcome = call();
            if outcome.success {
                debug!(%kind, %position, attempt, "call succeeded");
                return SubmissionOutcome::success(position, kind);
            }

            if let Some(error) = outcome.error {
                last_error = error;
            }

            if attempt < self.policy.max_attempts {
                let delay = if outcome.rate_limited {
                    self.policy.rate_limit_delay * attempt
                } else {
                    self.policy.base_delay * attempt
                };
                warn!(
                    %kind,
                    %position,
                    attempt,
                    rate_limited = outcome.rate_limited,
                    error = %last_error,
                    "call failed, retrying in {:?}",
                    delay
                );
                self.sleeper.sleep(delay);
            }
        }

        SubmissionOutcome::failure(
            position,
            kind,
            &format!(
                "Failed after {} attempts. Last error: {}",
                self.policy.max_attempts, last_error
            ),
        )
    }
}
