// src/run/mod.rs

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

use crate::api::MegaverseApi;
use crate::model::{PlacementObject, TargetObjectSet};
use crate::report::BatchResult;
use crate::submit::{RetryPolicy, Sleeper, SubmissionOutcome, Submitter, ThreadSleeper};

static WALL_CLOCK: ThreadSleeper = ThreadSleeper;

/// Knobs for one creation or deletion run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Minimum spacing between consecutive calls across the whole run;
    /// independent of the submitter's retry backoff.
    pub pace_delay: Duration,
    /// Submissions in flight at once. 1 keeps strict sequential ordering.
    pub concurrency: usize,
    pub retry: RetryPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pace_delay: Duration::from_millis(1000),
            concurrency: 1,
            retry: RetryPolicy::default(),
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pace_delay(mut self, pace_delay: Duration) -> Self {
        self.pace_delay = pace_delay;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Externally trippable stop signal. Once cancelled, no new submissions are
/// dispatched; in-flight ones finish and their outcomes are kept.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Shared pacing gate. Every worker books the next allowed instant under
/// one lock, so the aggregate call rate never exceeds one call per
/// interval no matter the concurrency level.
struct Pacer {
    interval: Duration,
    next: Mutex<Option<Instant>>,
}

impl Pacer {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Mutex::new(None),
        }
    }

    fn pace(&self, sleeper: &dyn Sleeper) {
        if self.interval.is_zero() {
            return;
        }
        let wait = {
            let mut next = self.next.lock().expect("pacer poisoned");
            let now = Instant::now();
            match *next {
                None => {
                    *next = Some(now + self.interval);
                    None
                }
                Some(at) if at <= now => {
                    *next = Some(now + self.interval);
                    None
                }
                Some(at) => {
                    *next = Some(at + self.interval);
                    Some(at - now)
                }
            }
        };
        if let Some(wait) = wait {
            sleeper.sleep(wait);
        }
    }
}

#[derive(Clone, Copy)]
enum Action {
    Create,
    Delete,
}

/// Drives a whole target set through the submitter, kind by kind.
///
/// Polyanets go first, then soloons, then comeths; the kind boundary is a
/// barrier even under concurrency, because a soloon or cometh may require
/// an adjacent polyanet to exist on the server. Individual failures never
/// stop the run.
pub struct Orchestrator<'a> {
    api: &'a dyn MegaverseApi,
    config: RunConfig,
    sleeper: &'a dyn Sleeper,
    cancel: CancelToken,
}

impl<'a> Orchestrator<'a> {
    pub fn new(api: &'a dyn MegaverseApi, config: RunConfig) -> Self {
        Self {
            api,
            config,
            sleeper: &WALL_CLOCK,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: &'a dyn Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Uses an externally created token, e.g. one already wired to a
    /// shutdown signal.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle for external shutdown; trip it to stop dispatching.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Creates every object in the target set. Returns the (possibly
    /// partial, if cancelled) aggregate of all recorded outcomes.
    pub fn build(&self, target: &TargetObjectSet) -> BatchResult {
        info!(objects = target.total_objects(), "starting creation run");
        let pacer = Pacer::new(self.config.pace_delay);
        let mut result = BatchResult::new();
        for phase in [&target.polyanets, &target.soloons, &target.comeths] {
            self.run_phase(phase, Action::Create, &pacer, &mut result);
        }
        result
    }

    /// Deletes every object in the target set, dependents first (comeths,
    /// soloons, then polyanets).
    pub fn clear(&self, target: &TargetObjectSet) -> BatchResult {
        info!(objects = target.total_objects(), "starting deletion run");
        let pacer = Pacer::new(self.config.pace_delay);
        let mut result = BatchResult::new();
        for phase in [&target.comeths, &target.soloons, &target.polyanets] {
            self.run_phase(phase, Action::Delete, &pacer, &mut result);
        }
        result
    }

    fn run_phase(
        &self,
        objects: &[PlacementObject],
        action: Action,
        pacer: &Pacer,
        result: &mut BatchResult,
    ) {
        if objects.is_empty() || self.cancel.is_cancelled() {
            return;
        }
        if self.config.concurrency <= 1 {
            self.run_phase_sequential(objects, action, pacer, result);
        } else {
            self.run_phase_concurrent(objects, action, pacer, result);
        }
    }

    fn perform(
        &self,
        submitter: &Submitter<'_>,
        action: Action,
        object: &PlacementObject,
    ) -> SubmissionOutcome {
        match action {
            Action::Create => submitter.submit(object),
            Action::Delete => submitter.delete(object.kind(), object.position()),
        }
    }

    fn run_phase_sequential(
        &self,
        objects: &[PlacementObject],
        action: Action,
        pacer: &Pacer,
        result: &mut BatchResult,
    ) {
        let submitter = Submitter::new(self.api, self.config.retry.clone(), self.sleeper);
        for object in objects {
            if self.cancel.is_cancelled() {
                info!("cancellation requested, stopping dispatch");
                break;
            }
            pacer.pace(self.sleeper);
            result.record(self.perform(&submitter, action, object));
        }
    }

    fn run_phase_concurrent(
        &self,
        objects: &[PlacementObject],
        action: Action,
        pacer: &Pacer,
        result: &mut BatchResult,
    ) {
        let next = AtomicUsize::new(0);
        let outcomes: Mutex<Vec<(usize, SubmissionOutcome)>> =
            Mutex::new(Vec::with_capacity(objects.len()));
        let workers = self.config.concurrency.min(objects.len());

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    let submitter =
                        Submitter::new(self.api, self.config.retry.clone(), self.sleeper);
                    loop {
                        if self.cancel.is_cancelled() {
                            break;
                        }
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        if index >= objects.len() {
                            break;
                        }
                        pacer.pace(self.sleeper);
                        let outcome = self.perform(&submitter, action, &objects[index]);
                        outcomes
                            .lock()
                            .expect("outcome sink poisoned")
                            .push((index, outcome));
                    }
                });
            }
        });

        let mut collected = outcomes.into_inner().expect("outcome sink poisoned");
        collected.sort_by_key(|(index, _)| *index);
        for (_, outcome) in collected {
            result.record(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CallOutcome;
    use crate::goal::GoalError;
    use crate::model::{ComethDirection, GoalGrid, ObjectKind, Position, SoloonColor};

    struct NoSleep;

    impl Sleeper for NoSleep {
        fn sleep(&self, _duration: Duration) {}
    }

    /// Records requested waits instead of serving them.
    #[derive(Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    /// Stub endpoint with a per-call kind log and scripted failures.
    #[derive(Default)]
    struct LoggingApi {
        kinds_seen: Mutex<Vec<ObjectKind>>,
        fail_at: Option<Position>,
        cancel_after_first: Option<CancelToken>,
    }

    impl LoggingApi {
        fn kinds(&self) -> Vec<ObjectKind> {
            self.kinds_seen.lock().unwrap().clone()
        }
    }

    impl MegaverseApi for LoggingApi {
        fn create_object(&self, object: &PlacementObject) -> CallOutcome {
            self.kinds_seen.lock().unwrap().push(object.kind());
            if let Some(token) = &self.cancel_after_first {
                token.cancel();
            }
            if self.fail_at == Some(object.position()) {
                CallOutcome::failure("scripted failure")
            } else {
                CallOutcome::success()
            }
        }

        fn delete_object(&self, kind: ObjectKind, _position: Position) -> CallOutcome {
            self.kinds_seen.lock().unwrap().push(kind);
            CallOutcome::success()
        }

        fn fetch_goal(&self) -> Result<GoalGrid, GoalError> {
            Err(GoalError::MissingGrid)
        }
    }

    fn mixed_target() -> TargetObjectSet {
        let mut target = TargetObjectSet::new();
        for c in 0..3 {
            target
                .polyanets
                .push(PlacementObject::Polyanet(Position::new(0, c)));
        }
        for c in 0..2 {
            target
                .soloons
                .push(PlacementObject::Soloon(Position::new(1, c), SoloonColor::Blue));
        }
        target
            .comeths
            .push(PlacementObject::Cometh(Position::new(2, 0), ComethDirection::Up));
        target
    }

    fn fast_config() -> RunConfig {
        RunConfig::new()
            .with_pace_delay(Duration::ZERO)
            .with_retry(RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::ZERO,
                rate_limit_delay: Duration::ZERO,
            })
    }

    #[test]
    fn submits_kinds_in_order_sequentially() {
        let api = LoggingApi::default();
        let orchestrator = Orchestrator::new(&api, fast_config()).with_sleeper(&NoSleep);

        let result = orchestrator.build(&mixed_target());
        assert_eq!(result.total, 6);
        assert!(result.is_fully_successful());
        assert_eq!(
            api.kinds(),
            vec![
                ObjectKind::Polyanet,
                ObjectKind::Polyanet,
                ObjectKind::Polyanet,
                ObjectKind::Soloon,
                ObjectKind::Soloon,
                ObjectKind::Cometh,
            ]
        );
    }

    #[test]
    fn kind_barrier_holds_under_concurrency() {
        let api = LoggingApi::default();
        let config = fast_config().with_concurrency(3);
        let orchestrator = Orchestrator::new(&api, config).with_sleeper(&NoSleep);

        let result = orchestrator.build(&mixed_target());
        assert_eq!(result.total, 6);

        let kinds = api.kinds();
        let last_polyanet = kinds
            .iter()
            .rposition(|k| *k == ObjectKind::Polyanet)
            .unwrap();
        let first_soloon = kinds.iter().position(|k| *k == ObjectKind::Soloon).unwrap();
        let first_cometh = kinds.iter().position(|k| *k == ObjectKind::Cometh).unwrap();
        assert!(last_polyanet < first_soloon);
        assert!(first_soloon < first_cometh);
    }

    #[test]
    fn one_failure_does_not_stop_the_run() {
        let api = LoggingApi {
            fail_at: Some(Position::new(0, 1)),
            ..LoggingApi::default()
        };
        let orchestrator = Orchestrator::new(&api, fast_config()).with_sleeper(&NoSleep);

        let result = orchestrator.build(&mixed_target());
        assert_eq!(result.total, 6);
        assert_eq!(result.failed, 1);
        assert_eq!(result.succeeded, 5);
        assert_eq!(result.failures[0].position, Position::new(0, 1));
    }

    #[test]
    fn cancellation_returns_partial_result() {
        // The token trips from inside the first call, as an external
        // shutdown would mid-run.
        let token = CancelToken::new();
        let api = LoggingApi {
            cancel_after_first: Some(token.clone()),
            ..LoggingApi::default()
        };
        let orchestrator = Orchestrator::new(&api, fast_config())
            .with_sleeper(&NoSleep)
            .with_cancel_token(token);

        let result = orchestrator.build(&mixed_target());
        assert_eq!(result.total, 1);
        assert_eq!(api.kinds().len(), 1);
    }

    #[test]
    fn pacing_waits_between_consecutive_submissions() {
        let api = LoggingApi::default();
        let sleeper = RecordingSleeper::default();
        let config = fast_config().with_pace_delay(Duration::from_millis(1000));
        let orchestrator = Orchestrator::new(&api, config).with_sleeper(&sleeper);

        let mut target = TargetObjectSet::new();
        for c in 0..3 {
            target
                .polyanets
                .push(PlacementObject::Polyanet(Position::new(0, c)));
        }
        orchestrator.build(&target);

        // First dispatch goes straight through; the next two are paced.
        let waits = sleeper.slept.lock().unwrap().clone();
        assert_eq!(waits.len(), 2);
        assert!(waits[0] <= Duration::from_millis(1000));
        assert!(waits[0] >= Duration::from_millis(900));
    }

    #[test]
    fn clear_deletes_dependents_first() {
        let api = LoggingApi::default();
        let orchestrator = Orchestrator::new(&api, fast_config()).with_sleeper(&NoSleep);

        let result = orchestrator.clear(&mixed_target());
        assert_eq!(result.total, 6);
        assert_eq!(
            api.kinds(),
            vec![
                ObjectKind::Cometh,
                ObjectKind::Soloon,
                ObjectKind::Soloon,
                ObjectKind::Polyanet,
                ObjectKind::Polyanet,
                ObjectKind::Polyanet,
            ]
        );
    }
}
