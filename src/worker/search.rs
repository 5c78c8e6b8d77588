//! Single-threaded, cooperatively scheduled search loop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crossbeam_channel::unbounded;
use tracing::{debug, info, warn};

use crate::crypto::{KeySource, OsKeySource};
use crate::matcher::Pattern;

use super::handle::{CancelToken, SearchHandle};
use super::pool::WorkerPool;
use super::state::{SearchEvent, SearchState, Summary};

/// Attempt ceiling used when the caller does not set one.
pub const DEFAULT_MAX_ATTEMPTS: u64 = 1_000_000_000;

/// Attempts between progress reports and yields.
pub const DEFAULT_BATCH_SIZE: u64 = 1_000;

/// Progress cadence of the multi-threaded variant.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("a search is already running")]
    AlreadyRunning,

    #[error("target count must be at least 1")]
    InvalidTargetCount,

    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error("worker count must be at least 1")]
    InvalidWorkerCount,

    #[error("failed to spawn search thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("search thread panicked")]
    WorkerPanicked,
}

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub pattern: Pattern,
    pub target_count: usize,
    /// Hard ceiling on attempts; reaching it ends the run normally.
    pub max_attempts: u64,
    pub batch_size: u64,
    pub progress_interval: Duration,
}

impl SearchParams {
    pub fn new(pattern: Pattern, target_count: usize) -> Self {
        Self {
            pattern,
            target_count,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    fn check(&self) -> Result<(), EngineError> {
        if self.target_count == 0 {
            return Err(EngineError::InvalidTargetCount);
        }
        if self.batch_size == 0 {
            return Err(EngineError::InvalidBatchSize);
        }
        Ok(())
    }
}

/// Called between batches so the host can service other work.
pub trait YieldHook {
    fn yield_now(&mut self);
}

/// Does nothing between batches.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoYield;

impl YieldHook for NoYield {
    fn yield_now(&mut self) {}
}

/// Gives up the rest of the time slice between batches.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadYield;

impl YieldHook for ThreadYield {
    fn yield_now(&mut self) {
        thread::yield_now();
    }
}

impl<F: FnMut()> YieldHook for F {
    fn yield_now(&mut self) {
        self()
    }
}

type ActiveSlot = Arc<Mutex<Option<CancelToken>>>;

fn lock(slot: &ActiveSlot) -> MutexGuard<'_, Option<CancelToken>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks the engine as running until dropped.
struct RunGuard {
    slot: ActiveSlot,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        lock(&self.slot).take();
    }
}

/// Runs searches, at most one at a time.
///
/// Clones share the same running state, so a clone can cancel a run started
/// from another clone.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    active: ActiveSlot,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.active).is_some()
    }

    /// Requests cancellation of the current run. No-op when idle.
    pub fn cancel(&self) {
        if let Some(token) = lock(&self.active).as_ref() {
            token.cancel();
        }
    }

    fn acquire(&self, params: &SearchParams) -> Result<(RunGuard, CancelToken), EngineError> {
        params.check()?;
        let mut active = lock(&self.active);
        if active.is_some() {
            return Err(EngineError::AlreadyRunning);
        }
        let token = CancelToken::new();
        *active = Some(token.clone());
        Ok((
            RunGuard {
                slot: self.active.clone(),
            },
            token,
        ))
    }

    /// Runs a search on the calling thread.
    ///
    /// `sink` receives every event, ending with `Finished`. `hook` runs after
    /// each batch of attempts.
    pub fn run<K, S, Y>(
        &self,
        params: &SearchParams,
        source: &mut K,
        mut sink: S,
        hook: &mut Y,
    ) -> Result<Summary, EngineError>
    where
        K: KeySource + ?Sized,
        S: FnMut(SearchEvent),
        Y: YieldHook + ?Sized,
    {
        let (_guard, token) = self.acquire(params)?;
        Ok(search_loop(params, source, &token, &mut sink, hook))
    }

    /// Runs a search on a background thread with OS entropy.
    pub fn spawn(&self, params: SearchParams) -> Result<SearchHandle, EngineError> {
        self.spawn_with(params, OsKeySource::new())
    }

    /// Runs a search on a background thread with the given key source.
    pub fn spawn_with<K>(&self, params: SearchParams, mut source: K) -> Result<SearchHandle, EngineError>
    where
        K: KeySource + Send + 'static,
    {
        let (guard, token) = self.acquire(&params)?;
        let (tx, rx) = unbounded();
        let run_token = token.clone();

        let thread = thread::Builder::new()
            .name("vanity-search".into())
            .spawn(move || {
                let _guard = guard;
                let mut sink = |event: SearchEvent| {
                    let _ = tx.send(event);
                };
                search_loop(&params, &mut source, &run_token, &mut sink, &mut ThreadYield)
            })?;

        Ok(SearchHandle::new(rx, token, thread))
    }

    /// Runs a search across `workers` CPU threads.
    pub fn spawn_parallel(
        &self,
        params: SearchParams,
        workers: usize,
    ) -> Result<SearchHandle, EngineError> {
        if workers == 0 {
            return Err(EngineError::InvalidWorkerCount);
        }
        let (guard, token) = self.acquire(&params)?;
        let pool = WorkerPool::new(workers, &params, token.clone())?;
        let (tx, rx) = unbounded();
        let run_token = token.clone();

        let thread = thread::Builder::new()
            .name("vanity-coordinator".into())
            .spawn(move || {
                let _guard = guard;
                pool.coordinate(&params, &run_token, &tx)
            })?;

        Ok(SearchHandle::new(rx, token, thread))
    }
}

/// The search loop proper. Owns the run's [`SearchState`].
fn search_loop<K, S, Y>(
    params: &SearchParams,
    source: &mut K,
    token: &CancelToken,
    sink: &mut S,
    hook: &mut Y,
) -> Summary
where
    K: KeySource + ?Sized,
    S: FnMut(SearchEvent),
    Y: YieldHook + ?Sized,
{
    info!(
        pattern = %params.pattern,
        target = params.target_count,
        max_attempts = params.max_attempts,
        "search started"
    );

    let mut state = SearchState::new(params.target_count);

    loop {
        if token.is_cancelled() {
            state.mark_cancelled();
            warn!(checked = state.attempts(), "search cancelled");
            break;
        }
        if state.is_satisfied() || state.attempts() >= params.max_attempts {
            break;
        }

        let candidate = source.next_keypair();
        state.record_attempt();

        match candidate {
            Ok(keypair) => {
                if params.pattern.matches(keypair.address()).is_match() {
                    if let Some(found) = state.record_match(keypair) {
                        sink(SearchEvent::Match(found.clone()));
                    }
                }
            }
            Err(e) => {
                state.record_skip();
                debug!(attempt = state.attempts(), error = %e, "skipped attempt");
            }
        }

        if state.attempts() % params.batch_size == 0 {
            sink(SearchEvent::Progress(state.snapshot()));
            hook.yield_now();
        }
    }

    if !state.is_cancelled() && state.attempts() % params.batch_size != 0 {
        sink(SearchEvent::Progress(state.snapshot()));
    }

    let summary = state.finish(&params.pattern);
    info!(
        outcome = %summary.outcome,
        found = summary.found(),
        checked = summary.total_checked,
        skipped = summary.skipped,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "search finished"
    );
    sink(SearchEvent::Finished(summary.clone()));
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{KeyError, Keypair};
    use crate::worker::Outcome;

    /// Deterministic source: scalars 1, 2, 3, ...
    struct Counter(u64);

    impl KeySource for Counter {
        fn next_keypair(&mut self) -> Result<Keypair, KeyError> {
            self.0 += 1;
            let mut bytes = [0u8; 32];
            bytes[24..].copy_from_slice(&self.0.to_be_bytes());
            Keypair::from_secret_bytes(bytes)
        }
    }

    fn collect(
        engine: &Engine,
        params: &SearchParams,
        source: &mut dyn KeySource,
    ) -> (Vec<SearchEvent>, Summary) {
        let mut events = Vec::new();
        let summary = engine
            .run(params, source, |e| events.push(e), &mut NoYield)
            .unwrap();
        (events, summary)
    }

    #[test]
    fn test_every_candidate_matches_empty_pattern() {
        let engine = Engine::new();
        let params = SearchParams::new(Pattern::any(), 4).with_batch_size(2);
        let (events, summary) = collect(&engine, &params, &mut Counter(0));

        assert_eq!(summary.outcome, Outcome::Completed);
        assert_eq!(summary.total_checked, 4);
        assert_eq!(summary.found(), 4);

        let ordinals: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                SearchEvent::Match(m) => Some(m.ordinal),
                _ => None,
            })
            .collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4]);
        assert!(matches!(events.last(), Some(SearchEvent::Finished(_))));
    }

    #[test]
    fn test_progress_every_batch() {
        let engine = Engine::new();
        let pattern = Pattern::new("ffffffffffffffffffffffffffffffffffffffff", "", true).unwrap();
        let params = SearchParams::new(pattern, 1)
            .with_max_attempts(10)
            .with_batch_size(3);
        let (events, summary) = collect(&engine, &params, &mut Counter(0));

        let checked: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                SearchEvent::Progress(p) => Some(p.checked),
                _ => None,
            })
            .collect();
        // batches at 3, 6, 9 plus the final partial batch
        assert_eq!(checked, vec![3, 6, 9, 10]);
        assert_eq!(summary.outcome, Outcome::AttemptsExhausted);
    }

    #[test]
    fn test_failed_derivations_are_counted_and_skipped() {
        let engine = Engine::new();
        let mut n = 0u8;
        let mut source = || {
            n = n.wrapping_add(1);
            // every other attempt yields the invalid zero scalar
            let mut bytes = [0u8; 32];
            if n % 2 == 0 {
                bytes[31] = n;
            }
            Keypair::from_secret_bytes(bytes)
        };
        let params = SearchParams::new(Pattern::any(), 3);
        let summary = engine
            .run(&params, &mut source, |_| {}, &mut NoYield)
            .unwrap();

        assert_eq!(summary.outcome, Outcome::Completed);
        assert_eq!(summary.found(), 3);
        assert_eq!(summary.total_checked, 6);
        assert_eq!(summary.skipped, 3);
    }

    #[test]
    fn test_yield_hook_runs_between_batches() {
        let engine = Engine::new();
        let mut yields = 0;
        let mut hook = || yields += 1;
        let params = SearchParams::new(Pattern::any(), 10).with_batch_size(5);
        engine
            .run(&params, &mut Counter(0), |_| {}, &mut hook)
            .unwrap();
        assert_eq!(yields, 2);
    }

    #[test]
    fn test_cancel_from_sink_stops_run() {
        let engine = Engine::new();
        let handle = engine.clone();
        let params = SearchParams::new(Pattern::any(), 100).with_batch_size(1);
        let mut after_finish = 0;
        let mut finished = false;

        let summary = engine
            .run(
                &params,
                &mut Counter(0),
                |e| {
                    if finished {
                        after_finish += 1;
                    }
                    match e {
                        SearchEvent::Match(m) if m.ordinal == 2 => handle.cancel(),
                        SearchEvent::Finished(_) => finished = true,
                        _ => {}
                    }
                },
                &mut NoYield,
            )
            .unwrap();

        assert_eq!(summary.outcome, Outcome::Cancelled);
        assert_eq!(summary.found(), 2);
        assert_eq!(after_finish, 0);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_rejects_concurrent_run() {
        let engine = Engine::new();
        let inner = engine.clone();
        let params = SearchParams::new(Pattern::any(), 1);
        let mut nested = None;

        engine
            .run(
                &params,
                &mut Counter(0),
                |_| {
                    if nested.is_none() {
                        nested = Some(inner.run(&params, &mut Counter(0), |_| {}, &mut NoYield));
                    }
                },
                &mut NoYield,
            )
            .unwrap();

        assert!(matches!(nested, Some(Err(EngineError::AlreadyRunning))));
        // the slot is released afterwards
        assert!(engine
            .run(&params, &mut Counter(0), |_| {}, &mut NoYield)
            .is_ok());
    }

    #[test]
    fn test_cancel_when_idle_is_noop() {
        let engine = Engine::new();
        engine.cancel();
        let params = SearchParams::new(Pattern::any(), 2);
        let summary = engine
            .run(&params, &mut Counter(0), |_| {}, &mut NoYield)
            .unwrap();
        assert_eq!(summary.outcome, Outcome::Completed);
    }

    #[test]
    fn test_invalid_params() {
        let engine = Engine::new();
        let zero_target = SearchParams::new(Pattern::any(), 0);
        assert!(matches!(
            engine.run(&zero_target, &mut Counter(0), |_| {}, &mut NoYield),
            Err(EngineError::InvalidTargetCount)
        ));
        let zero_batch = SearchParams::new(Pattern::any(), 1).with_batch_size(0);
        assert!(matches!(
            engine.run(&zero_batch, &mut Counter(0), |_| {}, &mut NoYield),
            Err(EngineError::InvalidBatchSize)
        ));
        assert!(matches!(
            engine.spawn_parallel(SearchParams::new(Pattern::any(), 1), 0),
            Err(EngineError::InvalidWorkerCount)
        ));
    }

    #[test]
    fn test_spawned_run_streams_events() {
        let engine = Engine::new();
        let params = SearchParams::new(Pattern::any(), 3);
        let handle = engine.spawn_with(params, Counter(0)).unwrap();

        let events: Vec<SearchEvent> = handle.events().iter().collect();
        let summary = handle.join().unwrap();

        assert_eq!(summary.found(), 3);
        assert!(matches!(events.last(), Some(SearchEvent::Finished(s)) if s.found() == 3));
        assert!(!engine.is_running());
    }
}
