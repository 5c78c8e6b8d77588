//! Multi-threaded search: CPU workers plus one coordinator.
//!
//! Workers share an attempt budget and forward candidate matches. The
//! coordinator owns the [`SearchState`], numbers matches, emits events and
//! stops the workers when the run ends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use tracing::{info, warn};

use crate::crypto::Keypair;

use super::cpu::{CpuWorker, WorkerStats};
use super::handle::CancelToken;
use super::search::{EngineError, SearchParams};
use super::state::{SearchEvent, SearchState, Summary};

/// Workers spawned for one parallel run.
pub(crate) struct WorkerPool {
    num_workers: usize,
    /// Worker thread handles (Option to allow taking during join)
    handles: Option<Vec<JoinHandle<()>>>,
    result_rx: Receiver<Keypair>,
    stop_flag: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
}

impl WorkerPool {
    /// Spawns `num_workers` CPU workers for `params`.
    pub fn new(
        num_workers: usize,
        params: &SearchParams,
        cancel: CancelToken,
    ) -> Result<Self, EngineError> {
        let (result_tx, result_rx) = bounded(100);
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(WorkerStats::new());

        let mut pool = Self {
            num_workers,
            handles: Some(Vec::with_capacity(num_workers)),
            result_rx,
            stop_flag,
            stats,
        };

        for id in 0..num_workers {
            let handle = pool.spawn_worker(id, params, &result_tx, &cancel)?;
            if let Some(handles) = pool.handles.as_mut() {
                handles.push(handle);
            }
        }

        Ok(pool)
    }

    fn spawn_worker(
        &self,
        id: usize,
        params: &SearchParams,
        result_tx: &Sender<Keypair>,
        cancel: &CancelToken,
    ) -> Result<JoinHandle<()>, EngineError> {
        let worker = CpuWorker::new(
            id,
            params.pattern.clone(),
            params.max_attempts,
            result_tx.clone(),
            self.stop_flag.clone(),
            cancel.clone(),
            self.stats.clone(),
        );

        let handle = thread::Builder::new()
            .name(format!("vanity-worker-{}", id))
            .spawn(move || worker.run())?;
        Ok(handle)
    }

    /// Drives the run to completion on the current thread.
    pub fn coordinate(
        mut self,
        params: &SearchParams,
        cancel: &CancelToken,
        events: &Sender<SearchEvent>,
    ) -> Summary {
        info!(
            pattern = %params.pattern,
            target = params.target_count,
            max_attempts = params.max_attempts,
            workers = self.num_workers,
            "parallel search started"
        );

        let emit = |event: SearchEvent| {
            let _ = events.send(event);
        };

        let mut state = SearchState::new(params.target_count);
        let mut last_progress = Instant::now();
        let interval = params.progress_interval.max(Duration::from_millis(1));

        loop {
            if cancel.is_cancelled() {
                state.mark_cancelled();
                break;
            }
            if state.is_satisfied() {
                break;
            }

            match self.result_rx.recv_timeout(interval) {
                Ok(keypair) => {
                    if let Some(found) = state.record_match(keypair) {
                        emit(SearchEvent::Match(found.clone()));
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                // every worker has exited: the budget is spent or the run was cancelled
                Err(RecvTimeoutError::Disconnected) => {
                    if cancel.is_cancelled() {
                        state.mark_cancelled();
                    }
                    break;
                }
            }

            if last_progress.elapsed() >= interval {
                state.observe_counts(self.stats.total_attempts(), self.stats.total_skipped());
                emit(SearchEvent::Progress(state.snapshot()));
                last_progress = Instant::now();
            }
        }

        self.shutdown();
        state.observe_counts(self.stats.total_attempts(), self.stats.total_skipped());

        if state.is_cancelled() {
            warn!(checked = state.attempts(), "parallel search cancelled");
        } else {
            emit(SearchEvent::Progress(state.snapshot()));
        }

        let summary = state.finish(&params.pattern);
        info!(
            outcome = %summary.outcome,
            found = summary.found(),
            checked = summary.total_checked,
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "parallel search finished"
        );
        emit(SearchEvent::Finished(summary.clone()));
        summary
    }

    fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    /// Stops the workers and waits for them. Late matches are discarded.
    fn shutdown(&mut self) {
        self.stop();
        if let Some(handles) = self.handles.take() {
            // drain so no worker stays blocked on a full channel
            while !handles.iter().all(JoinHandle::is_finished) {
                while self.result_rx.try_recv().is_ok() {}
                thread::yield_now();
            }
            for handle in handles {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Pattern;
    use crate::worker::{Engine, Outcome, DEFAULT_MAX_ATTEMPTS};

    #[test]
    fn test_parallel_completes_target() {
        let engine = Engine::new();
        let params = SearchParams::new(Pattern::any(), 8);
        let handle = engine.spawn_parallel(params, 3).unwrap();
        let summary = handle.join().unwrap();

        assert_eq!(summary.outcome, Outcome::Completed);
        assert_eq!(summary.found(), 8);
        assert!(summary.total_checked >= 8);
        let ordinals: Vec<usize> = summary.matches.iter().map(|m| m.ordinal).collect();
        assert_eq!(ordinals, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn test_parallel_budget_is_exact() {
        let engine = Engine::new();
        let pattern = Pattern::new("ffffffffffffffffffffffffffffffffffffffff", "", true).unwrap();
        let params = SearchParams::new(pattern, 1).with_max_attempts(50);
        let summary = engine.spawn_parallel(params, 4).unwrap().join().unwrap();

        assert_eq!(summary.outcome, Outcome::AttemptsExhausted);
        assert_eq!(summary.total_checked, 50);
        assert!(summary.no_matches());
    }

    #[test]
    fn test_parallel_cancel() {
        let engine = Engine::new();
        let pattern = Pattern::new("ffffffffffffffffffffffffffffffffffffffff", "", true).unwrap();
        let params = SearchParams::new(pattern, 1);
        let handle = engine.spawn_parallel(params, 2).unwrap();
        assert!(engine.is_running());

        engine.cancel();
        let events: Vec<SearchEvent> = handle.events().iter().collect();
        let summary = handle.join().unwrap();

        assert_eq!(summary.outcome, Outcome::Cancelled);
        assert!(matches!(events.last(), Some(SearchEvent::Finished(_))));
        assert!(!engine.is_running());
    }

    #[test]
    fn test_parallel_cancel_while_coordinator_waits() {
        let engine = Engine::new();
        let pattern = Pattern::new("ffffffffffffffffffffffffffffffffffffffff", "", true).unwrap();
        let params = SearchParams::new(pattern, 1).with_progress_interval(Duration::from_secs(10));
        let handle = engine.spawn_parallel(params, 2).unwrap();

        // let the coordinator block on the result channel first
        thread::sleep(Duration::from_millis(50));
        engine.cancel();

        let events: Vec<SearchEvent> = handle.events().iter().collect();
        let summary = handle.join().unwrap();

        assert_eq!(summary.outcome, Outcome::Cancelled);
        assert!(summary.total_checked < DEFAULT_MAX_ATTEMPTS);
        assert!(!events
            .iter()
            .any(|event| matches!(event, SearchEvent::Progress(_))));
        assert!(matches!(events.last(), Some(SearchEvent::Finished(_))));
    }
}
