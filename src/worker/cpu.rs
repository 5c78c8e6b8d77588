//! CPU worker thread of the multi-threaded search.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::debug;

use crate::crypto::{KeySource, Keypair, OsKeySource};
use crate::matcher::Pattern;

use super::handle::CancelToken;

/// Counters shared by all workers of one run.
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Attempts made, capped at the run's budget
    attempts: AtomicU64,
    /// Attempts whose derivation failed
    skipped: AtomicU64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves one attempt from the budget. False once it is spent.
    #[inline]
    pub fn claim(&self, max_attempts: u64) -> bool {
        self.attempts
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                (n < max_attempts).then_some(n + 1)
            })
            .is_ok()
    }

    pub fn total_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn total_skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

/// Generates and tests keypairs, forwarding matches to the coordinator.
pub struct CpuWorker {
    id: usize,
    pattern: Pattern,
    max_attempts: u64,
    result_tx: Sender<Keypair>,
    stop_flag: Arc<AtomicBool>,
    cancel: CancelToken,
    stats: Arc<WorkerStats>,
}

impl CpuWorker {
    pub fn new(
        id: usize,
        pattern: Pattern,
        max_attempts: u64,
        result_tx: Sender<Keypair>,
        stop_flag: Arc<AtomicBool>,
        cancel: CancelToken,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id,
            pattern,
            max_attempts,
            result_tx,
            stop_flag,
            cancel,
            stats,
        }
    }

    /// Runs until the budget is spent, the run is stopped or cancelled, or
    /// the coordinator hangs up.
    ///
    /// A claimed attempt always completes; stop requests are honoured
    /// between attempts.
    pub fn run(&self) {
        let mut source = OsKeySource::new();

        while !self.stop_flag.load(Ordering::Relaxed) && !self.cancel.is_cancelled() {
            if !self.stats.claim(self.max_attempts) {
                break;
            }

            match source.next_keypair() {
                Ok(keypair) => {
                    if self.pattern.matches(keypair.address()).is_match()
                        && self.result_tx.send(keypair).is_err()
                    {
                        break;
                    }
                }
                Err(e) => {
                    self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                    debug!(worker = self.id, error = %e, "skipped attempt");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_respects_budget() {
        let stats = WorkerStats::new();
        assert!(stats.claim(2));
        assert!(stats.claim(2));
        assert!(!stats.claim(2));
        assert_eq!(stats.total_attempts(), 2);
    }

    #[test]
    fn test_worker_stops_at_budget() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let stats = Arc::new(WorkerStats::new());
        let worker = CpuWorker::new(
            0,
            Pattern::any(),
            5,
            tx,
            Arc::new(AtomicBool::new(false)),
            CancelToken::new(),
            stats.clone(),
        );
        worker.run();
        drop(worker);

        assert_eq!(stats.total_attempts(), 5);
        assert_eq!(rx.iter().count(), 5);
    }

    #[test]
    fn test_cancelled_worker_does_nothing() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let cancel = CancelToken::new();
        cancel.cancel();
        let stats = Arc::new(WorkerStats::new());
        let worker = CpuWorker::new(
            1,
            Pattern::any(),
            100,
            tx,
            Arc::new(AtomicBool::new(false)),
            cancel,
            stats.clone(),
        );
        worker.run();
        drop(worker);

        assert_eq!(stats.total_attempts(), 0);
        assert!(rx.try_recv().is_err());
    }
}
