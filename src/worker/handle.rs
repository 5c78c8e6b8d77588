//! Cancellation and background-run handles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use super::search::EngineError;
use super::state::{SearchEvent, Summary};

/// Cooperative cancellation flag shared between a run and its callers.
///
/// Setting it never interrupts a derivation in flight; the run observes it
/// at its next check point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A run executing on a background thread.
///
/// Dropping the handle cancels the run and waits for it to stop.
pub struct SearchHandle {
    events: Receiver<SearchEvent>,
    cancel: CancelToken,
    thread: Option<JoinHandle<Summary>>,
}

impl SearchHandle {
    pub(crate) fn new(
        events: Receiver<SearchEvent>,
        cancel: CancelToken,
        thread: JoinHandle<Summary>,
    ) -> Self {
        Self {
            events,
            cancel,
            thread: Some(thread),
        }
    }

    /// The run's event stream. Disconnects after `Finished`.
    pub fn events(&self) -> &Receiver<SearchEvent> {
        &self.events
    }

    /// Waits up to `timeout` for the next event.
    ///
    /// `Err(Timeout)` means the run is still going; `Err(Disconnected)`
    /// means every event has been delivered.
    pub fn next_event(&self, timeout: Duration) -> Result<SearchEvent, RecvTimeoutError> {
        self.events.recv_timeout(timeout)
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits for the run to end and returns its summary.
    pub fn join(mut self) -> Result<Summary, EngineError> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| EngineError::WorkerPanicked),
            None => Err(EngineError::WorkerPanicked),
        }
    }
}

impl Drop for SearchHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.cancel.cancel();
            let _ = thread.join();
        }
    }
}
