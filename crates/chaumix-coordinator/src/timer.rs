//! Cancellable phase waiting.
//!
//! Each phase body blocks on [`PhaseGate::wait`]: it completes on the
//! phase timeout or on an interrupt, whichever comes first, and reports
//! the observed elapsed time (the adaptive anonymity-set calculation
//! feeds on it). Interrupting replaces the underlying signal, so a wake
//! meant for one wait can never leak into the next phase's wait.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Outcome of one phase wait.
#[derive(Clone, Copy, Debug)]
pub struct WaitOutcome {
    /// Wall-clock time spent in the wait.
    pub elapsed: Duration,
    /// Whether the wait was cut short by an interrupt.
    pub interrupted: bool,
}

/// Phase-local cancellation signal.
pub struct PhaseGate {
    signal: Mutex<Arc<Notify>>,
}

impl PhaseGate {
    /// Fresh gate with an armed signal.
    pub fn new() -> Self {
        Self {
            signal: Mutex::new(Arc::new(Notify::new())),
        }
    }

    /// Wake any in-progress wait immediately and re-arm for the next one.
    pub fn interrupt(&self) {
        let mut guard = self.signal.lock();
        guard.notify_waiters();
        *guard = Arc::new(Notify::new());
    }

    /// Wait until `timeout` passes or [`interrupt`](Self::interrupt) fires.
    pub async fn wait(&self, timeout: Duration) -> WaitOutcome {
        let signal = Arc::clone(&self.signal.lock());
        let started = Instant::now();
        tokio::select! {
            () = tokio::time::sleep(timeout) => WaitOutcome {
                elapsed: started.elapsed(),
                interrupted: false,
            },
            () = signal.notified() => WaitOutcome {
                elapsed: started.elapsed(),
                interrupted: true,
            },
        }
    }
}

impl Default for PhaseGate {
    fn default() -> Self {
        Self::new()
    }
}
