//! One-shot completion gates
//!
//! The engine applies batches asynchronously and acknowledges each one from
//! whatever thread it pleases; the submitting worker blocks until that
//! acknowledgement arrives. [`CompletionGate`] is the bridge: a single-use
//! mutex/condvar pair carrying a typed [`BatchStatus`], so an engine failure
//! is an observable outcome for the waiter rather than a silent hang.
//!
//! A gate is constructed fresh for every batch. `signal` must be called
//! exactly once per gate, and `wait` consumes the outcome; reusing a gate is
//! a contract violation, not a supported path.
//!
//! # Example
//!
//! ```
//! use osbench::completion::{BatchStatus, CompletionGate};
//! use std::sync::Arc;
//!
//! let gate = Arc::new(CompletionGate::new());
//! let signaler = Arc::clone(&gate);
//! std::thread::spawn(move || signaler.signal(BatchStatus::Applied));
//! assert!(gate.wait().is_applied());
//! ```

use crate::engine::EngineError;
use std::sync::{Condvar, Mutex};

/// Outcome of one queued batch.
#[derive(Debug)]
pub enum BatchStatus {
    /// The engine applied every write in the batch.
    Applied,
    /// The engine gave up on the batch; it still signals, carrying the cause.
    Failed(EngineError),
}

impl BatchStatus {
    pub fn is_applied(&self) -> bool {
        matches!(self, BatchStatus::Applied)
    }

    pub fn into_result(self) -> Result<(), EngineError> {
        match self {
            BatchStatus::Applied => Ok(()),
            BatchStatus::Failed(err) => Err(err),
        }
    }
}

/// Single-shot, cross-thread completion handoff.
#[derive(Debug, Default)]
pub struct CompletionGate {
    status: Mutex<Option<BatchStatus>>,
    signaled: Condvar,
}

impl CompletionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the batch complete. May be called from any thread, including one
    /// owned by the engine, and exactly once per gate.
    pub fn signal(&self, status: BatchStatus) {
        let mut slot = self.status.lock().unwrap();
        debug_assert!(slot.is_none(), "completion gate signaled twice");
        *slot = Some(status);
        self.signaled.notify_one();
    }

    /// Block until the signal is visible and take the outcome.
    ///
    /// The wait is predicate-guarded, so spurious wakeups re-check the slot
    /// instead of returning early.
    pub fn wait(&self) -> BatchStatus {
        let mut slot = self.status.lock().unwrap();
        loop {
            match slot.take() {
                Some(status) => return status,
                None => slot = self.signaled.wait(slot).unwrap(),
            }
        }
    }
}
