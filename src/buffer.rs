//! Sample accumulation and single-flight window handoff.
//!
//! The buffer owns the two pieces of state the pipeline shares: the sample
//! accumulation queue (mutated by the ingestion task on append and by the
//! slice-off here) and the processing gate. The gate transition is an
//! atomic compare-exchange, so two concurrent cut attempts can never both
//! succeed; while a pass is in flight, pushed samples accumulate and are
//! neither dropped nor counted into the in-flight window.

use crate::core::{Sample, Window};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub struct WindowBuffer {
    samples: Mutex<VecDeque<Sample>>,
    gate: AtomicBool,
    window_len: usize,
    handoff: mpsc::Sender<Window>,
}

impl WindowBuffer {
    /// Create a buffer cutting windows of `window_len` samples.
    ///
    /// Returns the buffer and the receive side of the handoff channel the
    /// coordinator drains. Capacity 1 suffices: the gate guarantees the
    /// previous window has been consumed before the next cut can happen.
    pub fn new(window_len: usize) -> (Arc<Self>, mpsc::Receiver<Window>) {
        let (handoff, rx) = mpsc::channel(1);
        let buffer = Arc::new(Self {
            samples: Mutex::new(VecDeque::new()),
            gate: AtomicBool::new(false),
            window_len,
            handoff,
        });
        (buffer, rx)
    }

    /// Append one sample and cut a window if one is due.
    ///
    /// Never blocks on detection work; the handoff is a non-blocking send.
    pub fn push(&self, sample: Sample) {
        self.lock_samples().push_back(sample);
        self.try_cut();
    }

    /// Cut a window if the gate is open and enough samples are buffered.
    ///
    /// Called from `push` and again by the coordinator right after the
    /// gate clears, so a backlog accumulated during a pass does not have
    /// to wait for the next incoming sample.
    pub fn try_cut(&self) {
        let mut samples = self.lock_samples();
        if samples.len() < self.window_len {
            return;
        }
        if self
            .gate
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // A pass is in flight; keep accumulating.
            return;
        }

        let window: Vec<Sample> = samples.drain(..self.window_len).collect();
        let remaining = samples.len();
        drop(samples);

        debug!(window_len = self.window_len, remaining, "window cut");
        if let Err(err) = self.handoff.try_send(Window::new(window)) {
            // Only possible when the coordinator is gone (shutdown); the
            // window is dropped and the gate reopened.
            warn!(%err, "window handoff failed, coordinator unavailable");
            self.gate.store(false, Ordering::Release);
        }
    }

    /// Reopen the gate after a pass (including its cooldown) completes.
    pub fn clear_gate(&self) {
        self.gate.store(false, Ordering::Release);
    }

    /// Whether a pass is currently in flight.
    pub fn is_gated(&self) -> bool {
        self.gate.load(Ordering::Acquire)
    }

    /// Number of samples currently buffered (excluding any in-flight window).
    pub fn buffered_len(&self) -> usize {
        self.lock_samples().len()
    }

    /// A poisoned mutex means a pusher panicked mid-append; the queue is
    /// still structurally sound, so keep going with its contents.
    fn lock_samples(&self) -> std::sync::MutexGuard<'_, VecDeque<Sample>> {
        self.samples
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
