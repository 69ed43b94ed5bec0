//! Pipeline coordinator: one detection pass per window.
//!
//! The coordinator drains the window handoff channel and walks each window
//! through `Filtering -> Detecting -> Dispatching -> Cooling`. A failure
//! inside Filtering or Detecting is fatal to that pass only: the pass skips
//! Dispatching, still cools down, and the gate still clears, so one bad
//! window can never stall ingestion. Cooling is an explicit state raced
//! against the shutdown signal rather than a blocking sleep, which keeps
//! shutdown prompt even mid-cooldown.

use crate::buffer::WindowBuffer;
use crate::command::Command;
use crate::core::Window;
use crate::detect::BlinkDetector;
use crate::dispatch::CommandSink;
use crate::dsp::BandpassFilter;
use crate::error::AppResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// States of one detection pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Filtering,
    Detecting,
    Dispatching,
    Cooling,
}

pub struct PipelineCoordinator {
    buffer: Arc<WindowBuffer>,
    windows: mpsc::Receiver<Window>,
    filter: BandpassFilter,
    detector: BlinkDetector,
    sink: Arc<dyn CommandSink>,
    cooldown: Duration,
    shutdown: watch::Receiver<bool>,
}

impl PipelineCoordinator {
    pub fn new(
        buffer: Arc<WindowBuffer>,
        windows: mpsc::Receiver<Window>,
        filter: BandpassFilter,
        detector: BlinkDetector,
        sink: Arc<dyn CommandSink>,
        cooldown: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            buffer,
            windows,
            filter,
            detector,
            sink,
            cooldown,
            shutdown,
        }
    }

    /// Drive passes until shutdown or until the buffer side goes away.
    pub async fn run(mut self) {
        info!("pipeline coordinator started");
        loop {
            tokio::select! {
                maybe_window = self.windows.recv() => match maybe_window {
                    Some(window) => self.process_window(window).await,
                    None => break,
                },
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("pipeline coordinator stopped");
    }

    /// Run a single detection pass. Exposed so tests can drive the state
    /// machine without a live ingestion task.
    pub async fn process_window(&mut self, window: Window) {
        let mut state = PassState::Filtering;
        debug!(?state, window_len = window.len(), "pass started");

        let command = match self.analyze(&window, &mut state) {
            Ok(command) => command,
            Err(err) => {
                warn!(?state, %err, "pass aborted, no command dispatched");
                Command::None
            }
        };

        if command != Command::None {
            state = PassState::Dispatching;
            debug!(?state, %command, "dispatching");
            if let Err(err) = self.sink.send(command).await {
                // Best-effort delivery: report and move on.
                warn!(%command, %err, "dispatch failed");
            }
        }

        state = PassState::Cooling;
        debug!(?state, cooldown = ?self.cooldown, "cooling down");
        tokio::select! {
            _ = tokio::time::sleep(self.cooldown) => {}
            _ = self.shutdown.changed() => {}
        }

        // The gate reopens whatever happened above, and a backlog cut runs
        // immediately instead of waiting for the next incoming sample.
        self.buffer.clear_gate();
        self.buffer.try_cut();
        debug!(state = ?PassState::Idle, "pass complete");
    }

    fn analyze(&self, window: &Window, state: &mut PassState) -> AppResult<Command> {
        let filtered = self.filter.apply(window)?;

        *state = PassState::Detecting;
        let detection = self.detector.detect(&filtered);
        let count = detection.blink_count();
        let command = Command::from_blink_count(count);
        info!(
            blinks = count,
            valleys = detection.peak_set.valleys.len(),
            peaks = detection.peak_set.peaks.len(),
            %command,
            "window analyzed"
        );
        Ok(command)
    }
}
