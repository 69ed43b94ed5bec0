//! # blinkctl
//!
//! Single-channel EEG blink detection pipeline. Samples arrive over
//! OSC/UDP, accumulate into fixed-duration windows, and each completed
//! window runs one detection pass: zero-phase bandpass filtering, valley
//! to peak pairing to count blinks, and a blink-count to command mapping
//! dispatched to a remote actuator over HTTP.
//!
//! ## Module layout
//!
//! - **`config`**: strongly-typed configuration (figment: TOML + env).
//! - **`core`**: `Sample`, `Window`, `FilteredSignal`.
//! - **`dsp`**: the bandpass filter stage and the peak picker.
//! - **`detect`**: valley/peak extraction and blink pairing.
//! - **`command`**: the closed command set and the count mapping.
//! - **`dispatch`**: the `CommandSink` trait and the HTTP dispatcher.
//! - **`buffer`**: sample accumulation, window slicing, and the
//!   single-flight processing gate.
//! - **`pipeline`**: the per-window coordinator state machine.
//! - **`ingest`**: the OSC/UDP gateway feeding the buffer.
//! - **`app`**: wiring, task spawning, and shutdown.
//! - **`error`**: the `BlinkError` taxonomy.
//! - **`tracing_setup`**: logging initialization.

pub mod app;
pub mod buffer;
pub mod command;
pub mod config;
pub mod core;
pub mod detect;
pub mod dispatch;
pub mod dsp;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod tracing_setup;
