//! Custom error types for the application.
//!
//! This module defines the primary error type, `BlinkError`, for the entire
//! pipeline. Using the `thiserror` crate, it provides a centralized way to
//! handle the error categories the system distinguishes:
//!
//! - **`Config`** wraps errors from the `figment` crate (missing file, bad
//!   TOML, bad environment override). Fatal at startup.
//! - **`Configuration`** represents semantic errors that pass parsing but are
//!   logically invalid (e.g., a passband edge above Nyquist). Fatal at startup.
//! - **`Io`** covers socket binding and other I/O failures.
//! - **`Filter`** is raised when filter coefficients cannot be designed for
//!   the configured parameters; this is detected once at startup, never
//!   per-window.
//! - **`Processing`** covers per-window failures (malformed window length,
//!   numerical instability). Recovered at the pass level: the pass aborts,
//!   no command is dispatched, and the gate still clears.
//! - **`Dispatch`**/**`DispatchStatus`** cover actuator transport failures.
//!   Absorbed by the coordinator: reported, never retried, never propagated.
//! - **`ChannelClosed`** signals that a pipeline channel peer went away,
//!   which only happens during shutdown.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, BlinkError>;

#[derive(Error, Debug)]
pub enum BlinkError {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Filter design error: {0}")]
    Filter(String),

    #[error("Window processing error: {0}")]
    Processing(String),

    #[error("Dispatch transport error: {0}")]
    Dispatch(#[from] reqwest::Error),

    #[error("Actuator returned non-success status {0}")]
    DispatchStatus(u16),

    #[error("Pipeline channel closed")]
    ChannelClosed,
}

impl BlinkError {
    /// Whether the pipeline can keep running after this error.
    ///
    /// Startup-class errors (configuration, filter design, socket binding)
    /// are fatal; everything that happens per window or per dispatch is
    /// recovered locally.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BlinkError::Processing(_)
                | BlinkError::Dispatch(_)
                | BlinkError::DispatchStatus(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_errors_are_recoverable() {
        let err = BlinkError::Processing("bad window length".into());
        assert!(err.is_recoverable());
    }

    #[test]
    fn dispatch_status_is_recoverable() {
        assert!(BlinkError::DispatchStatus(503).is_recoverable());
    }

    #[test]
    fn configuration_errors_are_fatal() {
        let err = BlinkError::Configuration("highcut above Nyquist".into());
        assert!(!err.is_recoverable());
        let err = BlinkError::Filter("coefficient design failed".into());
        assert!(!err.is_recoverable());
    }
}
