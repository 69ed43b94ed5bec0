//! Configuration loading and validation.
//!
//! Strongly-typed configuration backed by `figment`. Values are loaded from:
//! 1. a TOML file (default `config/blinkctl.toml`)
//! 2. environment variables prefixed with `BLINKCTL_`
//!
//! All tunables the pipeline exposes live here: acquisition geometry,
//! filter passband, detector thresholds, cooldown, the OSC listen socket
//! and the actuator endpoint. There is no runtime reconfiguration; the
//! configuration is validated once at startup and invalid values are fatal.

use crate::error::{AppResult, BlinkError};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub application: ApplicationConfig,
    pub acquisition: AcquisitionConfig,
    pub filter: FilterConfig,
    pub detector: DetectorConfig,
    pub pipeline: PipelineConfig,
    pub osc: OscConfig,
    pub actuator: ActuatorConfig,
}

/// Application-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    pub name: String,
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Sampling geometry of the incoming stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Sampling rate of the EEG stream in Hz.
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate_hz: f64,
    /// Window duration in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: f64,
}

impl AcquisitionConfig {
    /// Number of samples per detection window.
    pub fn window_len(&self) -> usize {
        (self.sampling_rate_hz * self.window_secs) as usize
    }
}

/// Bandpass filter parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_lowcut")]
    pub lowcut_hz: f64,
    #[serde(default = "default_highcut")]
    pub highcut_hz: f64,
    /// Filter order; must be even, between 2 and 8.
    #[serde(default = "default_order")]
    pub order: usize,
}

/// Blink detector thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Minimum valley depth (positive number of amplitude units).
    #[serde(default = "default_valley_threshold")]
    pub valley_threshold: f64,
    /// Minimum peak height.
    #[serde(default = "default_peak_threshold")]
    pub peak_threshold: f64,
    /// Minimum spacing between accepted extrema, in samples.
    #[serde(default = "default_min_spacing")]
    pub min_spacing: usize,
    /// When true, each peak closes at most one blink. The default mirrors
    /// the legacy pairing rule, which lets one peak satisfy several valleys.
    #[serde(default)]
    pub strict_pairing: bool,
}

/// Coordinator timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Quiescent interval after each pass before the gate reopens.
    #[serde(with = "humantime_serde", default = "default_cooldown")]
    pub cooldown: Duration,
}

/// OSC ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OscConfig {
    /// UDP socket to listen on, e.g. "0.0.0.0:5000".
    pub listen_addr: SocketAddr,
    /// OSC address pattern carrying EEG samples.
    #[serde(default = "default_eeg_address")]
    pub eeg_address: String,
    /// Which argument of the EEG message to ingest (0 = RAW_TP9 on a Muse).
    #[serde(default)]
    pub channel_index: usize,
}

/// Actuator endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuatorConfig {
    /// Base URL of the actuator, e.g. "http://192.168.4.3".
    pub base_url: String,
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sampling_rate() -> f64 {
    256.0
}

fn default_window_secs() -> f64 {
    4.0
}

fn default_lowcut() -> f64 {
    1.0
}

fn default_highcut() -> f64 {
    15.0
}

fn default_order() -> usize {
    4
}

fn default_valley_threshold() -> f64 {
    100.0
}

fn default_peak_threshold() -> f64 {
    30.0
}

fn default_min_spacing() -> usize {
    32
}

fn default_cooldown() -> Duration {
    Duration::from_secs(2)
}

fn default_eeg_address() -> String {
    "/muse/eeg".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(20)
}

impl Config {
    /// Load configuration from the default path and environment variables.
    pub fn load() -> AppResult<Self> {
        Self::load_from("config/blinkctl.toml")
    }

    /// Load configuration from a specific file path.
    ///
    /// Environment variables prefixed with `BLINKCTL_` override file values.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let config: Config = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("BLINKCTL_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate semantic constraints the type system cannot express.
    pub fn validate(&self) -> AppResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(BlinkError::Configuration(format!(
                "invalid log_level '{}', must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.acquisition.sampling_rate_hz <= 0.0 {
            return Err(BlinkError::Configuration(format!(
                "sampling_rate_hz must be positive, got {}",
                self.acquisition.sampling_rate_hz
            )));
        }
        if self.acquisition.window_secs <= 0.0 {
            return Err(BlinkError::Configuration(format!(
                "window_secs must be positive, got {}",
                self.acquisition.window_secs
            )));
        }

        let nyquist = self.acquisition.sampling_rate_hz / 2.0;
        if self.filter.lowcut_hz <= 0.0 || self.filter.highcut_hz <= self.filter.lowcut_hz {
            return Err(BlinkError::Configuration(format!(
                "passband must satisfy 0 < lowcut < highcut, got {}-{} Hz",
                self.filter.lowcut_hz, self.filter.highcut_hz
            )));
        }
        if self.filter.highcut_hz >= nyquist {
            return Err(BlinkError::Configuration(format!(
                "highcut {} Hz must be below Nyquist ({} Hz)",
                self.filter.highcut_hz, nyquist
            )));
        }
        if self.filter.order < 2 || self.filter.order > 8 || self.filter.order % 2 != 0 {
            return Err(BlinkError::Configuration(format!(
                "filter order must be even and within 2..=8, got {}",
                self.filter.order
            )));
        }

        // The zero-phase pass reflects order*3 samples at each end; a window
        // shorter than that cannot be filtered stably.
        let min_window = self.filter.order * 3 * 2;
        if self.acquisition.window_len() <= min_window {
            return Err(BlinkError::Configuration(format!(
                "window of {} samples is too short for an order-{} filter (need > {})",
                self.acquisition.window_len(),
                self.filter.order,
                min_window
            )));
        }

        if self.detector.min_spacing == 0 {
            return Err(BlinkError::Configuration(
                "detector min_spacing must be at least 1 sample".to_string(),
            ));
        }
        if self.detector.valley_threshold <= 0.0 || self.detector.peak_threshold <= 0.0 {
            return Err(BlinkError::Configuration(
                "detector thresholds must be positive amplitudes".to_string(),
            ));
        }

        if !self.actuator.base_url.starts_with("http://")
            && !self.actuator.base_url.starts_with("https://")
        {
            return Err(BlinkError::Configuration(format!(
                "actuator base_url must be an http(s) URL, got '{}'",
                self.actuator.base_url
            )));
        }

        Ok(())
    }
}
