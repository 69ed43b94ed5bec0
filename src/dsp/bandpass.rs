//! Zero-phase Butterworth bandpass filter.
//!
//! The band limit is realized as a cascade of `biquad` second-order
//! sections: `order / 2` high-pass sections at the low edge followed by
//! `order / 2` low-pass sections at the high edge. The cascade is applied
//! forward and then backward over the window, which cancels the phase
//! delay of a single pass, so filtered sample i stays time-aligned with
//! input sample i. The detector's index-based valley/peak pairing depends
//! on that alignment.
//!
//! Coefficient design happens once at construction; a design failure is a
//! startup configuration error, never a per-window one.

use crate::config::FilterConfig;
use crate::core::{FilteredSignal, Window};
use crate::error::{AppResult, BlinkError};
use biquad::{Biquad, Coefficients, DirectForm1, ToHertz, Q_BUTTERWORTH_F64};

#[derive(Debug)]
pub struct BandpassFilter {
    sections: Vec<Coefficients<f64>>,
    pad_len: usize,
}

impl BandpassFilter {
    /// Design the filter for a given sampling rate.
    ///
    /// Fails fast with [`BlinkError::Filter`] if the `biquad` coefficient
    /// design rejects the parameters (e.g. an edge at or above Nyquist).
    pub fn new(sampling_rate_hz: f64, config: &FilterConfig) -> AppResult<Self> {
        if config.order < 2 || config.order % 2 != 0 {
            return Err(BlinkError::Filter(format!(
                "filter order must be even and >= 2, got {}",
                config.order
            )));
        }
        let sections_per_edge = config.order / 2;
        let fs = sampling_rate_hz.hz();

        let mut sections = Vec::with_capacity(config.order);
        for _ in 0..sections_per_edge {
            sections.push(
                Coefficients::<f64>::from_params(
                    biquad::Type::HighPass,
                    fs,
                    config.lowcut_hz.hz(),
                    Q_BUTTERWORTH_F64,
                )
                .map_err(|e| {
                    BlinkError::Filter(format!(
                        "high-pass design failed at {} Hz: {:?}",
                        config.lowcut_hz, e
                    ))
                })?,
            );
        }
        for _ in 0..sections_per_edge {
            sections.push(
                Coefficients::<f64>::from_params(
                    biquad::Type::LowPass,
                    fs,
                    config.highcut_hz.hz(),
                    Q_BUTTERWORTH_F64,
                )
                .map_err(|e| {
                    BlinkError::Filter(format!(
                        "low-pass design failed at {} Hz: {:?}",
                        config.highcut_hz, e
                    ))
                })?,
            );
        }

        Ok(Self {
            sections,
            pad_len: config.order * 3,
        })
    }

    /// Apply the zero-phase filter to one window.
    ///
    /// Errors with [`BlinkError::Processing`] on windows too short to pad
    /// or when the output degenerates into non-finite values; both abort
    /// the current pass only.
    pub fn apply(&self, window: &Window) -> AppResult<FilteredSignal> {
        let values = window.values();
        if values.len() <= self.pad_len * 2 {
            return Err(BlinkError::Processing(format!(
                "window of {} samples is shorter than the {}-sample reflection pad",
                values.len(),
                self.pad_len * 2
            )));
        }

        let padded = odd_reflect_pad(&values, self.pad_len);

        // Forward pass, then backward pass with fresh section state.
        let mut filtered = self.run_cascade(&padded);
        filtered.reverse();
        let mut filtered = self.run_cascade(&filtered);
        filtered.reverse();

        let trimmed: Vec<f64> = filtered[self.pad_len..self.pad_len + values.len()].to_vec();
        if trimmed.iter().any(|v| !v.is_finite()) {
            return Err(BlinkError::Processing(
                "filter output contains non-finite values".to_string(),
            ));
        }
        Ok(FilteredSignal::new(trimmed))
    }

    fn run_cascade(&self, input: &[f64]) -> Vec<f64> {
        let mut signal = input.to_vec();
        for coeffs in &self.sections {
            let mut section = DirectForm1::<f64>::new(*coeffs);
            for value in signal.iter_mut() {
                *value = section.run(*value);
            }
        }
        signal
    }
}

/// Odd reflection of `pad` samples about each end of the signal.
///
/// Matches the padding scheme of conventional zero-phase filtering: the
/// extension is point-symmetric about the first/last sample, which keeps
/// the filter's startup transient out of the retained region.
fn odd_reflect_pad(signal: &[f64], pad: usize) -> Vec<f64> {
    let n = signal.len();
    let first = signal[0];
    let last = signal[n - 1];

    let mut padded = Vec::with_capacity(n + pad * 2);
    for i in (1..=pad).rev() {
        padded.push(2.0 * first - signal[i]);
    }
    padded.extend_from_slice(signal);
    for i in 1..=pad {
        padded.push(2.0 * last - signal[n - 1 - i]);
    }
    padded
}
