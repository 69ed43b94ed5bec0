//! Core data types shared across the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single scalar EEG reading.
///
/// Arrival order is implicit: samples are appended to the window buffer in
/// the order the ingestion gateway receives them.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn now(value: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            value,
        }
    }
}

/// A fixed-length contiguous slice of the sample stream.
///
/// Produced by the window buffer; ownership transfers to the coordinator on
/// handoff and the buffer never touches it again.
#[derive(Clone, Debug)]
pub struct Window {
    samples: Vec<Sample>,
}

impl Window {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Raw amplitudes in arrival order.
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

/// A window's amplitudes after zero-phase bandpass filtering.
///
/// Same length as the source window; index i aligns in time with input
/// sample i, which the detector's index-based pairing relies on.
#[derive(Clone, Debug)]
pub struct FilteredSignal(Vec<f64>);

impl FilteredSignal {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl std::ops::Index<usize> for FilteredSignal {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}
