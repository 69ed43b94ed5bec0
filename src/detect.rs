//! Blink detection over a filtered window.
//!
//! A blink shows up in the bandpassed EEG as a deep negative deflection
//! (the valley) followed by a positive rebound (the peak). The detector
//! extracts both extremum families with [`crate::dsp::find_peaks`] and
//! pairs each valley, in index order, with the earliest peak at a strictly
//! greater index.
//!
//! Known limitation: under the default pairing rule a single peak can close
//! blinks for several preceding valleys, which may overcount on sustained
//! deflections. This matches the behaviour the tuning constants were
//! calibrated against, so it is kept as the default; `strict_pairing`
//! consumes each peak at most once for callers who want one-to-one pairing.

use crate::config::DetectorConfig;
use crate::core::FilteredSignal;
use crate::dsp::{find_peaks, Extremum};

/// Valleys and peaks extracted from one filtered window.
///
/// Valley amplitudes are stored as depths (positive numbers).
#[derive(Clone, Debug, Default)]
pub struct PeakSet {
    pub valleys: Vec<Extremum>,
    pub peaks: Vec<Extremum>,
}

/// One detected blink: a valley index and the peak index that closed it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Blink {
    pub valley: usize,
    pub peak: usize,
}

/// Outcome of one detection pass.
#[derive(Clone, Debug, Default)]
pub struct Detection {
    pub blinks: Vec<Blink>,
    pub peak_set: PeakSet,
}

impl Detection {
    pub fn blink_count(&self) -> usize {
        self.blinks.len()
    }
}

pub struct BlinkDetector {
    valley_threshold: f64,
    peak_threshold: f64,
    min_spacing: usize,
    strict_pairing: bool,
}

impl BlinkDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            valley_threshold: config.valley_threshold,
            peak_threshold: config.peak_threshold,
            min_spacing: config.min_spacing,
            strict_pairing: config.strict_pairing,
        }
    }

    /// Count blinks in a filtered signal.
    pub fn detect(&self, signal: &FilteredSignal) -> Detection {
        let negated: Vec<f64> = signal.as_slice().iter().map(|v| -v).collect();
        let valleys = find_peaks(&negated, self.valley_threshold, self.min_spacing);
        let peaks = find_peaks(signal.as_slice(), self.peak_threshold, self.min_spacing);

        let blinks = if self.strict_pairing {
            pair_strict(&valleys, &peaks)
        } else {
            pair_shared(&valleys, &peaks)
        };

        Detection {
            blinks,
            peak_set: PeakSet { valleys, peaks },
        }
    }
}

/// Legacy pairing: every valley scans forward independently, so one peak
/// may close several blinks.
fn pair_shared(valleys: &[Extremum], peaks: &[Extremum]) -> Vec<Blink> {
    valleys
        .iter()
        .filter_map(|valley| {
            peaks
                .iter()
                .find(|peak| peak.index > valley.index)
                .map(|peak| Blink {
                    valley: valley.index,
                    peak: peak.index,
                })
        })
        .collect()
}

/// One-to-one pairing: each peak is consumed by the first valley it closes.
fn pair_strict(valleys: &[Extremum], peaks: &[Extremum]) -> Vec<Blink> {
    let mut blinks = Vec::new();
    let mut next_peak = 0;
    for valley in valleys {
        while next_peak < peaks.len() && peaks[next_peak].index <= valley.index {
            next_peak += 1;
        }
        if next_peak == peaks.len() {
            break;
        }
        blinks.push(Blink {
            valley: valley.index,
            peak: peaks[next_peak].index,
        });
        next_peak += 1;
    }
    blinks
}
