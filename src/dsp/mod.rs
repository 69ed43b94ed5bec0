//! Digital signal processing stages: bandpass filtering and peak picking.

pub mod bandpass;
pub mod peaks;

pub use bandpass::BandpassFilter;
pub use peaks::{find_peaks, Extremum};
