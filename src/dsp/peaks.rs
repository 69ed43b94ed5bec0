//! Local-extremum picking with height and spacing constraints.
//!
//! Semantics follow the conventional `find_peaks` contract: a peak is a
//! sample strictly greater than its neighbours (the midpoint of a flat
//! plateau counts once), candidates below the height threshold are
//! discarded, and the minimum-distance constraint is enforced by keeping
//! the tallest candidates first and evicting neighbours within `distance`
//! samples.

/// A local maximum of a signal: its index and amplitude.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extremum {
    pub index: usize,
    pub amplitude: f64,
}

/// Find local maxima of `signal` with amplitude >= `height`, spaced at
/// least `distance` samples apart.
///
/// To find valleys, call this with the negated signal; the returned
/// amplitudes are then the valley depths.
pub fn find_peaks(signal: &[f64], height: f64, distance: usize) -> Vec<Extremum> {
    let candidates = local_maxima(signal);
    let tall: Vec<Extremum> = candidates
        .into_iter()
        .filter(|e| e.amplitude >= height)
        .collect();
    enforce_distance(tall, distance)
}

/// All strict local maxima, resolving plateaus to their midpoint.
fn local_maxima(signal: &[f64]) -> Vec<Extremum> {
    let mut maxima = Vec::new();
    let n = signal.len();
    let mut i = 1;
    while n >= 3 && i < n - 1 {
        if signal[i] > signal[i - 1] {
            if signal[i] > signal[i + 1] {
                maxima.push(Extremum {
                    index: i,
                    amplitude: signal[i],
                });
                i += 2;
                continue;
            }
            if signal[i] == signal[i + 1] {
                // Plateau: scan to its end and take the midpoint if the
                // signal falls off afterwards.
                let start = i;
                let mut end = i + 1;
                while end < n - 1 && signal[end] == signal[start] {
                    end += 1;
                }
                if signal[end] < signal[start] {
                    let mid = (start + end - 1) / 2;
                    maxima.push(Extremum {
                        index: mid,
                        amplitude: signal[mid],
                    });
                }
                i = end;
                continue;
            }
        }
        i += 1;
    }
    maxima
}

/// Keep the tallest extrema first, evicting any others closer than
/// `distance` samples to an already-kept one.
fn enforce_distance(candidates: Vec<Extremum>, distance: usize) -> Vec<Extremum> {
    if distance <= 1 || candidates.len() < 2 {
        return candidates;
    }

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        candidates[b]
            .amplitude
            .partial_cmp(&candidates[a].amplitude)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = vec![true; candidates.len()];
    for &idx in &order {
        if !keep[idx] {
            continue;
        }
        let here = candidates[idx].index;
        // Evict lower neighbours on both sides within the exclusion zone.
        for (other, kept) in keep.iter_mut().enumerate() {
            if other != idx && *kept && candidates[other].index.abs_diff(here) < distance {
                *kept = false;
            }
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(e, kept)| kept.then_some(e))
        .collect()
}
