//! The utility kernel: `median`, `sign`, and the time-series peak detector
//! (`spec.md` §4.8), used by the default `distil` summariser and by
//! coevolution's history-peak parasite selection.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// `-1`, `0`, or `1` according to the sign of `x`.
pub fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// The median of `values`. Does not mutate the caller's slice. `NaN` is
/// forbidden as a fitness value elsewhere in the system, so this sorts with
/// `partial_cmp` and panics only on a `NaN` the caller should never produce.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("median: NaN fitness value"));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// A local maximum in a time series, per `spec.md` §4.8: the span from
/// where the series starts rising to where it stops rising (including any
/// flat top), and the maximum value attained across that span.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Peak {
    pub start: usize,
    pub end: usize,
    pub value: f64,
}

impl Peak {
    pub fn duration(&self) -> usize {
        self.end - self.start
    }
}

/// Finds the local peaks of `x`. Forward differences are taken
/// (`d[i] = x[i+1] - x[i]`), a sentinel negative difference is appended so a
/// trailing rise still closes into a peak, and the indexed `(i, d[i], x[i])`
/// triples are partitioned into maximal runs of equal `sign(d[i])`. A peak is
/// registered wherever a positive-slope partition is immediately followed by
/// a non-positive one — a flat top (`sign == 0`) is absorbed into the same
/// peak rather than starting a new partition boundary, which is the
/// "tie-break for flat tops" the spec calls for.
pub fn find_peaks(x: &[f64]) -> Vec<Peak> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }

    let mut diffs = Vec::with_capacity(n);
    for i in 0..n.saturating_sub(1) {
        diffs.push(x[i + 1] - x[i]);
    }
    diffs.push(-1.0); // sentinel: forces closure of a trailing rise

    let signs: Vec<i8> = diffs.iter().map(|d| sign(*d)).collect();

    // Partition into maximal runs of equal sign: (sign, start, end) inclusive.
    let mut partitions: Vec<(i8, usize, usize)> = Vec::new();
    let mut run_start = 0;
    for i in 1..signs.len() {
        if signs[i] != signs[run_start] {
            partitions.push((signs[run_start], run_start, i - 1));
            run_start = i;
        }
    }
    partitions.push((signs[run_start], run_start, signs.len() - 1));

    let mut peaks = Vec::new();
    for w in 0..partitions.len() {
        let (sgn, start, _) = partitions[w];
        if sgn <= 0 {
            continue;
        }
        let Some(&(next_sign, next_start, next_end)) = partitions.get(w + 1) else {
            continue;
        };
        if next_sign > 0 {
            continue;
        }

        let end = if next_sign == 0 { next_end } else { next_start };
        let value = x[start..=end.min(n - 1)]
            .iter()
            .cloned()
            .fold(f64::MIN, f64::max);

        peaks.push(Peak { start, end, value });
    }

    peaks
}
