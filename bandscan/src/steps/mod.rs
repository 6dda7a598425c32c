//! Step detection and the filters that clean up raw step candidates.
//!
//! A step is an index into the profile where intensity changes quickly.
//! Every stage here takes a strictly increasing step sequence and returns a
//! new one that is an in-order subsequence of its input.

pub mod doubles;
pub mod range;
pub mod trim;

pub use doubles::filter_doubles;
pub use range::filter_range;
pub use trim::{trim_boundary_gaps, TrimOptions};

/// Finds significant monotonic steps in a 1-D signal
pub trait StepDetector {
    /// Return strictly increasing indices of steps in `signal` whose
    /// magnitude exceeds `sensitivity`.
    fn find_steps(&self, signal: &[f64], sensitivity: f64) -> Vec<usize>;
}

/// Threshold-crossing step detector.
///
/// Works on absolute values. Each excursion above the threshold that both
/// starts and ends inside the signal yields one step: the position of the
/// largest sample in `[up, down)`, where `up` is the last sample below the
/// threshold before the excursion and `down` the last sample above it.
/// Excursions already in progress at index 0, or still open at the end,
/// produce nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdStepDetector;

impl StepDetector for ThresholdStepDetector {
    fn find_steps(&self, signal: &[f64], sensitivity: f64) -> Vec<usize> {
        let above: Vec<bool> = signal.iter().map(|v| v.abs() > sensitivity).collect();

        let mut steps = Vec::new();
        let mut crossing_up = None;
        for k in 0..above.len().saturating_sub(1) {
            match (above[k], above[k + 1]) {
                (false, true) => crossing_up = Some(k),
                (true, false) => {
                    if let Some(up) = crossing_up.take() {
                        steps.push(argmax_abs(signal, up, k));
                    }
                }
                _ => {}
            }
        }

        steps
    }
}

/// Index of the largest absolute value in `signal[start..end]`, first wins.
/// An empty range yields `start`.
fn argmax_abs(signal: &[f64], start: usize, end: usize) -> usize {
    let mut best = start;
    for i in start..end {
        if signal[i].abs() > signal[best].abs() {
            best = i;
        }
    }
    best
}

/// Differences between consecutive steps
pub fn spacings(steps: &[usize]) -> Vec<usize> {
    steps.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Ratio of each spacing to the one before it, `s[i+1] / s[i]`
pub fn spacing_ratios(spacings: &[usize]) -> Vec<f64> {
    spacings
        .windows(2)
        .map(|w| w[1] as f64 / w[0] as f64)
        .collect()
}

/// True when `steps` is strictly increasing
pub fn is_strictly_increasing(steps: &[usize]) -> bool {
    steps.windows(2).all(|w| w[0] < w[1])
}

/// True when `sub` appears in `full` in order (not necessarily contiguous)
pub fn is_subsequence(sub: &[usize], full: &[usize]) -> bool {
    let mut remaining = full.iter();
    sub.iter().all(|s| remaining.any(|f| f == s))
}
