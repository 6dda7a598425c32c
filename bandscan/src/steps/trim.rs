//! Trimming of boundary steps that break the interior spacing rhythm.
//!
//! Noise near the top interface tends to show up as a leading spacing much
//! wider than the one after it; a weak late signal or a detected solvent front
//! shows up as a sudden jump in spacing towards the end.

use super::spacings;
use serde::{Deserialize, Serialize};

/// A later spacing this many times the one before it ends the sequence
const FORWARD_GAP_RATIO: f64 = 2.0;

/// Options for [`trim_boundary_gaps`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimOptions {
    /// Spacing ratio treated as a structural gap
    pub rejection: f64,
    /// Drop the final step when the last spacing is oversized
    pub reject_last: bool,
}

impl Default for TrimOptions {
    fn default() -> Self {
        Self {
            rejection: 1.15,
            reject_last: true,
        }
    }
}

/// Trim leading and trailing steps inconsistent with the interior spacing.
///
/// 1. With `reject_last` and at least three steps, drop the final step if
///    `last / second_to_last` spacing exceeds `rejection`.
/// 2. Scanning spacings backwards, find the highest `i` with
///    `s[i] / s[i+1] > rejection` and keep only the steps after it.
/// 3. Scanning forwards, find the lowest `i` with `s[i+1] / s[i] > 2` and
///    keep only the first `i + 2` steps.
///
/// Each scan acts on the first qualifying gap only.
pub fn trim_boundary_gaps(steps: &[usize], options: &TrimOptions) -> Vec<usize> {
    let mut trimmed = steps.to_vec();

    if options.reject_last && trimmed.len() >= 3 {
        let n = trimmed.len();
        let second_to_last = (trimmed[n - 2] - trimmed[n - 3]) as f64;
        let last = (trimmed[n - 1] - trimmed[n - 2]) as f64;
        if last / second_to_last > options.rejection {
            log::debug!("Rejecting trailing step {}", trimmed[n - 1]);
            trimmed.pop();
        }
    }

    let spacing = spacings(&trimmed);
    let leading_gap = (0..spacing.len().saturating_sub(1))
        .rev()
        .find(|&i| spacing[i] as f64 / spacing[i + 1] as f64 > options.rejection);
    if let Some(gap) = leading_gap {
        log::debug!(
            "Leading gap after step {}, dropping {:?}",
            trimmed[gap],
            &trimmed[..=gap]
        );
        trimmed = trimmed.split_off(gap + 1);
    }

    let spacing = spacings(&trimmed);
    let trailing_gap = (0..spacing.len().saturating_sub(1))
        .find(|&i| spacing[i + 1] as f64 / spacing[i] as f64 > FORWARD_GAP_RATIO);
    if let Some(gap) = trailing_gap {
        log::debug!(
            "Trailing gap after step {}, dropping {:?}",
            trimmed[gap + 1],
            &trimmed[gap + 2..]
        );
        trimmed.truncate(gap + 2);
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::{is_strictly_increasing, is_subsequence};

    #[test]
    fn test_oversized_last_spacing_rejected() {
        // Final spacing is 10x the one before it
        let steps = [10, 20, 30, 40, 140];
        let trimmed = trim_boundary_gaps(&steps, &TrimOptions::default());
        assert_eq!(trimmed, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_last_kept_without_reject_last() {
        // 100/10 also fails the forward scan, which keeps steps up to the gap
        let steps = [10, 20, 30, 40, 140];
        let options = TrimOptions {
            reject_last: false,
            ..Default::default()
        };
        assert_eq!(trim_boundary_gaps(&steps, &options), vec![10, 20, 30, 40]);

        // A mild final stretch passes both scans
        let steps = [10, 20, 30, 40, 55];
        let options = TrimOptions {
            rejection: 1.85,
            reject_last: false,
        };
        assert_eq!(trim_boundary_gaps(&steps, &options), steps.to_vec());
    }

    #[test]
    fn test_leading_noise_trimmed() {
        let steps = [5, 30, 40, 50, 60];
        let trimmed = trim_boundary_gaps(&steps, &TrimOptions::default());
        assert_eq!(trimmed, vec![30, 40, 50, 60]);
    }

    #[test]
    fn test_backward_scan_uses_highest_gap() {
        // Spacings 40, 20, 5, 10, 10, 10: both 40/20 and 20/5 exceed 1.15,
        // the gap after 40 is the later one and everything up to it goes
        let steps = [0, 40, 60, 65, 75, 85, 95];
        let trimmed = trim_boundary_gaps(&steps, &TrimOptions::default());
        assert_eq!(trimmed, vec![60, 65, 75, 85, 95]);
    }

    #[test]
    fn test_trailing_jump_trimmed() {
        // Spacings 10, 10, 10, 25, 25: the jump at the fourth spacing ends it
        let steps = [100, 110, 120, 130, 155, 180];
        let trimmed = trim_boundary_gaps(&steps, &TrimOptions::default());
        assert_eq!(trimmed, vec![100, 110, 120, 130]);
    }

    #[test]
    fn test_short_sequences_are_noops() {
        let options = TrimOptions::default();
        assert!(trim_boundary_gaps(&[], &options).is_empty());
        assert_eq!(trim_boundary_gaps(&[7], &options), vec![7]);
        assert_eq!(trim_boundary_gaps(&[7, 90], &options), vec![7, 90]);
    }

    #[test]
    fn test_output_is_ordered_subsequence() {
        let steps = [3, 31, 52, 70, 91, 110, 129, 170, 240];
        let trimmed = trim_boundary_gaps(&steps, &TrimOptions::default());
        assert!(!trimmed.is_empty());
        assert!(is_strictly_increasing(&trimmed));
        assert!(is_subsequence(&trimmed, &steps));
    }
}
