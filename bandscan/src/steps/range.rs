//! Discards steps too close to either end of the profile.

/// Keep steps strictly inside `(n * bot_end, n * top_end)`.
///
/// Steps near the start of the profile usually come from the meniscus or cap,
/// steps near the end from the vial bottom. An empty result is valid.
pub fn filter_range(steps: &[usize], n: usize, bot_end: f64, top_end: f64) -> Vec<usize> {
    let low = n as f64 * bot_end;
    let high = n as f64 * top_end;

    steps
        .iter()
        .copied()
        .filter(|&s| (s as f64) > low && (s as f64) < high)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_exclusive() {
        // n = 200: window is (50, 190)
        let steps = [10, 50, 51, 120, 189, 190, 199];
        assert_eq!(filter_range(&steps, 200, 0.25, 0.95), vec![51, 120, 189]);
    }

    #[test]
    fn test_everything_filtered() {
        assert!(filter_range(&[1, 2, 3], 100, 0.25, 0.95).is_empty());
        assert!(filter_range(&[], 100, 0.25, 0.95).is_empty());
    }

    #[test]
    fn test_full_window_keeps_interior() {
        assert_eq!(filter_range(&[0, 5, 9], 10, 0.0, 1.0), vec![5, 9]);
    }
}
