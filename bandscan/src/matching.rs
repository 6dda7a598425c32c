//! Pairing of rising (top) edges with falling (bottom) edges.

use crate::error::BandError;

/// Index-aligned band tops and bottoms
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchedEdges {
    pub tops: Vec<usize>,
    pub bottoms: Vec<usize>,
}

/// Pair every rising step with the falling step that closes its band.
///
/// The bottom of a band is the last falling step strictly after its top and
/// strictly before the next top (or before `n - 1` for the last top). When a
/// top has no such candidate:
///
/// - if it is the last top it is dropped and matching ends;
/// - otherwise the *next* top is treated as spurious, dropped, and the whole
///   pass restarts.
///
/// The last top and its bottom are never reported: the trailing band is the
/// least reliable detection in the profile.
///
/// # Errors
/// * `BandError::NoBandsDetected` - no rising step survives the repair
/// * `BandError::InvariantViolation` - tops and bottoms end up misaligned
pub fn match_edges(rising: &[usize], falling: &[usize], n: usize) -> Result<MatchedEdges, BandError> {
    let mut tops = rising.to_vec();
    let end_limit = n.saturating_sub(1);

    let mut bottoms = loop {
        let mut bottoms = Vec::with_capacity(tops.len());
        let mut unmatched = None;

        for (k, &top) in tops.iter().enumerate() {
            let limit = tops.get(k + 1).copied().unwrap_or(end_limit);
            match falling.iter().rev().find(|&&f| f > top && f < limit) {
                Some(&bottom) => bottoms.push(bottom),
                None => {
                    unmatched = Some(k);
                    break;
                }
            }
        }

        match unmatched {
            None => break bottoms,
            Some(k) if k + 1 == tops.len() => {
                log::debug!("Last top {} has no bottom edge, dropping it", tops[k]);
                tops.pop();
                break bottoms;
            }
            Some(k) => {
                log::warn!(
                    "No bottom edge between tops {} and {}, dropping {}",
                    tops[k],
                    tops[k + 1],
                    tops[k + 1]
                );
                tops.remove(k + 1);
            }
        }
    };

    if tops.is_empty() {
        return Err(BandError::NoBandsDetected);
    }
    if tops.len() != bottoms.len() {
        return Err(BandError::InvariantViolation(format!(
            "{} tops matched against {} bottoms",
            tops.len(),
            bottoms.len()
        )));
    }

    tops.pop();
    bottoms.pop();

    Ok(MatchedEdges { tops, bottoms })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staggered_edges() {
        let rising = [20, 40, 60, 80, 100];
        let falling = [30, 50, 70, 90, 110];
        let matched = match_edges(&rising, &falling, 200).unwrap();
        assert_eq!(matched.tops, vec![20, 40, 60, 80]);
        assert_eq!(matched.bottoms, vec![30, 50, 70, 90]);
    }

    #[test]
    fn test_last_candidate_wins() {
        let rising = [20, 60, 100];
        let falling = [25, 35, 50, 70, 90, 130];
        let matched = match_edges(&rising, &falling, 200).unwrap();
        assert_eq!(matched.tops, vec![20, 60]);
        assert_eq!(matched.bottoms, vec![50, 90]);
    }

    #[test]
    fn test_missing_bottom_drops_following_top() {
        // Nothing falls between 60 and 80, so 80 is treated as spurious
        let rising = [20, 40, 60, 80];
        let falling = [30, 50, 90];
        let matched = match_edges(&rising, &falling, 200).unwrap();
        assert_eq!(matched.tops, vec![20, 40]);
        assert_eq!(matched.bottoms, vec![30, 50]);
    }

    #[test]
    fn test_unmatched_last_top_dropped() {
        // 100 has nothing below it; 80 becomes the trailing top and is
        // discarded with its bottom as usual
        let rising = [20, 40, 60, 80, 100];
        let falling = [30, 50, 70, 90];
        let matched = match_edges(&rising, &falling, 200).unwrap();
        assert_eq!(matched.tops, vec![20, 40, 60]);
        assert_eq!(matched.bottoms, vec![30, 50, 70]);
    }

    #[test]
    fn test_bottom_must_precede_profile_end() {
        // 199 == n - 1 is not a valid bottom for the last top
        let rising = [20, 150];
        let falling = [30, 199];
        let matched = match_edges(&rising, &falling, 200).unwrap();
        assert!(matched.tops.is_empty());
        assert!(matched.bottoms.is_empty());
    }

    #[test]
    fn test_no_rising_steps() {
        assert_eq!(
            match_edges(&[], &[10, 20], 100),
            Err(BandError::NoBandsDetected)
        );
    }

    #[test]
    fn test_all_tops_removed() {
        assert_eq!(
            match_edges(&[50], &[10, 20], 100),
            Err(BandError::NoBandsDetected)
        );
    }

    #[test]
    fn test_repeated_repair() {
        // 30 and 35 both sit above the same band and are dropped in turn
        let rising = [20, 30, 35, 60, 90];
        let falling = [45, 75, 95];
        let matched = match_edges(&rising, &falling, 120).unwrap();
        assert_eq!(matched.tops, vec![20, 60]);
        assert_eq!(matched.bottoms, vec![45, 75]);
        assert_eq!(matched.tops.len(), matched.bottoms.len());
    }
}
