//! Removal of "double" detections: one physical edge reported as two steps.
//!
//! A double shows up in the spacing pattern as a short gap squeezed between
//! two normal ones, slightly left of centre, with the extra step weaker than
//! both of its neighbours.

use super::spacings;

/// Last spacing below this fraction of the previous one counts as a downturn
const TRAILING_DOWNTURN_RATIO: f64 = 0.96;

/// Remove double detections from rising-edge `steps`.
///
/// Repeats until a pass marks nothing. Within a pass every spacing triple
/// `(s[i], s[i+1], s[i+2])` with `s[i] >= min_resolvable`, `s[i+1] <= s[i]`
/// and `s[i+2] >= s[i+1]` marks step `i + 2` when `channel` is strictly weaker
/// there than at steps `i + 1` and `i + 3`. Spacings are recomputed after
/// every pass.
///
/// Once no doubles remain, a sequence of three or more steps whose last
/// spacing is under 0.96 of the one before loses its final step.
///
/// `channel` is indexed by step value; steps outside it are never marked.
pub fn filter_doubles(steps: &[usize], channel: &[f64], min_resolvable: usize) -> Vec<usize> {
    let mut cleaned = steps.to_vec();

    loop {
        let spacing = spacings(&cleaned);
        let marked: Vec<usize> = (0..spacing.len().saturating_sub(2))
            .filter(|&i| {
                let (wide, narrow, next) = (spacing[i], spacing[i + 1], spacing[i + 2]);
                wide >= min_resolvable
                    && narrow <= wide
                    && next >= narrow
                    && weaker_than_neighbours(&cleaned, channel, i + 2)
            })
            .map(|i| i + 2)
            .collect();

        if marked.is_empty() {
            break;
        }

        log::debug!(
            "Removing double steps {:?}",
            marked.iter().map(|&i| cleaned[i]).collect::<Vec<_>>()
        );
        for &index in marked.iter().rev() {
            cleaned.remove(index);
        }
    }

    if cleaned.len() >= 3 {
        let spacing = spacings(&cleaned);
        let last = spacing[spacing.len() - 1] as f64;
        let previous = spacing[spacing.len() - 2] as f64;
        if last < TRAILING_DOWNTURN_RATIO * previous {
            log::debug!("Dropping trailing downturn step {:?}", cleaned.last());
            cleaned.pop();
        }
    }

    cleaned
}

fn weaker_than_neighbours(steps: &[usize], channel: &[f64], index: usize) -> bool {
    let strength = |i: usize| steps.get(i).and_then(|&s| channel.get(s)).copied();

    match (strength(index - 1), strength(index), strength(index + 1)) {
        (Some(before), Some(value), Some(after)) => value < before && value < after,
        _ => false,
    }
}
