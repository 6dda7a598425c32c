//! Final band list assembled from matched edges.

use crate::error::BandError;
use serde::{Deserialize, Serialize};

/// One horizontal layer delimited by a rising and a falling edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Band {
    /// Index of the rising (top) edge
    pub top: usize,
    /// Index of the falling (bottom) edge, always below `top`
    pub bottom: usize,
    /// `bottom - top`
    pub width: usize,
}

impl Band {
    /// Create a band, or `None` unless `bottom > top`
    pub fn new(top: usize, bottom: usize) -> Option<Self> {
        (bottom > top).then(|| Self {
            top,
            bottom,
            width: bottom - top,
        })
    }

    /// Midpoint between the two edges
    pub fn center(&self) -> f64 {
        (self.top + self.bottom) as f64 / 2.0
    }
}

/// Zip index-aligned tops and bottoms into bands.
///
/// # Errors
/// * `BandError::InvariantViolation` - the lengths differ or a bottom does
///   not lie below its top
pub fn assemble_bands(tops: &[usize], bottoms: &[usize]) -> Result<Vec<Band>, BandError> {
    if tops.len() != bottoms.len() {
        return Err(BandError::InvariantViolation(format!(
            "{} top edges but {} bottom edges",
            tops.len(),
            bottoms.len()
        )));
    }

    tops.iter()
        .zip(bottoms)
        .map(|(&top, &bottom)| {
            Band::new(top, bottom).ok_or_else(|| {
                BandError::InvariantViolation(format!("bottom {bottom} not below top {top}"))
            })
        })
        .collect()
}
