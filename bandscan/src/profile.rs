//! Reduction of a region to a normalized 1-D profile and its edge channels.

use crate::error::BandError;
use crate::filters::gaussian_derivative;
use crate::region::Region;
use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};

/// How the channels of a region are combined into one profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ReduceMode {
    /// Unweighted mean of all channels
    #[default]
    Average,
    /// A single channel by index
    Channel(usize),
}

/// Normalized intensity profile along the scan axis
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Intensity per row, scaled to [0, 1]
    pub values: Vec<f64>,
    /// Rising part of the smoothed derivative, scaled so its maximum is 1
    pub positive: Vec<f64>,
    /// Falling part of the smoothed derivative, scaled so its minimum is -1
    pub negative: Vec<f64>,
}

impl Profile {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Collapse `region` into a [`Profile`].
///
/// Columns are averaged per row and channel, channels are reduced per `mode`,
/// and the result is min-max normalized before the derivative channels are
/// computed with a Gaussian of width `sigma`.
///
/// # Errors
/// * `BandError::InvalidConfig` - `mode` names a channel the region lacks, or
///   `sigma` is not finite and positive
/// * `BandError::DegenerateInput` - every row has the same intensity
pub fn extract_profile(region: &Region, mode: ReduceMode, sigma: f64) -> Result<Profile, BandError> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(BandError::InvalidConfig(format!(
            "smoothing sigma must be positive, got {sigma}"
        )));
    }

    let per_row = region
        .view()
        .mean_axis(Axis(1))
        .ok_or_else(|| BandError::InvalidRegion("region has no columns".to_string()))?;

    let raw: Array1<f64> = match mode {
        ReduceMode::Average => per_row
            .mean_axis(Axis(1))
            .ok_or_else(|| BandError::InvalidRegion("region has no channels".to_string()))?,
        ReduceMode::Channel(channel) => {
            if channel >= region.channels() {
                return Err(BandError::InvalidConfig(format!(
                    "channel {channel} requested but region has {} channel(s)",
                    region.channels()
                )));
            }
            per_row.column(channel).to_owned()
        }
    };

    let values = normalize(&raw.to_vec())?;
    let derivative = gaussian_derivative(&values, sigma);

    Ok(Profile {
        positive: rescale_positive(&derivative),
        negative: rescale_negative(&derivative),
        values,
    })
}

/// Min-subtract and max-divide into [0, 1]
fn normalize(raw: &[f64]) -> Result<Vec<f64>, BandError> {
    let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if raw.is_empty() || range <= 0.0 || !range.is_finite() {
        return Err(BandError::DegenerateInput {
            len: raw.len(),
            value: min,
        });
    }

    Ok(raw.iter().map(|v| (v - min) / range).collect())
}

fn rescale_positive(derivative: &[f64]) -> Vec<f64> {
    let clipped: Vec<f64> = derivative.iter().map(|d| d.max(0.0)).collect();
    let peak = clipped.iter().copied().fold(0.0, f64::max);
    if peak > 0.0 {
        clipped.iter().map(|v| v / peak).collect()
    } else {
        clipped
    }
}

fn rescale_negative(derivative: &[f64]) -> Vec<f64> {
    let clipped: Vec<f64> = derivative.iter().map(|d| d.min(0.0)).collect();
    let trough = clipped.iter().copied().fold(0.0, f64::min);
    if trough < 0.0 {
        clipped.iter().map(|v| v / -trough).collect()
    } else {
        clipped
    }
}
