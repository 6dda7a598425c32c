//! Intensity regions under analysis.
//!
//! A region is stored as a (rows, cols, channels) array. Rows run along the
//! scan axis (the direction bands are stacked in), columns across it.

use crate::error::BandError;
use crate::filters::{rescale_bilinear, MIN_RESCALE_FACTOR};
use ndarray::{Array3, ArrayView2, ArrayView3, Axis};

/// Immutable 2-D intensity region with one or more channels
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    data: Array3<f64>,
}

impl Region {
    /// Build a single-channel region from a grayscale array (rows, cols)
    pub fn from_gray(image: ArrayView2<f64>) -> Result<Self, BandError> {
        Self::from_channels(image.insert_axis(Axis(2)))
    }

    /// Build a region from a (rows, cols, channels) array
    pub fn from_channels(data: ArrayView3<f64>) -> Result<Self, BandError> {
        let (rows, cols, channels) = data.dim();
        if rows == 0 || cols == 0 || channels == 0 {
            return Err(BandError::InvalidRegion(format!(
                "region must be non-empty, got shape {rows}x{cols}x{channels}"
            )));
        }
        if let Some(bad) = data.iter().find(|v| !v.is_finite()) {
            return Err(BandError::InvalidRegion(format!(
                "region contains non-finite sample {bad}"
            )));
        }

        Ok(Self {
            data: data.to_owned(),
        })
    }

    /// Build a single-channel region from raw 16-bit sensor counts
    pub fn from_u16(image: ArrayView2<u16>) -> Result<Self, BandError> {
        let image_f64 = image.mapv(|x| x as f64);
        Self::from_gray(image_f64.view())
    }

    /// Number of samples along the scan axis
    pub fn rows(&self) -> usize {
        self.data.dim().0
    }

    pub fn cols(&self) -> usize {
        self.data.dim().1
    }

    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    pub fn view(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    /// Resample the spatial axes by `factor`, leaving channels untouched.
    pub fn rescale(&self, factor: f64) -> Result<Region, BandError> {
        if !factor.is_finite() || factor < MIN_RESCALE_FACTOR {
            return Err(BandError::InvalidConfig(format!(
                "rescale factor must be at least {MIN_RESCALE_FACTOR}, got {factor}"
            )));
        }

        Ok(Region {
            data: rescale_bilinear(self.data.view(), factor),
        })
    }
}
