//! Configuration for the band location pipeline.
//!
//! Defaults reproduce the tuning used for stratified vial images: a fairly
//! strict threshold on rising edges, a permissive one on falling edges, and a
//! window that ignores the top quarter of the region (meniscus, cap) and the
//! last 5% (vial bottom).

use crate::error::BandError;
use crate::filters::MIN_RESCALE_FACTOR;
use crate::profile::ReduceMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options controlling [`crate::locate_bands_with`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocateConfig {
    /// Step threshold on the rising-edge (positive) channel, typically 0.1-0.3
    pub sensitivity: f64,
    /// Step threshold on the falling-edge (negative) channel
    pub negative_sensitivity: f64,
    /// How channels are reduced to a single profile
    pub mode: ReduceMode,
    /// Steps at or beyond `top_end * N` are discarded
    pub top_end: f64,
    /// Steps at or before `bot_end * N` are discarded
    pub bot_end: f64,
    /// Spacing ratio above which the boundary trimmer cuts the sequence
    pub rejection: f64,
    /// Let the boundary trimmer drop a trailing step with an oversized last gap
    pub reject_last: bool,
    /// Run the boundary gap trimmer on rising edges
    pub trim_boundaries: bool,
    /// Run the double-detection filter on rising edges
    pub filter_doubles: bool,
    /// Minimum spacing (in samples) at which a double detection is considered
    pub min_resolvable: usize,
    /// Width of the Gaussian derivative filter in samples
    pub smoothing_sigma: f64,
    /// Upsampling factor applied to the region before analysis
    pub superscale: f64,
    /// Keep raw and intermediate step lists in the result
    pub verbose: bool,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.25,
            negative_sensitivity: 0.10,
            mode: ReduceMode::Average,
            top_end: 0.95,
            bot_end: 0.25,
            rejection: 1.85,
            reject_last: false,
            trim_boundaries: true,
            filter_doubles: true,
            min_resolvable: 20,
            smoothing_sigma: 3.0,
            superscale: 1.0,
            verbose: false,
        }
    }
}

impl LocateConfig {
    /// Check that every option is usable before any work is done.
    ///
    /// Channel indices are checked later against the actual region.
    pub fn validate(&self) -> Result<(), BandError> {
        for (name, value) in [
            ("sensitivity", self.sensitivity),
            ("negative_sensitivity", self.negative_sensitivity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(BandError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.bot_end) || !(0.0..=1.0).contains(&self.top_end) {
            return Err(BandError::InvalidConfig(format!(
                "window bounds must lie in [0, 1], got ({}, {})",
                self.bot_end, self.top_end
            )));
        }
        if self.bot_end >= self.top_end {
            return Err(BandError::InvalidConfig(format!(
                "bot_end ({}) must be below top_end ({})",
                self.bot_end, self.top_end
            )));
        }

        if !self.rejection.is_finite() || self.rejection <= 0.0 {
            return Err(BandError::InvalidConfig(format!(
                "rejection must be positive, got {}",
                self.rejection
            )));
        }
        if !self.smoothing_sigma.is_finite() || self.smoothing_sigma <= 0.0 {
            return Err(BandError::InvalidConfig(format!(
                "smoothing_sigma must be positive, got {}",
                self.smoothing_sigma
            )));
        }
        if !self.superscale.is_finite() || self.superscale < MIN_RESCALE_FACTOR {
            return Err(BandError::InvalidConfig(format!(
                "superscale must be at least {MIN_RESCALE_FACTOR}, got {}",
                self.superscale
            )));
        }

        Ok(())
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Load from JSON file. Missing fields take their default values.
    pub fn load_from_file(path: &Path) -> Result<Self, std::io::Error> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(LocateConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_window() {
        let config = LocateConfig {
            bot_end: 0.9,
            top_end: 0.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BandError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_bad_superscale() {
        for superscale in [0.0, -2.0, 1e-10, f64::NAN] {
            let config = LocateConfig {
                superscale,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "superscale {superscale}");
        }
    }

    #[test]
    fn test_rejects_negative_sensitivity() {
        let config = LocateConfig {
            negative_sensitivity: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LocateConfig =
            serde_json::from_str(r#"{"sensitivity": 0.15, "mode": {"Channel": 2}}"#).unwrap();
        assert_eq!(config.sensitivity, 0.15);
        assert_eq!(config.mode, ReduceMode::Channel(2));
        assert_eq!(config.min_resolvable, 20);
        assert_eq!(config.top_end, 0.95);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locate.json");

        let config = LocateConfig {
            superscale: 2.0,
            verbose: true,
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = LocateConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
