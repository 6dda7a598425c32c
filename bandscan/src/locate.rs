//! The band location pipeline.
//!
//! Region -> profile -> raw steps (both channels) -> range filter ->
//! double filter (rising edges) -> boundary trim (rising edges) ->
//! edge matching -> bands.
//!
//! Every call is independent; [`locate_bands_batch`] runs many regions in
//! parallel with no shared state.

use crate::bands::{assemble_bands, Band};
use crate::config::LocateConfig;
use crate::error::BandError;
use crate::matching::match_edges;
use crate::powerfit::{fit_power_law, PowerFitOptions, PowerLaw};
use crate::profile::{extract_profile, Profile};
use crate::region::Region;
use crate::steps::{
    filter_doubles, filter_range, spacings, trim_boundary_gaps, StepDetector,
    ThresholdStepDetector, TrimOptions,
};
use rayon::prelude::*;
use std::borrow::Cow;

/// Intermediate step lists kept when [`LocateConfig::verbose`] is set
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diagnostics {
    /// Rising-edge steps straight from the detector
    pub raw_positive: Vec<usize>,
    /// Falling-edge steps straight from the detector
    pub raw_negative: Vec<usize>,
    /// Rising-edge steps inside the analysis window
    pub positive_in_range: Vec<usize>,
    /// Falling-edge steps inside the analysis window, as used for matching
    pub negative_in_range: Vec<usize>,
    /// Rising-edge steps after double filtering
    pub positive_filtered: Vec<usize>,
    /// Rising-edge steps after boundary trimming, as used for matching
    pub positive_trimmed: Vec<usize>,
}

/// Result of analysing one region
#[derive(Debug, Clone, PartialEq)]
pub struct BandScan {
    /// Bands ordered by top edge
    pub bands: Vec<Band>,
    /// Rising-edge derivative channel
    pub positive: Vec<f64>,
    /// Falling-edge derivative channel
    pub negative: Vec<f64>,
    /// Profile length (rows after any rescaling)
    pub profile_len: usize,
    pub diagnostics: Option<Diagnostics>,
}

impl BandScan {
    /// Spacing between consecutive band tops
    pub fn top_spacings(&self) -> Vec<usize> {
        let tops: Vec<usize> = self.bands.iter().map(|b| b.top).collect();
        spacings(&tops)
    }
}

/// Locate bands with the default configuration and step detector
pub fn locate_bands(region: &Region) -> Result<BandScan, BandError> {
    locate_bands_with(region, &LocateConfig::default(), &ThresholdStepDetector)
}

/// Locate bands in `region`.
///
/// # Errors
/// * `BandError::InvalidConfig` - `config` fails validation or names a
///   missing channel
/// * `BandError::DegenerateInput` - the profile is flat
/// * `BandError::NoBandsDetected` - no rising edge could be matched
pub fn locate_bands_with<D>(
    region: &Region,
    config: &LocateConfig,
    detector: &D,
) -> Result<BandScan, BandError>
where
    D: StepDetector + ?Sized,
{
    config.validate()?;

    let region = scaled_region(region, config.superscale)?;
    let profile = extract_profile(&region, config.mode, config.smoothing_sigma)?;

    let raw_positive = detector.find_steps(&profile.positive, config.sensitivity);
    let raw_negative = detector.find_steps(&profile.negative, config.negative_sensitivity);
    log::debug!("Raw rising steps: {:?}", raw_positive);
    log::debug!("Raw falling steps: {:?}", raw_negative);

    let (bands, mut diagnostics) =
        resolve_bands(&raw_positive, &raw_negative, &profile.positive, config)?;
    diagnostics.raw_positive = raw_positive;
    diagnostics.raw_negative = raw_negative;

    log::info!(
        "Located {} band(s) in {}-sample profile",
        bands.len(),
        profile.len()
    );

    let Profile {
        positive, negative, ..
    } = profile;

    Ok(BandScan {
        bands,
        profile_len: positive.len(),
        positive,
        negative,
        diagnostics: config.verbose.then_some(diagnostics),
    })
}

/// Turn raw step candidates into bands.
///
/// `positive_channel` supplies the edge strengths used by the double filter
/// and fixes the profile length. The returned diagnostics carry every
/// intermediate step list except the raw ones.
pub fn resolve_bands(
    raw_positive: &[usize],
    raw_negative: &[usize],
    positive_channel: &[f64],
    config: &LocateConfig,
) -> Result<(Vec<Band>, Diagnostics), BandError> {
    let n = positive_channel.len();

    let positive_in_range = filter_range(raw_positive, n, config.bot_end, config.top_end);
    let negative_in_range = filter_range(raw_negative, n, config.bot_end, config.top_end);
    log::debug!("Rising steps in window: {:?}", positive_in_range);
    if positive_in_range.is_empty() {
        log::warn!("No rising steps inside the analysis window");
    }

    // Bottoms are taken as the last candidate before the next top, so
    // filtering doubles on the falling channel is unnecessary
    let positive_filtered = if config.filter_doubles {
        filter_doubles(&positive_in_range, positive_channel, config.min_resolvable)
    } else {
        positive_in_range.clone()
    };
    log::debug!("Rising steps after double filter: {:?}", positive_filtered);

    let positive_trimmed = if config.trim_boundaries {
        let options = TrimOptions {
            rejection: config.rejection,
            reject_last: config.reject_last,
        };
        trim_boundary_gaps(&positive_filtered, &options)
    } else {
        positive_filtered.clone()
    };
    log::debug!("Rising steps after boundary trim: {:?}", positive_trimmed);

    let matched = match_edges(&positive_trimmed, &negative_in_range, n)?;
    let bands = assemble_bands(&matched.tops, &matched.bottoms)?;

    let diagnostics = Diagnostics {
        raw_positive: Vec::new(),
        raw_negative: Vec::new(),
        positive_in_range,
        negative_in_range,
        positive_filtered,
        positive_trimmed,
    };

    Ok((bands, diagnostics))
}

/// Locate bands in many regions in parallel.
///
/// Results are returned in input order, one per region.
pub fn locate_bands_batch<D>(
    regions: &[Region],
    config: &LocateConfig,
    detector: &D,
) -> Vec<Result<BandScan, BandError>>
where
    D: StepDetector + Sync + ?Sized,
{
    regions
        .par_iter()
        .map(|region| locate_bands_with(region, config, detector))
        .collect()
}

/// Rising-edge spacing trend for a region
#[derive(Debug, Clone, PartialEq)]
pub struct TopEdgeSurvey {
    /// Rising-edge derivative channel
    pub positive: Vec<f64>,
    /// Rising steps from the detector
    pub raw_steps: Vec<usize>,
    /// Rising steps after boundary trimming
    pub steps: Vec<usize>,
    /// Spacings of `steps`
    pub spacings: Vec<usize>,
    /// Power-law trend of `spacings`, when at least three are available
    pub fit: Option<PowerLaw>,
}

/// Survey the rising edges of a region and fit their spacing trend.
///
/// Uses only the positive channel: no analysis window, no double filter and
/// no edge matching. Steps are trimmed with the default [`TrimOptions`]
/// (rejection 1.15, trailing step rejected).
pub fn survey_top_edges<D>(
    region: &Region,
    config: &LocateConfig,
    detector: &D,
) -> Result<TopEdgeSurvey, BandError>
where
    D: StepDetector + ?Sized,
{
    config.validate()?;

    let region = scaled_region(region, config.superscale)?;
    let profile = extract_profile(&region, config.mode, config.smoothing_sigma)?;

    let raw_steps = detector.find_steps(&profile.positive, config.sensitivity);
    let steps = trim_boundary_gaps(&raw_steps, &TrimOptions::default());
    let spacing = spacings(&steps);

    let fit = if spacing.len() >= 3 {
        let ys: Vec<f64> = spacing.iter().map(|&s| s as f64).collect();
        match fit_power_law(&ys, None, &PowerFitOptions::default()) {
            Ok(fit) => Some(fit),
            Err(e) => {
                log::warn!("Spacing trend fit failed: {e}");
                None
            }
        }
    } else {
        log::warn!(
            "Only {} spacing(s) after trimming, skipping trend fit",
            spacing.len()
        );
        None
    };

    Ok(TopEdgeSurvey {
        positive: profile.positive,
        raw_steps,
        steps,
        spacings: spacing,
        fit,
    })
}

fn scaled_region(region: &Region, superscale: f64) -> Result<Cow<'_, Region>, BandError> {
    if superscale == 1.0 {
        Ok(Cow::Borrowed(region))
    } else {
        log::debug!("Rescaling region by {superscale}");
        Ok(Cow::Owned(region.rescale(superscale)?))
    }
}
