//! Band edge detection for images of layered samples
//!
//! Reduces a 2-D (or 3-D, with channels) intensity region to a 1-D profile,
//! finds rising and falling step edges along it, and repairs the candidate
//! edges into a list of horizontal bands (top, bottom, width).
//!
//! The processing chain, leaves first:
//!
//! - [`profile`]: region -> normalized profile + derivative channels
//! - [`steps`]: step detection, range filter, double filter, boundary trimming
//! - [`matching`]: pairs rising edges with falling edges
//! - [`bands`]: final band list
//! - [`locate`]: the full pipeline, single region or parallel batch
//!
//! ```no_run
//! use bandscan::{locate_bands, LocateConfig, Region};
//! use ndarray::Array2;
//!
//! let image = Array2::<f64>::zeros((400, 60));
//! let region = Region::from_gray(image.view()).unwrap();
//! let scan = locate_bands(&region).unwrap();
//! for band in &scan.bands {
//!     println!("{} -> {} ({} px)", band.top, band.bottom, band.width);
//! }
//! ```

pub mod bands;
pub mod config;
pub mod error;
pub mod filters;
pub mod locate;
pub mod matching;
pub mod powerfit;
pub mod profile;
pub mod region;
pub mod steps;

pub use bands::{assemble_bands, Band};
pub use config::LocateConfig;
pub use error::BandError;
pub use locate::{
    locate_bands, locate_bands_batch, locate_bands_with, survey_top_edges, BandScan, Diagnostics,
    TopEdgeSurvey,
};
pub use matching::{match_edges, MatchedEdges};
pub use powerfit::{fit_power_law, PowerFitOptions, PowerLaw};
pub use profile::{extract_profile, Profile, ReduceMode};
pub use region::Region;
pub use steps::{StepDetector, ThresholdStepDetector};
