//! Error types for band location

use thiserror::Error;

/// Errors raised while locating bands in a region
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BandError {
    /// Profile has no dynamic range, normalization is undefined
    #[error("Degenerate profile: all {len} samples equal {value}")]
    DegenerateInput { len: usize, value: f64 },

    #[error("No bands detected: edge matching removed every rising edge")]
    NoBandsDetected,

    /// Internal alignment invariant broken
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Power-law fit failed: {0}")]
    FitFailed(String),
}
