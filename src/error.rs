//! Error types for the compass fusion pipeline

use core::fmt;

/// Result type for fusion operations
pub type Result<T> = core::result::Result<T, FusionError>;

/// Reasons an operation could not produce a result.
///
/// Every failure is local and non-fatal. Buffers are left as they were before
/// the call, except that the calibrator always records the raw sample it was
/// handed before it validates anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FusionError {
    /// A precondition was violated: bad counts, non-positive sensitivity,
    /// unrecognized layout pattern, malformed persisted record.
    InvalidArgument,
    /// The numbers did not allow a result: near-zero denominator, points too
    /// close together, gravity vector too small.
    Degenerate,
    /// Not enough history has been collected, or the offset estimates have not
    /// settled yet.
    NotYetCalibrated,
    /// The sensor type is recognized but not handled (gyroscope).
    NotSupported,
}

impl fmt::Display for FusionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FusionError::InvalidArgument => write!(f, "invalid argument"),
            FusionError::Degenerate => write!(f, "degenerate geometry"),
            FusionError::NotYetCalibrated => write!(f, "not yet calibrated"),
            FusionError::NotSupported => write!(f, "not supported"),
        }
    }
}

impl core::error::Error for FusionError {}
