//! Core types, settings and outputs for the compass fusion library

use nalgebra::Vector3;

use crate::error::{FusionError, Result};

/// Opaque, monotonically non-decreasing sample counter supplied by the caller.
///
/// The library never interprets the unit; it only propagates the value attached
/// to whichever sample produced an output.
pub type Timestamp = i64;

/// Magnetometer calibration trust level.
///
/// The pipeline itself only ever moves between [`Accuracy::Unreliable`] and
/// [`Accuracy::High`]; the intermediate levels exist for callers that grade
/// their own data the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Accuracy {
    /// Offset unknown, rejected, or the field is disturbed
    #[default]
    Unreliable = 0,
    /// Low confidence
    Low = 1,
    /// Medium confidence
    Medium = 2,
    /// Offset accepted and stable
    High = 3,
}

impl Accuracy {
    /// Numeric level, 0 to 3
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Accuracy {
    type Error = FusionError;

    /// Accuracy from its numeric level, for callers grading their own data
    fn try_from(level: u8) -> Result<Self> {
        match level {
            0 => Ok(Accuracy::Unreliable),
            1 => Ok(Accuracy::Low),
            2 => Ok(Accuracy::Medium),
            3 => Ok(Accuracy::High),
            _ => Err(FusionError::InvalidArgument),
        }
    }
}

/// Sensor a sample originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorKind {
    /// Magnetometer, microtesla
    Magnetometer,
    /// Accelerometer, meters per second squared
    Accelerometer,
    /// Gyroscope, degrees per second (not fused)
    Gyroscope,
}

/// A timestamped sensor reading in physical units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Which sensor produced the reading
    pub kind: SensorKind,
    /// Reading in the canonical (already rotated) device frame
    pub vector: Vector3<f32>,
    /// Caller supplied timestamp
    pub timestamp: Timestamp,
}

impl Sample {
    /// Magnetometer sample in microtesla
    pub fn magnetometer(vector: Vector3<f32>, timestamp: Timestamp) -> Self {
        Self {
            kind: SensorKind::Magnetometer,
            vector,
            timestamp,
        }
    }

    /// Accelerometer sample in m/s²
    pub fn accelerometer(vector: Vector3<f32>, timestamp: Timestamp) -> Self {
        Self {
            kind: SensorKind::Accelerometer,
            vector,
            timestamp,
        }
    }

    /// Gyroscope sample in deg/s
    pub fn gyroscope(vector: Vector3<f32>, timestamp: Timestamp) -> Self {
        Self {
            kind: SensorKind::Gyroscope,
            vector,
            timestamp,
        }
    }
}

/// Automatic offset calibration settings
///
/// # Example
/// ```
/// use compass_fusion::CalibrationSettings;
///
/// let settings = CalibrationSettings {
///     min_separation: 15.0,        // demand wider sweeps
///     ..Default::default()
/// };
/// assert_eq!(settings.stability_threshold, 0.15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationSettings {
    /// Minimum distance in µT between any two of the four fit points
    ///
    /// Points closer than this cannot constrain a sphere reliably.
    pub min_separation: f32,
    /// Allowed spread of the offset history, as a fraction of the fitted radius
    ///
    /// The estimate is accepted once every axis range of the last four fitted
    /// centers is below `radius * stability_threshold`.
    pub stability_threshold: f32,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            min_separation: 10.0,
            stability_threshold: 0.15,
        }
    }
}

/// Fusion pipeline settings
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use compass_fusion::{FusionSettings, FusionState};
///
/// let settings = FusionSettings {
///     magnetometer_sensitivity: Vector3::new(1.0, 1.0, 1.1),
///     ..Default::default()
/// };
/// let state = FusionState::with_settings(settings);
/// assert_eq!(state.settings().vector_average_count, 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionSettings {
    /// Per-axis magnetometer scale; every component must be positive
    pub magnetometer_sensitivity: Vector3<f32>,
    /// Per-axis accelerometer scale; every component must be positive
    pub accelerometer_sensitivity: Vector3<f32>,
    /// Scale applied after the sensitivity division
    pub target_scale: f32,
    /// Field magnitude in µT above which the magnetometer is considered disturbed
    pub geomagnetic_max: f32,
    /// Number of samples averaged for the reported sensor vectors
    pub vector_average_count: usize,
    /// Number of samples averaged when computing the orientation
    pub direction_average_count: usize,
    /// Automatic offset calibration settings
    pub calibration: CalibrationSettings,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            magnetometer_sensitivity: Vector3::repeat(1.0),
            accelerometer_sensitivity: Vector3::repeat(1.0),
            target_scale: 1.0,
            geomagnetic_max: 70.0,
            vector_average_count: 8,
            direction_average_count: 4,
            calibration: CalibrationSettings::default(),
        }
    }
}

/// Latest calibrated magnetometer output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagneticOutput {
    /// Averaged, offset-corrected field in µT
    pub vector: Vector3<f32>,
    /// Hard-iron offset currently applied, µT
    pub offset: Vector3<f32>,
    /// Calibration trust level
    pub accuracy: Accuracy,
    /// Timestamp of the sample that produced `vector`
    pub timestamp: Timestamp,
}

/// Latest averaged accelerometer output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelerationOutput {
    /// Averaged acceleration in m/s²
    pub vector: Vector3<f32>,
    /// Always [`Accuracy::High`]; accelerometer confidence is not tracked
    pub accuracy: Accuracy,
    /// Timestamp of the sample that produced `vector`
    pub timestamp: Timestamp,
}

/// Tilt-compensated heading
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Orientation {
    /// Heading in degrees, `[0, 360)`
    pub azimuth: f32,
    /// Pitch in degrees, `[-90, 90]`
    pub pitch: f32,
    /// Roll in degrees, `[-90, 90]`
    pub roll: f32,
    /// Accelerometer timestamp, the value reported for the combined output
    pub timestamp: Timestamp,
    /// Magnetometer timestamp, for callers that need azimuth provenance
    pub magnetometer_timestamp: Timestamp,
}
