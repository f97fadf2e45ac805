//! Tilt-compensated compass
//!
//! Device frame: X points right, Y points toward the top edge and Z out of the
//! screen. Pitch is the rotation about X, roll the rotation about Y and the
//! azimuth is measured clockwise from magnetic north toward the Y axis.

use crate::buffer::VectorBuffer;
use crate::error::{FusionError, Result};
use crate::math::{EPSILON, RAD_TO_DEG};
use crate::normalize::average;
use crate::types::{Orientation, Timestamp};
use nalgebra::{ComplexField, RealField, Vector3};

/// Pitch and roll in radians from a gravity vector.
///
/// Fails with [`FusionError::Degenerate`] when the vector has no usable
/// magnitude.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use compass_fusion::compass::pitch_roll;
///
/// let (pitch, roll) = pitch_roll(Vector3::new(0.0, 0.0, 9.8)).unwrap();
/// assert!(pitch.abs() < 1e-6);
/// assert!(roll.abs() < 1e-6);
/// ```
pub fn pitch_roll(accelerometer: Vector3<f32>) -> Result<(f32, f32)> {
    let magnitude = accelerometer.magnitude();
    if magnitude < EPSILON {
        return Err(FusionError::Degenerate);
    }

    let pitch = (-accelerometer.y / magnitude).asin();
    let roll = (accelerometer.x / magnitude).asin();

    Ok((pitch, roll))
}

/// Azimuth in radians, `(-π, π]`, of a magnetometer vector after removing tilt.
///
/// # Arguments
/// * `magnetometer` - Calibrated magnetic field
/// * `pitch` - Pitch in radians
/// * `roll` - Roll in radians
pub fn azimuth(magnetometer: Vector3<f32>, pitch: f32, roll: f32) -> f32 {
    let (sin_pitch, cos_pitch) = (pitch.sin(), pitch.cos());
    let (sin_roll, cos_roll) = (roll.sin(), roll.cos());

    // field projected onto the horizontal plane
    let horizontal_y = -magnetometer.x * cos_roll + magnetometer.z * sin_roll;
    let horizontal_x = magnetometer.x * sin_pitch * sin_roll
        + magnetometer.y * cos_pitch
        + magnetometer.z * sin_pitch * cos_roll;

    horizontal_y.atan2(horizontal_x)
}

/// Maps an azimuth in degrees into `[0, 360)`.
///
/// Negative angles are moved up by a full turn. A small negative residual can
/// round to exactly 360 in single precision; that is reported as 0.
pub fn normalize_azimuth(degrees: f32) -> f32 {
    let wrapped = if degrees < 0.0 { degrees + 360.0 } else { degrees };
    if wrapped >= 360.0 { wrapped - 360.0 } else { wrapped }
}

/// Heading, pitch and roll in degrees from magnetometer and accelerometer
/// windows.
///
/// The newest `magnetometer_count` and `accelerometer_count` entries of each
/// window are averaged before the angles are computed. The returned
/// timestamps are zero; callers attach their own.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use compass_fusion::{VectorBuffer, compass::direction};
///
/// let mut magnetometer = VectorBuffer::<4>::new();
/// let mut accelerometer = VectorBuffer::<4>::new();
/// magnetometer.push(Vector3::new(0.0, 25.0, -40.0)); // north, level
/// accelerometer.push(Vector3::new(0.0, 0.0, 9.8));
///
/// let orientation = direction(&magnetometer, 4, &accelerometer, 4).unwrap();
/// assert!(orientation.azimuth.abs() < 1e-3);
/// ```
pub fn direction<const N: usize, const M: usize>(
    magnetometer: &VectorBuffer<N>,
    magnetometer_count: usize,
    accelerometer: &VectorBuffer<M>,
    accelerometer_count: usize,
) -> Result<Orientation> {
    if magnetometer_count < 1 || magnetometer_count > N {
        return Err(FusionError::InvalidArgument);
    }
    if accelerometer_count < 1 || accelerometer_count > M {
        return Err(FusionError::InvalidArgument);
    }

    let field = average(magnetometer, magnetometer_count)?;
    let gravity = average(accelerometer, accelerometer_count)?;

    let (pitch, roll) = pitch_roll(gravity)?;
    let heading = azimuth(field, pitch, roll);

    Ok(Orientation {
        azimuth: normalize_azimuth(heading * RAD_TO_DEG),
        pitch: pitch * RAD_TO_DEG,
        roll: roll * RAD_TO_DEG,
        timestamp: Timestamp::default(),
        magnetometer_timestamp: Timestamp::default(),
    })
}
