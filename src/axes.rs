//! Sensor layout patterns
//!
//! A magnetometer or accelerometer can be soldered in one of eight
//! orientations relative to the device frame (four on the obverse of the
//! board, four on the reverse). Readings must be remapped into the canonical
//! device frame before they reach the fusion pipeline.
//!
//! # Example
//! ```
//! use nalgebra::Vector3;
//! use compass_fusion::{LayoutPattern, rotate};
//!
//! let sensor = Vector3::new(1.0, 2.0, 3.0);
//!
//! // Chip turned a quarter clockwise on the obverse side
//! let device = rotate(sensor, LayoutPattern::Pat2);
//!
//! assert_eq!(device.x, 2.0);   // Device X = Sensor Y
//! assert_eq!(device.y, -1.0);  // Device Y = -Sensor X
//! assert_eq!(device.z, 3.0);   // Device Z = Sensor Z
//! ```

use nalgebra::{Matrix3, Vector3};

use crate::error::FusionError;

/// Mounting orientation of a sensor chip.
///
/// `Pat1` to `Pat4` are obverse mountings (Z unchanged), `Pat5` to `Pat8` are
/// mounted on the reverse side and flip Z. The numeric codes 1 to 8 match the
/// values found in board configuration tables, with 0 reserved as invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LayoutPattern {
    /// `(x, y, z)`, identity
    #[default]
    Pat1 = 1,
    /// `(y, -x, z)`
    Pat2 = 2,
    /// `(-x, -y, z)`
    Pat3 = 3,
    /// `(-y, x, z)`
    Pat4 = 4,
    /// `(-x, y, -z)`
    Pat5 = 5,
    /// `(y, x, -z)`
    Pat6 = 6,
    /// `(x, -y, -z)`
    Pat7 = 7,
    /// `(-y, -x, -z)`
    Pat8 = 8,
}

impl LayoutPattern {
    /// Every pattern in code order
    pub const ALL: [LayoutPattern; 8] = [
        LayoutPattern::Pat1,
        LayoutPattern::Pat2,
        LayoutPattern::Pat3,
        LayoutPattern::Pat4,
        LayoutPattern::Pat5,
        LayoutPattern::Pat6,
        LayoutPattern::Pat7,
        LayoutPattern::Pat8,
    ];

    /// Numeric board-table code, 1 to 8
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Pattern that undoes this one.
    ///
    /// The two quarter turns are each other's inverse; every other pattern is
    /// its own inverse.
    pub fn inverse(self) -> LayoutPattern {
        match self {
            LayoutPattern::Pat2 => LayoutPattern::Pat4,
            LayoutPattern::Pat4 => LayoutPattern::Pat2,
            other => other,
        }
    }

    /// Row-major integer matrix with the same effect as [`rotate`]
    pub fn matrix(self) -> [[i16; 3]; 3] {
        match self {
            LayoutPattern::Pat1 => [[1, 0, 0], [0, 1, 0], [0, 0, 1]],
            LayoutPattern::Pat2 => [[0, 1, 0], [-1, 0, 0], [0, 0, 1]],
            LayoutPattern::Pat3 => [[-1, 0, 0], [0, -1, 0], [0, 0, 1]],
            LayoutPattern::Pat4 => [[0, -1, 0], [1, 0, 0], [0, 0, 1]],
            LayoutPattern::Pat5 => [[-1, 0, 0], [0, 1, 0], [0, 0, -1]],
            LayoutPattern::Pat6 => [[0, 1, 0], [1, 0, 0], [0, 0, -1]],
            LayoutPattern::Pat7 => [[1, 0, 0], [0, -1, 0], [0, 0, -1]],
            LayoutPattern::Pat8 => [[0, -1, 0], [-1, 0, 0], [0, 0, -1]],
        }
    }
}

impl TryFrom<u8> for LayoutPattern {
    type Error = FusionError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(LayoutPattern::Pat1),
            2 => Ok(LayoutPattern::Pat2),
            3 => Ok(LayoutPattern::Pat3),
            4 => Ok(LayoutPattern::Pat4),
            5 => Ok(LayoutPattern::Pat5),
            6 => Ok(LayoutPattern::Pat6),
            7 => Ok(LayoutPattern::Pat7),
            8 => Ok(LayoutPattern::Pat8),
            _ => Err(FusionError::InvalidArgument),
        }
    }
}

/// Remaps a sensor reading into the device frame.
///
/// # Arguments
/// * `sensor` - Reading in the chip's own frame
/// * `pattern` - Mounting orientation of the chip
#[inline]
pub fn rotate(sensor: Vector3<f32>, pattern: LayoutPattern) -> Vector3<f32> {
    match pattern {
        LayoutPattern::Pat1 => sensor,
        LayoutPattern::Pat2 => Vector3::new(sensor.y, -sensor.x, sensor.z),
        LayoutPattern::Pat3 => Vector3::new(-sensor.x, -sensor.y, sensor.z),
        LayoutPattern::Pat4 => Vector3::new(-sensor.y, sensor.x, sensor.z),
        LayoutPattern::Pat5 => Vector3::new(-sensor.x, sensor.y, -sensor.z),
        LayoutPattern::Pat6 => Vector3::new(sensor.y, sensor.x, -sensor.z),
        LayoutPattern::Pat7 => Vector3::new(sensor.x, -sensor.y, -sensor.z),
        LayoutPattern::Pat8 => Vector3::new(-sensor.y, -sensor.x, -sensor.z),
    }
}

/// Applies an arbitrary row-major layout matrix to a sensor reading.
///
/// Used for boards whose layout is given as a matrix rather than a pattern
/// code. Any matrix is accepted.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use compass_fusion::rotate_matrix;
///
/// let swap_xy = [[0, 1, 0], [1, 0, 0], [0, 0, 1]];
/// let v = rotate_matrix(Vector3::new(1.0, 2.0, 3.0), &swap_xy);
/// assert_eq!(v, Vector3::new(2.0, 1.0, 3.0));
/// ```
#[inline]
pub fn rotate_matrix(sensor: Vector3<f32>, layout: &[[i16; 3]; 3]) -> Vector3<f32> {
    let matrix = Matrix3::from_fn(|row, col| f32::from(layout[row][col]));
    matrix * sensor
}
