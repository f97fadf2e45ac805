//! Q16 fixed-point conversions
//!
//! Sensor drivers and host links exchange values as signed 32-bit integers
//! with 16 fractional bits: 1 µT, 1 m/s² or 1 degree is `65536`.
//!
//! # Example
//! ```
//! use compass_fusion::fixed::{from_q16, to_q16};
//!
//! assert_eq!(to_q16(1.5), 98304);
//! assert_eq!(from_q16(-32768), -0.5);
//! ```

use nalgebra::Vector3;

use crate::types::Orientation;

/// The value 1.0 in Q16
pub const Q16_ONE: i32 = 1 << 16;

/// Converts to Q16, truncating toward zero.
///
/// Values outside the `i32` range saturate and NaN maps to zero.
#[inline]
pub fn to_q16(value: f32) -> i32 {
    (value * Q16_ONE as f32) as i32
}

/// Converts from Q16
#[inline]
pub fn from_q16(value: i32) -> f32 {
    value as f32 / Q16_ONE as f32
}

/// Converts each component to Q16
#[inline]
pub fn vector_to_q16(vector: Vector3<f32>) -> [i32; 3] {
    [to_q16(vector.x), to_q16(vector.y), to_q16(vector.z)]
}

/// Builds a vector from three Q16 components
#[inline]
pub fn vector_from_q16(values: [i32; 3]) -> Vector3<f32> {
    Vector3::new(from_q16(values[0]), from_q16(values[1]), from_q16(values[2]))
}

impl Orientation {
    /// Azimuth, pitch and roll in Q16 degrees
    pub fn to_q16(&self) -> [i32; 3] {
        [to_q16(self.azimuth), to_q16(self.pitch), to_q16(self.roll)]
    }
}
