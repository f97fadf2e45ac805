//! Mathematical constants and nalgebra extensions

use nalgebra::{ComplexField, Vector3};

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Smallest magnitude accepted as a divisor anywhere in the pipeline
pub const EPSILON: f32 = f32::EPSILON;

/// Out-of-band component value marking an empty slot in external data
pub const SENTINEL: f32 = f32::MAX;

/// Returns true when any component has reached the sentinel magnitude.
#[inline]
pub fn is_sentinel(vector: &Vector3<f32>) -> bool {
    vector.iter().any(|&component| component >= SENTINEL)
}

/// The sentinel vector, for interop with code that still uses it.
#[inline]
pub fn sentinel() -> Vector3<f32> {
    Vector3::repeat(SENTINEL)
}

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Euclidean distance to another point
    fn distance(&self, other: &Vector3<f32>) -> f32;
}

impl Vector3Ext for Vector3<f32> {
    fn distance(&self, other: &Vector3<f32>) -> f32 {
        (self - other).magnitude_squared().sqrt()
    }
}
