//! Four-point sphere fitting
//!
//! The hard-iron offset of a magnetometer is the center of the sphere traced
//! by its readings as the device rotates in a uniform field. Four well spread
//! readings are enough to solve for that center in closed form.

use nalgebra::Vector3;

use crate::error::{FusionError, Result};
use crate::math::{EPSILON, Vector3Ext};

/// Sphere through four points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Center, the hard-iron offset estimate in µT
    pub center: Vector3<f32>,
    /// Distance from the center to the first fit point, µT
    pub radius: f32,
}

/// Picks four mutually distant points from a candidate set.
///
/// The first candidate is always kept. The second is the candidate farthest
/// from it, the third spans the largest triangle with the first two, and the
/// fourth lies farthest off the plane of that triangle. Only strict
/// improvements replace a choice, so ties keep the earliest candidate and a
/// choice that never improves stays equal to the first candidate.
///
/// Fails with [`FusionError::InvalidArgument`] for fewer than four candidates.
pub fn select_points(candidates: &[Vector3<f32>]) -> Result<[Vector3<f32>; 4]> {
    if candidates.len() < 4 {
        return Err(FusionError::InvalidArgument);
    }

    let origin = candidates[0];
    let mut points = [origin; 4];

    let mut best = 0.0;
    for &candidate in &candidates[1..] {
        let distance = candidate.distance(&origin);
        if best < distance {
            best = distance;
            points[1] = candidate;
        }
    }

    let baseline = points[1] - origin;
    let mut normal = Vector3::zeros();
    best = 0.0;
    for &candidate in &candidates[1..] {
        let cross = baseline.cross(&(candidate - origin));
        let area = cross.magnitude_squared();
        if best < area {
            best = area;
            points[2] = candidate;
            normal = cross;
        }
    }

    best = 0.0;
    for &candidate in &candidates[1..] {
        let height = (candidate - origin).dot(&normal).abs();
        if best < height {
            best = height;
            points[3] = candidate;
        }
    }

    Ok(points)
}

/// Solves for the sphere passing through four points.
///
/// The three sphere equations relative to the last point form a linear
/// system that is reduced to `z`, then `y`, then `x`. A near-zero pivot at
/// any step means the points are coplanar or otherwise degenerate.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use compass_fusion::sphere::fit_sphere;
///
/// let points = [
///     Vector3::new(11.0, 2.0, 3.0),
///     Vector3::new(1.0, 12.0, 3.0),
///     Vector3::new(1.0, 2.0, 13.0),
///     Vector3::new(-9.0, 2.0, 3.0),
/// ];
/// let sphere = fit_sphere(&points).unwrap();
///
/// assert!((sphere.center - Vector3::new(1.0, 2.0, 3.0)).magnitude() < 1e-4);
/// assert!((sphere.radius - 10.0).abs() < 1e-4);
/// ```
pub fn fit_sphere(points: &[Vector3<f32>; 4]) -> Result<Sphere> {
    let base = points[3];
    let base_sq = base.magnitude_squared();

    let mut dif = [[0.0f32; 3]; 3];
    let mut half = [0.0f32; 3];
    for i in 0..3 {
        let d = points[i] - base;
        dif[i] = [d.x, d.y, d.z];
        half[i] = 0.5 * (points[i].magnitude_squared() - base_sq);
    }

    let a = dif[0][0] * dif[2][2] - dif[0][2] * dif[2][0];
    let b = dif[0][1] * dif[2][0] - dif[0][0] * dif[2][1];
    let c = dif[0][0] * dif[2][1] - dif[0][1] * dif[2][0];
    let d = dif[0][0] * half[2] - dif[2][0] * half[0];
    let e = dif[0][0] * dif[1][1] - dif[0][1] * dif[1][0];
    let f = dif[1][0] * dif[0][2] - dif[0][0] * dif[1][2];
    let g = dif[0][0] * half[1] - dif[1][0] * half[0];

    let z = checked_div(d * e + b * g, c * f + a * e)?;
    let y = checked_div(f * z + g, e)?;
    let x = checked_div(half[0] - dif[0][1] * y - dif[0][2] * z, dif[0][0])?;

    let center = Vector3::new(x, y, z);
    Ok(Sphere {
        center,
        radius: points[0].distance(&center),
    })
}

fn checked_div(numerator: f32, denominator: f32) -> Result<f32> {
    if denominator.abs() < EPSILON {
        return Err(FusionError::Degenerate);
    }
    Ok(numerator / denominator)
}
