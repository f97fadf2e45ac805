//! Sensor normalization and windowed averaging

use nalgebra::Vector3;

use crate::buffer::VectorBuffer;
use crate::error::{FusionError, Result};
use crate::math::EPSILON;

/// Applies offset and sensitivity correction to the newest raw samples.
///
/// The output window is shifted by `sample_count` and slots `0..sample_count`
/// receive `(raw - offset) / sensitivity * target_scale`. Empty raw slots
/// produce empty output slots.
///
/// Every argument is validated before the output is touched.
///
/// # Arguments
/// * `raw` - Raw samples, newest first
/// * `sample_count` - How many of the newest raw samples to normalize
/// * `offset` - Hard-iron offset to subtract
/// * `sensitivity` - Per-axis sensitivity, every component above epsilon
/// * `target_scale` - Positive scale applied after the division
/// * `output` - Normalized window receiving the results
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use compass_fusion::{VectorBuffer, normalize_and_buffer};
///
/// let mut raw = VectorBuffer::<4>::new();
/// raw.push(Vector3::new(12.0, 22.0, 32.0));
///
/// let mut normalized = VectorBuffer::<4>::new();
/// normalize_and_buffer(
///     &raw,
///     1,
///     Vector3::new(10.0, 20.0, 30.0),
///     Vector3::new(2.0, 2.0, 2.0),
///     1.0,
///     &mut normalized,
/// )
/// .unwrap();
///
/// assert_eq!(normalized.get(0), Some(Vector3::new(1.0, 1.0, 1.0)));
/// ```
pub fn normalize_and_buffer<const N: usize, const M: usize>(
    raw: &VectorBuffer<N>,
    sample_count: usize,
    offset: Vector3<f32>,
    sensitivity: Vector3<f32>,
    target_scale: f32,
    output: &mut VectorBuffer<M>,
) -> Result<()> {
    if sample_count < 1 || sample_count > N || sample_count > M {
        return Err(FusionError::InvalidArgument);
    }

    if sensitivity.iter().any(|&s| s <= EPSILON) || target_scale <= 0.0 {
        return Err(FusionError::InvalidArgument);
    }

    output.shift(sample_count)?;

    for i in 0..sample_count {
        let value = raw
            .get(i)
            .map(|v| (v - offset).component_div(&sensitivity) * target_scale);
        output.set(i, value);
    }

    Ok(())
}

/// Averages the newest entries of a window.
///
/// Sums from newest toward oldest until `average_count` entries were taken or
/// an empty slot is reached, then divides by the number actually summed. A
/// window whose newest slot is empty averages to zero.
///
/// Fails with [`FusionError::InvalidArgument`] when `average_count` is zero or
/// larger than the window.
pub fn average<const N: usize>(window: &VectorBuffer<N>, average_count: usize) -> Result<Vector3<f32>> {
    if average_count < 1 || average_count > N {
        return Err(FusionError::InvalidArgument);
    }

    let (sum, count) = window
        .iter()
        .take(average_count)
        .fold((Vector3::zeros(), 0u32), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        return Ok(Vector3::zeros());
    }

    Ok(sum / count as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with<const N: usize>(values: &[Vector3<f32>]) -> VectorBuffer<N> {
        let mut buffer = VectorBuffer::<N>::new();
        // values are given newest first
        for v in values.iter().rev() {
            buffer.push(*v);
        }
        buffer
    }

    #[test]
    fn test_normalize_applies_offset_and_sensitivity() {
        let raw = raw_with::<4>(&[Vector3::new(30.0, -10.0, 5.0), Vector3::new(20.0, 0.0, 0.0)]);
        let mut output = VectorBuffer::<4>::new();

        normalize_and_buffer(
            &raw,
            2,
            Vector3::new(10.0, -20.0, 5.0),
            Vector3::new(2.0, 5.0, 1.0),
            3.0,
            &mut output,
        )
        .unwrap();

        assert_eq!(output.get(0), Some(Vector3::new(30.0, 6.0, 0.0)));
        assert_eq!(output.get(1), Some(Vector3::new(15.0, 12.0, -15.0)));
        assert_eq!(output.get(2), None);
    }

    #[test]
    fn test_normalize_shifts_existing_output() {
        let raw = raw_with::<2>(&[Vector3::new(1.0, 1.0, 1.0)]);
        let mut output = raw_with::<3>(&[Vector3::new(7.0, 7.0, 7.0)]);

        normalize_and_buffer(&raw, 1, Vector3::zeros(), Vector3::repeat(1.0), 1.0, &mut output)
            .unwrap();

        assert_eq!(output.get(0), Some(Vector3::new(1.0, 1.0, 1.0)));
        assert_eq!(output.get(1), Some(Vector3::new(7.0, 7.0, 7.0)));
    }

    #[test]
    fn test_normalize_empty_raw_slot_stays_empty() {
        let raw = raw_with::<3>(&[Vector3::new(1.0, 2.0, 3.0)]);
        let mut output = VectorBuffer::<3>::new();

        normalize_and_buffer(&raw, 3, Vector3::zeros(), Vector3::repeat(1.0), 1.0, &mut output)
            .unwrap();

        assert_eq!(output.populated(), 1);
        assert_eq!(output.get(1), None);
        assert_eq!(output.get(2), None);
    }

    #[test]
    fn test_normalize_rejects_invalid_arguments() {
        let raw = raw_with::<4>(&[Vector3::new(1.0, 2.0, 3.0)]);
        let original = raw_with::<3>(&[Vector3::new(9.0, 9.0, 9.0)]);
        let ones = Vector3::repeat(1.0);

        let cases = [
            (0, ones, 1.0),
            (4, ones, 1.0), // larger than the output window
            (1, Vector3::new(1.0, 0.0, 1.0), 1.0),
            (1, Vector3::new(1.0, 1.0, -2.0), 1.0),
            (1, Vector3::new(f32::EPSILON, 1.0, 1.0), 1.0),
            (1, ones, 0.0),
            (1, ones, -1.0),
        ];

        for (count, sensitivity, scale) in cases {
            let mut output = original;
            let result =
                normalize_and_buffer(&raw, count, Vector3::zeros(), sensitivity, scale, &mut output);
            assert_eq!(result, Err(FusionError::InvalidArgument), "count={} scale={}", count, scale);
            assert_eq!(output, original, "output mutated on failure");
        }
    }

    #[test]
    fn test_average_of_empty_window_is_zero() {
        let window = VectorBuffer::<8>::new();
        assert_eq!(average(&window, 8), Ok(Vector3::zeros()));
    }

    #[test]
    fn test_average_uses_available_entries() {
        let window = raw_with::<8>(&[
            Vector3::new(2.0, 4.0, 6.0),
            Vector3::new(4.0, 8.0, 12.0),
            Vector3::new(0.0, 0.0, 0.0),
        ]);

        assert_eq!(average(&window, 2), Ok(Vector3::new(3.0, 6.0, 9.0)));
        assert_eq!(average(&window, 8), Ok(Vector3::new(2.0, 4.0, 6.0)));
    }

    #[test]
    fn test_average_stops_after_clear() {
        let mut window = raw_with::<6>(&[
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(100.0, 100.0, 100.0),
        ]);
        window.clear_from(2);

        assert_eq!(average(&window, 6), Ok(Vector3::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn test_average_rejects_bad_counts() {
        let window = VectorBuffer::<4>::new();
        assert_eq!(average(&window, 0), Err(FusionError::InvalidArgument));
        assert_eq!(average(&window, 5), Err(FusionError::InvalidArgument));
    }
}
