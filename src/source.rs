//! Sample producers
//!
//! Sensor drivers, replay files and test fixtures all hand samples to
//! [`FusionState::drain`](crate::FusionState::drain) through [`SampleSource`].

use crate::types::Sample;

/// Anything that yields timestamped sensor samples
pub trait SampleSource {
    /// Next available sample, `None` once nothing is pending
    fn next_sample(&mut self) -> Option<Sample>;
}

/// Adapts any iterator of samples into a [`SampleSource`]
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use compass_fusion::{IterSource, Sample, SampleSource};
///
/// let samples = [
///     Sample::accelerometer(Vector3::new(0.0, 0.0, 9.8), 1),
///     Sample::magnetometer(Vector3::new(0.0, 30.0, -20.0), 2),
/// ];
/// let mut source = IterSource::new(samples);
///
/// assert_eq!(source.next_sample().map(|s| s.timestamp), Some(1));
/// assert_eq!(source.next_sample().map(|s| s.timestamp), Some(2));
/// assert!(source.next_sample().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct IterSource<I> {
    inner: I,
}

impl<I: Iterator<Item = Sample>> IterSource<I> {
    /// Wrap an iterator or collection of samples
    pub fn new(samples: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            inner: samples.into_iter(),
        }
    }
}

impl<I: Iterator<Item = Sample>> SampleSource for IterSource<I> {
    fn next_sample(&mut self) -> Option<Sample> {
        self.inner.next()
    }
}
