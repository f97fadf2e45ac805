//! Measurement session state for one sensor formation

use nalgebra::Vector3;

use crate::buffer::VectorBuffer;
use crate::compass::direction;
use crate::error::{FusionError, Result};
use crate::logging::{log_debug, log_info, log_warn};
use crate::math::EPSILON;
use crate::normalize::{average, normalize_and_buffer};
use crate::offset::CalibrationHistory;
use crate::persist::PersistedOffset;
use crate::source::SampleSource;
use crate::types::{
    AccelerationOutput, Accuracy, FusionSettings, MagneticOutput, Orientation, Sample, SensorKind,
    Timestamp,
};

/// Samples kept per sensor for normalization and averaging
pub const WINDOW: usize = 32;

/// Complete fusion pipeline state
///
/// Owns every buffer for one sensor formation: magnetometer raw and
/// normalized windows, the offset calibrator, the accelerometer window and
/// the last computed orientation. All operations are synchronous and never
/// allocate.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use compass_fusion::{Accuracy, FusionState};
///
/// let mut state = FusionState::new();
/// state.start_measurement(None);
///
/// state.on_accelerometer_sample(Vector3::new(0.0, 0.0, 9.8), 1).unwrap();
/// state.on_magnetometer_sample(Vector3::new(0.0, 30.0, -20.0), 2).unwrap();
///
/// let orientation = state.compute_orientation().unwrap();
/// assert!(orientation.azimuth.abs() < 1e-3);
/// assert_eq!(orientation.timestamp, 1);
/// assert_eq!(state.accuracy(), Accuracy::Unreliable);
/// ```
#[derive(Debug, Clone)]
pub struct FusionState {
    settings: FusionSettings,

    magnetometer_raw: VectorBuffer<WINDOW>,
    magnetometer_window: VectorBuffer<WINDOW>,
    calibration: CalibrationHistory,
    offset: Vector3<f32>,
    magnetic_field: Vector3<f32>,
    magnetometer_timestamp: Timestamp,
    accuracy: Accuracy,

    accelerometer_scratch: VectorBuffer<1>,
    accelerometer_window: VectorBuffer<WINDOW>,
    acceleration: Vector3<f32>,
    accelerometer_timestamp: Timestamp,

    orientation: Option<Orientation>,
}

impl FusionState {
    /// Create a pipeline with default settings
    pub fn new() -> Self {
        Self::with_settings(FusionSettings::default())
    }

    /// Create a pipeline with the given settings
    pub fn with_settings(settings: FusionSettings) -> Self {
        Self {
            settings,
            magnetometer_raw: VectorBuffer::new(),
            magnetometer_window: VectorBuffer::new(),
            calibration: CalibrationHistory::new(settings.calibration),
            offset: Vector3::zeros(),
            magnetic_field: Vector3::zeros(),
            magnetometer_timestamp: 0,
            accuracy: Accuracy::Unreliable,
            accelerometer_scratch: VectorBuffer::new(),
            accelerometer_window: VectorBuffer::new(),
            acceleration: Vector3::zeros(),
            accelerometer_timestamp: 0,
            orientation: None,
        }
    }

    /// Begin a measurement session.
    ///
    /// Every buffer and the calibration history are cleared and the offset is
    /// restored from `persisted`. An absent or unreadable record starts from
    /// a zero offset.
    pub fn start_measurement(&mut self, persisted: Option<&[u8]>) {
        self.reset();
        self.offset = PersistedOffset::restore(persisted).offset;
        log_info!(
            "measurement started, offset ({}, {}, {})",
            self.offset.x,
            self.offset.y,
            self.offset.z
        );
    }

    /// End a measurement session, returning the record to persist
    pub fn stop_measurement(&mut self) -> PersistedOffset {
        log_info!("measurement stopped");
        PersistedOffset::new(self.offset)
    }

    /// Discard all runtime state, keeping the settings
    pub fn reset(&mut self) {
        *self = Self::with_settings(self.settings);
    }

    /// Process one magnetometer reading in µT.
    ///
    /// The sample feeds the offset calibrator, then the whole raw window is
    /// renormalized with the current offset and averaged. Calibrator
    /// rejections are expected and do not fail the call.
    ///
    /// Invalid settings fail with [`FusionError::InvalidArgument`] before any
    /// state is touched.
    pub fn on_magnetometer_sample(&mut self, vector: Vector3<f32>, timestamp: Timestamp) -> Result<()> {
        self.check_settings(self.settings.magnetometer_sensitivity)?;

        self.magnetometer_raw.push(vector);

        let accepted = match self.calibration.update(vector) {
            Ok(offset) => {
                self.offset = offset;
                true
            }
            Err(error) => {
                log_debug!("offset estimate not ready: {}", error);
                false
            }
        };

        normalize_and_buffer(
            &self.magnetometer_raw,
            WINDOW,
            self.offset,
            self.settings.magnetometer_sensitivity,
            self.settings.target_scale,
            &mut self.magnetometer_window,
        )?;

        self.magnetic_field = average(&self.magnetometer_window, self.settings.vector_average_count)?;

        let strength = self.magnetic_field.magnitude();
        if strength > self.settings.geomagnetic_max {
            if self.accuracy != Accuracy::Unreliable {
                log_warn!("magnetic field {} uT out of range, offset distrusted", strength);
            }
            self.accuracy = Accuracy::Unreliable;
        } else if accepted {
            self.accuracy = Accuracy::High;
        }

        self.magnetometer_timestamp = timestamp;

        Ok(())
    }

    /// Process one accelerometer reading in m/s²
    pub fn on_accelerometer_sample(&mut self, vector: Vector3<f32>, timestamp: Timestamp) -> Result<()> {
        self.check_settings(self.settings.accelerometer_sensitivity)?;

        self.accelerometer_scratch.push(vector);

        normalize_and_buffer(
            &self.accelerometer_scratch,
            1,
            Vector3::zeros(),
            self.settings.accelerometer_sensitivity,
            self.settings.target_scale,
            &mut self.accelerometer_window,
        )?;

        self.acceleration = average(&self.accelerometer_window, self.settings.vector_average_count)?;
        self.accelerometer_timestamp = timestamp;

        Ok(())
    }

    /// Route a sample to the matching sensor path.
    ///
    /// Gyroscope samples are not fused and fail with
    /// [`FusionError::NotSupported`].
    pub fn ingest(&mut self, sample: Sample) -> Result<()> {
        match sample.kind {
            SensorKind::Magnetometer => self.on_magnetometer_sample(sample.vector, sample.timestamp),
            SensorKind::Accelerometer => self.on_accelerometer_sample(sample.vector, sample.timestamp),
            SensorKind::Gyroscope => Err(FusionError::NotSupported),
        }
    }

    /// Ingest every pending sample from `source`.
    ///
    /// Returns the number of samples processed. Stops at the first sample that
    /// fails; that sample is not counted.
    pub fn drain(&mut self, source: &mut impl SampleSource) -> Result<usize> {
        let mut count = 0;
        while let Some(sample) = source.next_sample() {
            self.ingest(sample)?;
            count += 1;
        }
        Ok(count)
    }

    /// Compute the tilt-compensated heading from the current windows.
    ///
    /// `timestamp` of the result is the latest accelerometer timestamp;
    /// `magnetometer_timestamp` carries the magnetometer's.
    pub fn compute_orientation(&mut self) -> Result<Orientation> {
        let count = self.settings.direction_average_count;
        let mut orientation = direction(
            &self.magnetometer_window,
            count,
            &self.accelerometer_window,
            count,
        )?;

        orientation.timestamp = self.accelerometer_timestamp;
        orientation.magnetometer_timestamp = self.magnetometer_timestamp;
        self.orientation = Some(orientation);

        Ok(orientation)
    }

    /// Counts must fit the windows, sensitivity and scale must be positive
    fn check_settings(&self, sensitivity: Vector3<f32>) -> Result<()> {
        let counts = [
            self.settings.vector_average_count,
            self.settings.direction_average_count,
        ];
        if counts.iter().any(|&count| count < 1 || count > WINDOW) {
            return Err(FusionError::InvalidArgument);
        }
        if sensitivity.iter().any(|&s| s <= EPSILON) || self.settings.target_scale <= 0.0 {
            return Err(FusionError::InvalidArgument);
        }
        Ok(())
    }

    /// Mark the current offset as untrusted until the calibrator accepts a
    /// new one
    pub fn force_recalibration(&mut self) {
        self.accuracy = Accuracy::Unreliable;
    }

    /// Latest averaged magnetometer output
    pub fn magnetometer(&self) -> MagneticOutput {
        MagneticOutput {
            vector: self.magnetic_field,
            offset: self.offset,
            accuracy: self.accuracy,
            timestamp: self.magnetometer_timestamp,
        }
    }

    /// Latest averaged accelerometer output
    pub fn accelerometer(&self) -> AccelerationOutput {
        AccelerationOutput {
            vector: self.acceleration,
            accuracy: Accuracy::High,
            timestamp: self.accelerometer_timestamp,
        }
    }

    /// Last orientation computed by [`Self::compute_orientation`]
    pub fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }

    /// Hard-iron offset currently applied
    pub fn offset(&self) -> Vector3<f32> {
        self.offset
    }

    /// Magnetometer calibration trust level
    pub fn accuracy(&self) -> Accuracy {
        self.accuracy
    }

    /// Pipeline settings
    pub fn settings(&self) -> &FusionSettings {
        &self.settings
    }

    /// Offset calibrator state
    pub fn calibration(&self) -> &CalibrationHistory {
        &self.calibration
    }
}

impl Default for FusionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::IterSource;
    use nalgebra::ComplexField;

    fn center() -> Vector3<f32> {
        Vector3::new(10.0, 20.0, -5.0)
    }

    fn gravity() -> Vector3<f32> {
        Vector3::new(0.0, 0.0, 9.8)
    }

    fn golden(k: usize) -> Vector3<f32> {
        let z = 1.0 - 2.0 * ((k % 6) as f32 + 0.5) / 6.0;
        let r = (1.0 - z * z).sqrt();
        let theta = k as f32 * 2.399963;
        Vector3::new(r * theta.cos(), r * theta.sin(), z)
    }

    /// Sweep the device through a sphere, then hold it level facing east
    fn calibrated_state() -> FusionState {
        let mut state = FusionState::new();
        state.start_measurement(None);

        for k in 0..24 {
            state.on_magnetometer_sample(center() + golden(k) * 45.0, k as i64).unwrap();
        }
        for k in 24..32 {
            state
                .on_magnetometer_sample(center() + Vector3::new(-27.0, 0.0, -36.0), k as i64)
                .unwrap();
        }
        for k in 0..32 {
            state.on_accelerometer_sample(gravity(), 100 + k as i64).unwrap();
        }
        state
    }

    #[test]
    fn test_initial_state() {
        let state = FusionState::default();
        assert_eq!(state.accuracy(), Accuracy::Unreliable);
        assert_eq!(state.offset(), Vector3::zeros());
        assert_eq!(state.orientation(), None);
        assert_eq!(state.accelerometer().accuracy, Accuracy::High);
        assert_eq!(state.settings().direction_average_count, 4);
    }

    #[test]
    fn test_end_to_end() {
        let mut state = calibrated_state();

        assert_eq!(state.accuracy(), Accuracy::High);
        assert!((state.offset() - center()).magnitude() < 0.05, "offset {:?}", state.offset());

        let orientation = state.compute_orientation().unwrap();
        assert!((orientation.azimuth - 90.0).abs() < 0.1, "azimuth {}", orientation.azimuth);
        assert!(orientation.pitch.abs() < 0.1);
        assert!(orientation.roll.abs() < 0.1);
        assert_eq!(orientation.timestamp, 131);
        assert_eq!(orientation.magnetometer_timestamp, 31);
        assert_eq!(state.orientation(), Some(orientation));

        let magnetometer = state.magnetometer();
        assert!((magnetometer.vector - Vector3::new(-27.0, 0.0, -36.0)).magnitude() < 0.1);
        assert_eq!(magnetometer.timestamp, 31);
    }

    #[test]
    fn test_strong_field_drops_accuracy() {
        let mut state = calibrated_state();
        assert_eq!(state.accuracy(), Accuracy::High);

        for k in 0..8 {
            state
                .on_magnetometer_sample(center() + Vector3::new(0.0, 100.0, 0.0), 200 + k)
                .unwrap();
        }
        assert_eq!(state.accuracy(), Accuracy::Unreliable);
    }

    #[test]
    fn test_force_recalibration() {
        let mut state = calibrated_state();
        state.force_recalibration();
        assert_eq!(state.accuracy(), Accuracy::Unreliable);
        // the offset itself is kept
        assert!((state.offset() - center()).magnitude() < 0.05);
    }

    #[test]
    fn test_session_round_trip() {
        let mut state = calibrated_state();
        let record = state.stop_measurement();
        assert_eq!(record.offset, state.offset());

        let bytes = record.to_bytes();
        let mut next = FusionState::new();
        next.start_measurement(Some(&bytes));
        assert_eq!(next.offset(), record.offset);
        assert_eq!(next.accuracy(), Accuracy::Unreliable);
        assert!(next.calibration().raw_window().is_empty());

        next.start_measurement(Some(&[0u8; 3]));
        assert_eq!(next.offset(), Vector3::zeros());
    }

    #[test]
    fn test_ingest_and_drain() {
        let mut state = FusionState::new();
        let samples = [
            Sample::accelerometer(gravity(), 1),
            Sample::magnetometer(Vector3::new(0.0, 30.0, -20.0), 2),
            Sample::gyroscope(Vector3::new(1.0, 0.0, 0.0), 3),
            Sample::accelerometer(gravity(), 4),
        ];
        let mut source = IterSource::new(samples);

        assert_eq!(state.drain(&mut source), Err(FusionError::NotSupported));
        assert_eq!(state.accelerometer().timestamp, 1);
        assert_eq!(state.magnetometer().timestamp, 2);

        // the remaining sample is still pending
        assert_eq!(state.drain(&mut source), Ok(1));
        assert_eq!(state.accelerometer().timestamp, 4);
    }

    #[test]
    fn test_orientation_needs_gravity() {
        let mut state = FusionState::new();
        state.on_magnetometer_sample(Vector3::new(0.0, 30.0, -20.0), 1).unwrap();
        assert_eq!(state.compute_orientation(), Err(FusionError::Degenerate));
        assert_eq!(state.orientation(), None);
    }

    #[test]
    fn test_invalid_sensitivity_is_reported() {
        let settings = FusionSettings {
            accelerometer_sensitivity: Vector3::new(1.0, 0.0, 1.0),
            ..Default::default()
        };
        let mut state = FusionState::with_settings(settings);
        assert_eq!(
            state.on_accelerometer_sample(gravity(), 1),
            Err(FusionError::InvalidArgument)
        );
    }

    #[test]
    fn test_invalid_settings_leave_state_untouched() {
        let cases = [
            FusionSettings {
                vector_average_count: 40,
                ..Default::default()
            },
            FusionSettings {
                direction_average_count: 0,
                ..Default::default()
            },
            FusionSettings {
                magnetometer_sensitivity: Vector3::new(1.0, -1.0, 1.0),
                ..Default::default()
            },
            FusionSettings {
                target_scale: 0.0,
                ..Default::default()
            },
        ];

        for settings in cases {
            let mut state = FusionState::with_settings(settings);
            for k in 0..24 {
                assert_eq!(
                    state.on_magnetometer_sample(center() + golden(k) * 45.0, k as i64),
                    Err(FusionError::InvalidArgument)
                );
            }

            assert_eq!(state.offset(), Vector3::zeros(), "{:?}", settings);
            assert_eq!(state.accuracy(), Accuracy::Unreliable);
            assert_eq!(state.magnetometer().timestamp, 0);
            assert!(state.calibration().raw_window().is_empty());
            assert!(state.calibration().offset_window().is_empty());
            assert_eq!(state.calibration().last_radius(), 0.0);
        }
    }

    #[test]
    fn test_invalid_settings_reject_accelerometer_samples() {
        let settings = FusionSettings {
            vector_average_count: 0,
            ..Default::default()
        };
        let mut state = FusionState::with_settings(settings);
        assert_eq!(
            state.on_accelerometer_sample(gravity(), 3),
            Err(FusionError::InvalidArgument)
        );
        assert_eq!(state.accelerometer().vector, Vector3::zeros());
        assert_eq!(state.accelerometer().timestamp, 0);
    }

    #[test]
    fn test_reset_keeps_settings() {
        let settings = FusionSettings {
            geomagnetic_max: 90.0,
            ..Default::default()
        };
        let mut state = FusionState::with_settings(settings);
        state.on_accelerometer_sample(gravity(), 5).unwrap();
        state.reset();

        assert_eq!(state.settings().geomagnetic_max, 90.0);
        assert_eq!(state.accelerometer().vector, Vector3::zeros());
        assert_eq!(state.accelerometer().timestamp, 0);
    }
}
