//! Automatic magnetometer offset calibration

use nalgebra::Vector3;

use crate::buffer::VectorBuffer;
use crate::error::{FusionError, Result};
use crate::logging::{log_debug, log_info};
use crate::math::Vector3Ext;
use crate::sphere::{fit_sphere, select_points};
use crate::types::CalibrationSettings;

/// Raw magnetometer samples kept for sphere fitting
pub const RAW_WINDOW: usize = 20;

/// Accepted sphere centers kept for the stability check
pub const OFFSET_WINDOW: usize = 4;

/// Hard-iron offset estimator
///
/// Every magnetometer sample is buffered, and once enough distinct samples
/// are available the four most spread out are fitted with a sphere. Fits
/// that pass the geometric gate are collected, and an offset is reported
/// only when the last four of them agree with each other.
///
/// Rejection is the normal state between accepted estimates: most calls to
/// [`CalibrationHistory::update`] return an error that callers are expected
/// to ignore.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationHistory {
    raw_window: VectorBuffer<RAW_WINDOW>,
    offset_window: VectorBuffer<OFFSET_WINDOW>,
    last_radius: f32,
    settings: CalibrationSettings,
}

impl CalibrationHistory {
    /// Create an empty history
    ///
    /// # Example
    /// ```
    /// use compass_fusion::{CalibrationHistory, CalibrationSettings};
    ///
    /// let history = CalibrationHistory::new(CalibrationSettings::default());
    /// assert!(history.raw_window().is_empty());
    /// assert_eq!(history.last_radius(), 0.0);
    /// ```
    pub fn new(settings: CalibrationSettings) -> Self {
        Self {
            raw_window: VectorBuffer::new(),
            offset_window: VectorBuffer::new(),
            last_radius: 0.0,
            settings,
        }
    }

    /// Feed one raw magnetometer sample.
    ///
    /// The sample is always recorded, whatever the outcome. Returns the new
    /// offset when the recent sphere centers have settled, otherwise:
    /// - [`FusionError::NotYetCalibrated`] while history is still too short or
    ///   the centers still disagree
    /// - [`FusionError::Degenerate`] when the selected points cannot define a
    ///   sphere or sit too close together
    ///
    /// # Arguments
    /// * `sample` - Raw magnetometer reading in µT
    pub fn update(&mut self, sample: Vector3<f32>) -> Result<Vector3<f32>> {
        self.raw_window.push(sample);

        let count = self
            .raw_window
            .slots()
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |index| index + 1);
        if count < 4 || self.raw_window.populated() < count {
            return Err(FusionError::NotYetCalibrated);
        }

        let mut candidates = [Vector3::zeros(); RAW_WINDOW];
        for (slot, v) in candidates.iter_mut().zip(self.raw_window.iter()) {
            *slot = v;
        }

        let points = select_points(&candidates[..count])?;
        let sphere = fit_sphere(&points)?;

        for i in 0..4 {
            for j in (i + 1)..4 {
                let distance = points[i].distance(&points[j]);
                if distance < sphere.radius || distance < self.settings.min_separation {
                    return Err(FusionError::Degenerate);
                }
            }
        }

        self.offset_window.push(sphere.center);
        self.last_radius = sphere.radius;
        self.raw_window.clear_from(RAW_WINDOW / 2);

        log_debug!(
            "sphere fit center=({}, {}, {}) radius={}",
            sphere.center.x,
            sphere.center.y,
            sphere.center.z,
            sphere.radius
        );

        if self.offset_window.get(OFFSET_WINDOW - 1).is_none() {
            return Err(FusionError::NotYetCalibrated);
        }

        let (low, high) = self.offset_window.iter().fold(
            (Vector3::repeat(f32::MAX), Vector3::repeat(f32::MIN)),
            |(low, high), center| (low.inf(&center), high.sup(&center)),
        );

        let limit = self.last_radius * self.settings.stability_threshold;
        if (high - low).iter().any(|&range| range >= limit) {
            return Err(FusionError::NotYetCalibrated);
        }

        let offset = (high + low) / 2.0;
        log_info!("offset accepted ({}, {}, {})", offset.x, offset.y, offset.z);

        Ok(offset)
    }

    /// Forget every sample and sphere fit
    pub fn reset(&mut self) {
        self.raw_window.init();
        self.offset_window.init();
        self.last_radius = 0.0;
    }

    /// Raw samples awaiting a fit, newest first
    pub fn raw_window(&self) -> &VectorBuffer<RAW_WINDOW> {
        &self.raw_window
    }

    /// Recently accepted sphere centers, newest first
    pub fn offset_window(&self) -> &VectorBuffer<OFFSET_WINDOW> {
        &self.offset_window
    }

    /// Radius of the most recent accepted fit, 0 before any
    pub fn last_radius(&self) -> f32 {
        self.last_radius
    }

    /// Gate and stability settings
    pub fn settings(&self) -> &CalibrationSettings {
        &self.settings
    }
}

impl Default for CalibrationHistory {
    fn default() -> Self {
        Self::new(CalibrationSettings::default())
    }
}
