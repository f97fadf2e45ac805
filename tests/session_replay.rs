use approx::assert_abs_diff_eq;
use compass_fusion::{Accuracy, FusionState, PersistedOffset};
use nalgebra::Vector3;
use serde::Deserialize;
use std::error::Error;

/// One row of a recorded compass session, both sensors sampled together
#[derive(Debug, Deserialize)]
struct SessionRow {
    #[serde(rename = "Time (s)")]
    time: f32,
    #[serde(rename = "Magnetometer X (uT)")]
    mag_x: f32,
    #[serde(rename = "Magnetometer Y (uT)")]
    mag_y: f32,
    #[serde(rename = "Magnetometer Z (uT)")]
    mag_z: f32,
    #[serde(rename = "Accelerometer X (m/s^2)")]
    accel_x: f32,
    #[serde(rename = "Accelerometer Y (m/s^2)")]
    accel_y: f32,
    #[serde(rename = "Accelerometer Z (m/s^2)")]
    accel_z: f32,
}

impl SessionRow {
    fn magnetometer(&self) -> Vector3<f32> {
        Vector3::new(self.mag_x, self.mag_y, self.mag_z)
    }

    fn accelerometer(&self) -> Vector3<f32> {
        Vector3::new(self.accel_x, self.accel_y, self.accel_z)
    }

    fn timestamp(&self) -> i64 {
        (self.time * 1000.0).round() as i64
    }
}

/// Hard-iron offset of the recording device
const TRUE_OFFSET: [f32; 3] = [18.5, -42.0, 7.25];

/// Heading the device was held at during the second half of the recording
const HELD_AZIMUTH: f32 = 120.0;

fn load_session() -> Result<Vec<SessionRow>, Box<dyn Error>> {
    let mut reader = csv::Reader::from_path("testdata/compass_session.csv")?;
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

/// The recording starts with a calibration sweep and ends with the device
/// held level; the replay must recover the offset and the held heading.
#[test]
fn test_session_replay() -> Result<(), Box<dyn Error>> {
    let rows = load_session()?;
    assert_eq!(rows.len(), 120);

    let mut state = FusionState::new();
    state.start_measurement(None);

    let mut first_high = None;
    for (index, row) in rows.iter().enumerate() {
        state.on_magnetometer_sample(row.magnetometer(), row.timestamp())?;
        state.on_accelerometer_sample(row.accelerometer(), row.timestamp())?;

        if first_high.is_none() && state.accuracy() == Accuracy::High {
            first_high = Some(index);
        }
    }

    let first_high = first_high.ok_or("calibration never reached high accuracy")?;
    assert!(first_high < 12, "calibration took {} samples", first_high + 1);
    assert_eq!(state.accuracy(), Accuracy::High);

    let offset = state.offset();
    let truth = Vector3::from(TRUE_OFFSET);
    for axis in 0..3 {
        assert!(
            (offset[axis] - truth[axis]).abs() < 1.0,
            "offset axis {}: expected {}, got {}",
            axis,
            truth[axis],
            offset[axis]
        );
    }

    let orientation = state.compute_orientation()?;
    assert!(
        (orientation.azimuth - HELD_AZIMUTH).abs() < 2.0,
        "azimuth {}",
        orientation.azimuth
    );
    assert!(orientation.pitch.abs() < 1.0, "pitch {}", orientation.pitch);
    assert!(orientation.roll.abs() < 1.0, "roll {}", orientation.roll);
    assert_eq!(orientation.timestamp, 11_900);
    assert_eq!(orientation.magnetometer_timestamp, 11_900);

    let field = state.magnetometer().vector.magnitude();
    assert!((field - 45.0).abs() < 1.0, "field strength {}", field);

    Ok(())
}

/// A second session restored from the first one's record starts with the
/// calibrated offset and reports the correct heading before any new sweep.
#[test]
fn test_resumed_session_uses_persisted_offset() -> Result<(), Box<dyn Error>> {
    let rows = load_session()?;

    let mut first = FusionState::new();
    first.start_measurement(None);
    for row in &rows {
        first.on_magnetometer_sample(row.magnetometer(), row.timestamp())?;
        first.on_accelerometer_sample(row.accelerometer(), row.timestamp())?;
    }
    let stored = first.stop_measurement().to_bytes();

    let mut second = FusionState::new();
    second.start_measurement(Some(&stored));
    assert_eq!(second.offset(), PersistedOffset::from_bytes(&stored)?.offset);
    assert_eq!(second.accuracy(), Accuracy::Unreliable);

    // only the level, held part of the recording
    for row in &rows[100..] {
        second.on_magnetometer_sample(row.magnetometer(), row.timestamp())?;
        second.on_accelerometer_sample(row.accelerometer(), row.timestamp())?;
    }

    let orientation = second.compute_orientation()?;
    assert_abs_diff_eq!(orientation.azimuth, HELD_AZIMUTH, epsilon = 2.0);
    assert_abs_diff_eq!(second.offset(), first.offset(), epsilon = 1.0);

    Ok(())
}
