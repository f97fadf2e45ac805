use compass_fusion::{FusionState, LayoutPattern, rotate};
use nalgebra::Vector3;

const SAMPLE_PERIOD_MS: i64 = 10; // 10 ms sample period

fn main() {
    let mut state = FusionState::new();
    state.start_measurement(None);

    for i in 0..10 {
        // this loop should repeat each time new sensor data is available
        let magnetometer = Vector3::new(0.0, 30.0, -20.0); // replace this with actual magnetometer data in uT
        let accelerometer = Vector3::new(0.0, 0.0, 9.8); // replace this with actual accelerometer data in m/s^2

        // remap from the chip frame if the sensor is not mounted in the default orientation
        let magnetometer = rotate(magnetometer, LayoutPattern::Pat1);

        let timestamp = i * SAMPLE_PERIOD_MS;
        if let Err(error) = state.on_magnetometer_sample(magnetometer, timestamp) {
            println!("magnetometer sample rejected: {}", error);
            continue;
        }
        if let Err(error) = state.on_accelerometer_sample(accelerometer, timestamp) {
            println!("accelerometer sample rejected: {}", error);
            continue;
        }

        match state.compute_orientation() {
            Ok(orientation) => println!(
                "Azimuth: {:.2}, Pitch: {:.2}, Roll: {:.2}, Accuracy: {:?}",
                orientation.azimuth,
                orientation.pitch,
                orientation.roll,
                state.accuracy()
            ),
            Err(error) => println!("no orientation yet: {}", error),
        }
    }

    let record = state.stop_measurement();
    println!("Offset to persist: {:?}", record.to_bytes());
}
