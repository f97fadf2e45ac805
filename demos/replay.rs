//! Compass session replay
//!
//! This example replays a recorded magnetometer and accelerometer session
//! through the fusion pipeline and plots how the hard-iron offset converges
//! and how the tilt-compensated heading settles.
//!
//! Features demonstrated:
//! - Automatic offset calibration from a calibration sweep
//! - Custom fusion settings
//! - Calibration accuracy monitoring
//! - Persisting the offset for the next session
//!
//! Run with: `cargo run --example replay`

use compass_fusion::{Accuracy, FusionSettings, FusionState};
use nalgebra::Vector3;
use plotters::prelude::*;
use serde::Deserialize;
use std::error::Error;

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

/// Per-sample pipeline outputs collected for plotting
struct ReplayPoint {
    time: f32,
    azimuth: f32,
    pitch: f32,
    roll: f32,
    offset: Vector3<f32>,
    accuracy: Accuracy,
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("Compass replay - offset calibration and heading");

    let mut reader = csv::Reader::from_path("testdata/compass_session.csv")?;
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: SessionRow = result?;
        rows.push(row);
    }

    let settings = FusionSettings {
        geomagnetic_max: 70.0,      // reject fields stronger than the earth's
        direction_average_count: 4, // heading from the newest four samples
        ..Default::default()
    };
    let mut state = FusionState::with_settings(settings);
    state.start_measurement(None);

    println!("Processing {} samples...", rows.len());

    let mut points = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let timestamp = (row.time * 1000.0).round() as i64;
        let magnetometer = Vector3::new(row.mag_x, row.mag_y, row.mag_z);
        let accelerometer = Vector3::new(row.accel_x, row.accel_y, row.accel_z);

        state.on_magnetometer_sample(magnetometer, timestamp)?;
        state.on_accelerometer_sample(accelerometer, timestamp)?;
        let orientation = state.compute_orientation()?;

        if i % 20 == 0 {
            let offset = state.offset();
            println!(
                "Sample {}: heading=({:.1}°,{:.1}°,{:.1}°) offset=({:.2},{:.2},{:.2}) accuracy={:?}",
                i,
                orientation.azimuth,
                orientation.pitch,
                orientation.roll,
                offset.x,
                offset.y,
                offset.z,
                state.accuracy()
            );
        }

        points.push(ReplayPoint {
            time: row.time,
            azimuth: orientation.azimuth,
            pitch: orientation.pitch,
            roll: orientation.roll,
            offset: state.offset(),
            accuracy: state.accuracy(),
        });
    }

    let record = state.stop_measurement();
    println!(
        "Final offset ({:.2}, {:.2}, {:.2}) uT, record {:02x?}",
        record.offset.x,
        record.offset.y,
        record.offset.z,
        record.to_bytes()
    );

    println!("Generating replay plots...");
    create_plots(&points)?;

    println!("✓ Plots saved to replay_plots.png");
    Ok(())
}

/// Three panels: orientation, offset estimate and calibration accuracy
fn create_plots(points: &[ReplayPoint]) -> Result<(), Box<dyn Error>> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first.time, last.time),
        _ => return Err("no samples to plot".into()),
    };
    let time_range = first..last;

    let root = BitMapBackend::new("replay_plots.png", (1000, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(450);
    let (middle, bottom) = lower.split_vertically(300);

    let mut orientation_chart = ChartBuilder::on(&upper)
        .caption("Orientation, Offset and Accuracy", ("sans-serif", 20))
        .margin(5)
        .x_label_area_size(0)
        .y_label_area_size(50)
        .build_cartesian_2d(time_range.clone(), -90f32..360f32)?;

    orientation_chart.configure_mesh().y_desc("Degrees").draw()?;

    let series = [
        ("Azimuth", BLUE, points.iter().map(|p| (p.time, p.azimuth)).collect::<Vec<_>>()),
        ("Pitch", GREEN, points.iter().map(|p| (p.time, p.pitch)).collect()),
        ("Roll", RED, points.iter().map(|p| (p.time, p.roll)).collect()),
    ];
    for (label, color, data) in series {
        orientation_chart
            .draw_series(LineSeries::new(data, &color))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], color));
    }
    orientation_chart.configure_series_labels().draw()?;

    let mut offset_chart = ChartBuilder::on(&middle)
        .margin(5)
        .x_label_area_size(0)
        .y_label_area_size(50)
        .build_cartesian_2d(time_range.clone(), -60f32..60f32)?;

    offset_chart.configure_mesh().y_desc("uT").draw()?;

    for (axis, (label, color)) in [("Offset X", RED), ("Offset Y", GREEN), ("Offset Z", BLUE)]
        .into_iter()
        .enumerate()
    {
        offset_chart
            .draw_series(LineSeries::new(
                points.iter().map(|p| (p.time, p.offset[axis])),
                &color,
            ))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], color));
    }
    offset_chart.configure_series_labels().draw()?;

    let mut accuracy_chart = ChartBuilder::on(&bottom)
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(time_range, 0f32..3.5f32)?;

    accuracy_chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Accuracy")
        .draw()?;

    accuracy_chart
        .draw_series(LineSeries::new(
            points.iter().map(|p| (p.time, p.accuracy.level() as f32)),
            &RGBColor(128, 128, 0), // olive
        ))?
        .label("Accuracy")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], RGBColor(128, 128, 0)));
    accuracy_chart.configure_series_labels().draw()?;

    root.present()?;
    Ok(())
}
