#![no_std]

//! Compass fusion - tilt-compensated heading with automatic hard-iron calibration
//!
//! This library turns raw magnetometer and accelerometer samples into an
//! azimuth, pitch and roll for an electronic compass, while continuously
//! estimating the magnetometer's hard-iron offset from the geometry of recent
//! samples.
//!
//! # Features
//!
//! - Automatic offset calibration by four-point sphere fitting
//! - Stability gating so only settled offsets are applied
//! - Tilt compensation from the averaged gravity vector
//! - Sensor mounting patterns and integer layout matrices
//! - Q16 fixed-point and persisted-offset codecs for the device boundary
//! - Optional `defmt` logging
//! - `#![no_std]`, allocation free, for embedded systems
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use compass_fusion::{FusionState, LayoutPattern, rotate};
//!
//! let mut state = FusionState::new();
//! state.start_measurement(None); // nothing persisted yet
//!
//! // Readings in the chip frame, remapped to the device frame
//! let magnetometer = rotate(Vector3::new(30.0, 0.0, -20.0), LayoutPattern::Pat2); // µT
//! let accelerometer = Vector3::new(0.0, 0.0, 9.8);                                 // m/s²
//!
//! state.on_magnetometer_sample(magnetometer, 1).unwrap();
//! state.on_accelerometer_sample(accelerometer, 1).unwrap();
//!
//! let orientation = state.compute_orientation().unwrap();
//! assert!((0.0..360.0).contains(&orientation.azimuth));
//!
//! // Save the offset for the next session
//! let record = state.stop_measurement().to_bytes();
//! # let _ = record;
//! ```

mod axes;
mod buffer;
pub mod compass;
mod error;
mod fusion;
pub mod fixed;
mod logging;
mod math;
mod normalize;
mod offset;
mod persist;
mod source;
pub mod sphere;
mod types;

// Re-export all public types and functions
pub use axes::{LayoutPattern, rotate, rotate_matrix};
pub use buffer::VectorBuffer;
pub use error::{FusionError, Result};
pub use fusion::{FusionState, WINDOW};
pub use math::{DEG_TO_RAD, EPSILON, RAD_TO_DEG, SENTINEL, Vector3Ext, is_sentinel, sentinel};
pub use normalize::{average, normalize_and_buffer};
pub use offset::{CalibrationHistory, OFFSET_WINDOW, RAW_WINDOW};
pub use persist::PersistedOffset;
pub use source::{IterSource, SampleSource};
pub use sphere::Sphere;
pub use types::*;
