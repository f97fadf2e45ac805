//! Persisted magnetometer offset record
//!
//! The record is the only state carried between sessions. It is a fixed
//! 16-byte little-endian layout:
//!
//! | bytes  | content                   |
//! |--------|---------------------------|
//! | 0..4   | magic `0xCAFECAFE`        |
//! | 4..8   | offset x, `f32`, µT       |
//! | 8..12  | offset y, `f32`, µT       |
//! | 12..16 | offset z, `f32`, µT       |
//!
//! Storage is the caller's business; this module only encodes and decodes.

use nalgebra::Vector3;

use crate::error::{FusionError, Result};
use crate::logging::log_warn;

/// Hard-iron offset saved at the end of a measurement session
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PersistedOffset {
    /// Magnetometer offset in µT
    pub offset: Vector3<f32>,
}

impl PersistedOffset {
    /// Record identifier
    pub const MAGIC: u32 = 0xCAFE_CAFE;

    /// Encoded size in bytes
    pub const ENCODED_LEN: usize = 16;

    /// Wrap an offset
    pub fn new(offset: Vector3<f32>) -> Self {
        Self { offset }
    }

    /// Encode the record
    ///
    /// # Example
    /// ```
    /// use nalgebra::Vector3;
    /// use compass_fusion::PersistedOffset;
    ///
    /// let record = PersistedOffset::new(Vector3::new(1.0, 2.0, 3.0));
    /// let bytes = record.to_bytes();
    /// assert_eq!(&bytes[..4], &[0xFE, 0xCA, 0xFE, 0xCA]);
    /// assert_eq!(PersistedOffset::from_bytes(&bytes), Ok(record));
    /// ```
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let mut bytes = [0u8; Self::ENCODED_LEN];
        bytes[0..4].copy_from_slice(&Self::MAGIC.to_le_bytes());
        for (i, component) in self.offset.iter().enumerate() {
            let start = 4 + i * 4;
            bytes[start..start + 4].copy_from_slice(&component.to_le_bytes());
        }
        bytes
    }

    /// Decode a record.
    ///
    /// Fails with [`FusionError::InvalidArgument`] when the input is shorter
    /// than [`Self::ENCODED_LEN`], the magic does not match or a component is
    /// not finite. Trailing bytes are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::ENCODED_LEN {
            return Err(FusionError::InvalidArgument);
        }

        if read_u32(bytes, 0) != Self::MAGIC {
            return Err(FusionError::InvalidArgument);
        }

        let offset = Vector3::new(
            f32::from_bits(read_u32(bytes, 4)),
            f32::from_bits(read_u32(bytes, 8)),
            f32::from_bits(read_u32(bytes, 12)),
        );

        if offset.iter().any(|component| !component.is_finite()) {
            return Err(FusionError::InvalidArgument);
        }

        Ok(Self { offset })
    }

    /// Decode a record, falling back to a zero offset.
    ///
    /// An absent or corrupt record is the normal situation on first boot, so
    /// it is not an error.
    pub fn restore(bytes: Option<&[u8]>) -> Self {
        match bytes.map(Self::from_bytes) {
            Some(Ok(record)) => record,
            Some(Err(_)) => {
                log_warn!("persisted offset rejected, starting from zero");
                Self::default()
            }
            None => Self::default(),
        }
    }
}

fn read_u32(bytes: &[u8], start: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[start..start + 4]);
    u32::from_le_bytes(word)
}
