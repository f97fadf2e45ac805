//! Fixed-capacity vector history
//!
//! A [`VectorBuffer`] keeps the most recent vectors newest first: index 0 is the
//! latest entry and older entries move toward higher indices as new data is
//! shifted in. Slots start out empty and can be emptied again, which is how the
//! calibrator forces a fresh batch of samples.
//!
//! # Example
//! ```
//! use nalgebra::Vector3;
//! use compass_fusion::VectorBuffer;
//!
//! let mut buffer = VectorBuffer::<4>::new();
//! buffer.push(Vector3::new(1.0, 0.0, 0.0));
//! buffer.push(Vector3::new(2.0, 0.0, 0.0));
//!
//! assert_eq!(buffer.get(0), Some(Vector3::new(2.0, 0.0, 0.0)));
//! assert_eq!(buffer.populated(), 2);
//! assert_eq!(buffer.get(2), None);
//! ```

use nalgebra::Vector3;

use crate::error::{FusionError, Result};
use crate::math::is_sentinel;

/// Newest-first ring of optional vectors with a compile-time capacity.
///
/// Empty slots replace the firmware convention of a maximum-magnitude sentinel
/// vector. Storing a vector that carries the sentinel value leaves the slot
/// empty, so data coming from sentinel-based producers keeps its meaning.
/// NaN and infinite components are treated the same way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorBuffer<const N: usize> {
    slots: [Option<Vector3<f32>>; N],
}

impl<const N: usize> VectorBuffer<N> {
    /// Create a buffer with every slot empty
    pub const fn new() -> Self {
        Self { slots: [None; N] }
    }

    /// Empty every slot
    pub fn init(&mut self) {
        self.slots = [None; N];
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Move every entry `count` slots toward the old end and empty slots
    /// `0..count` for new data. Entries pushed past the end are dropped.
    ///
    /// Fails without touching the buffer when `count` is zero or larger than
    /// the capacity.
    pub fn shift(&mut self, count: usize) -> Result<()> {
        if count < 1 || count > N {
            return Err(FusionError::InvalidArgument);
        }

        self.slots.copy_within(0..N - count, count);
        self.slots[..count].fill(None);

        Ok(())
    }

    /// Shift by one and store `vector` as the newest entry
    pub fn push(&mut self, vector: Vector3<f32>) {
        if N == 0 {
            return;
        }
        self.slots.copy_within(0..N - 1, 1);
        self.slots[0] = Self::tag(vector);
    }

    /// Overwrite one slot; out-of-range indices are ignored
    pub fn set(&mut self, index: usize, vector: Option<Vector3<f32>>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = vector.and_then(Self::tag);
        }
    }

    /// Entry at `index`, `None` when empty or out of range
    pub fn get(&self, index: usize) -> Option<Vector3<f32>> {
        self.slots.get(index).copied().flatten()
    }

    /// Empty every slot from `index` to the old end
    pub fn clear_from(&mut self, index: usize) {
        if index < N {
            self.slots[index..].fill(None);
        }
    }

    /// Length of the run of populated slots starting at the newest entry
    pub fn populated(&self) -> usize {
        self.slots
            .iter()
            .position(|slot| slot.is_none())
            .unwrap_or(N)
    }

    /// Returns true when the newest slot is empty
    pub fn is_empty(&self) -> bool {
        self.populated() == 0
    }

    /// Raw view of every slot, newest first
    pub fn slots(&self) -> &[Option<Vector3<f32>>; N] {
        &self.slots
    }

    /// Populated entries newest first, stopping at the first empty slot
    pub fn iter(&self) -> impl Iterator<Item = Vector3<f32>> + '_ {
        self.slots.iter().map_while(|slot| *slot)
    }

    fn tag(vector: Vector3<f32>) -> Option<Vector3<f32>> {
        if is_sentinel(&vector) || !vector.iter().all(|c| c.is_finite()) {
            None
        } else {
            Some(vector)
        }
    }
}

impl<const N: usize> Default for VectorBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
