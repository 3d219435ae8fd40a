//! Flat `f32` buffers bound to a space's tensor layout.

use crate::dict::DictSpace;
use crate::error::SpaceError;
use crate::point::DictPoint;

/// A contiguous `f32` buffer sized to a Dict space's flattened encoding.
///
/// Model backends borrow the slice directly; the binding is allocated
/// once and rewritten in place by [`write_point`](Self::write_point) on
/// every decision.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TensorBinding {
    data: Vec<f32>,
}

impl TensorBinding {
    /// A zero-filled buffer of `len` elements.
    pub fn zeroed(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    /// A zero-filled buffer sized for `space`.
    pub fn for_space(space: &DictSpace) -> Self {
        Self::zeroed(space.flattened_size())
    }

    /// Allocate a buffer for `space` and flatten `point` into it.
    pub fn from_point(space: &DictSpace, point: &DictPoint) -> Result<Self, SpaceError> {
        let mut binding = Self::for_space(space);
        space.flatten(point, &mut binding.data)?;
        Ok(binding)
    }

    /// Zero the buffer and flatten `point` into it.
    ///
    /// The buffer must already be sized for `space`.
    pub fn write_point(&mut self, space: &DictSpace, point: &DictPoint) -> Result<(), SpaceError> {
        self.data.fill(0.0);
        space.flatten(point, &mut self.data)
    }

    /// Decode the buffer as an action of `space`.
    pub fn read_point(&self, space: &DictSpace) -> Result<DictPoint, SpaceError> {
        space.unflatten(&self.data, 0)
    }

    /// Element view.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable element view, for backends writing outputs.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Element count.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size in bytes (`len() * 4`).
    pub fn byte_len(&self) -> usize {
        std::mem::size_of_val(self.data.as_slice())
    }

    /// Little-endian byte image of the buffer.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for v in &self.data {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }
}

impl From<Vec<f32>> for TensorBinding {
    fn from(data: Vec<f32>) -> Self {
        Self { data }
    }
}
