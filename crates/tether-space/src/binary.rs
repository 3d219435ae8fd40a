//! Binary (boolean) spaces.

use crate::error::SpaceError;
use crate::point::BinaryPoint;
use crate::validation::ValidationResult;

/// A space of `shape` boolean dimensions.
///
/// Values flatten to `0.0`/`1.0`; any non-zero logit decodes to `true`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BinarySpace {
    shape: usize,
}

impl BinarySpace {
    /// A space of `shape` booleans.
    pub fn new(shape: usize) -> Self {
        Self { shape }
    }

    /// Number of boolean dimensions.
    pub fn shape(&self) -> usize {
        self.shape
    }

    /// Append the dimensions of `other`.
    pub fn merge(&mut self, other: &BinarySpace) {
        self.shape += other.shape;
    }

    /// Number of dimensions.
    pub fn num_dimensions(&self) -> usize {
        self.shape
    }

    /// Tensor size, equal to the dimension count.
    pub fn flattened_size(&self) -> usize {
        self.shape
    }

    /// `true` if the shape is zero.
    pub fn is_empty(&self) -> bool {
        self.shape == 0
    }

    /// Empty point with capacity for every dimension.
    pub fn make_point(&self) -> BinaryPoint {
        BinaryPoint::with_capacity(self.shape)
    }

    /// Booleans have no bounds; only the dimension count is checked.
    pub fn validate(&self, point: &BinaryPoint) -> ValidationResult {
        if point.values.len() == self.shape {
            ValidationResult::Success
        } else {
            ValidationResult::WrongDimensions
        }
    }

    /// Write `1.0` for `true`, `0.0` for `false`.
    pub fn flatten(&self, point: &BinaryPoint, buffer: &mut [f32]) -> Result<(), SpaceError> {
        if buffer.len() != self.shape {
            return Err(SpaceError::BufferLength {
                expected: self.shape,
                got: buffer.len(),
            });
        }
        if point.values.len() != self.shape {
            return Err(SpaceError::DimensionMismatch {
                expected: self.shape,
                got: point.values.len(),
            });
        }
        for (slot, &v) in buffer.iter_mut().zip(&point.values) {
            *slot = if v { 1.0 } else { 0.0 };
        }
        Ok(())
    }

    /// Decode `shape` values starting at `offset`; non-zero means `true`.
    pub fn unflatten(&self, buffer: &[f32], offset: usize) -> Result<BinaryPoint, SpaceError> {
        let end = offset + self.shape;
        let values = buffer.get(offset..end).ok_or(SpaceError::BufferLength {
            expected: end,
            got: buffer.len(),
        })?;
        Ok(BinaryPoint::new(values.iter().map(|&v| v != 0.0).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_to_unit_floats() {
        let space = BinarySpace::new(3);
        let mut buf = [9.0; 3];
        space
            .flatten(&BinaryPoint::new(vec![true, false, true]), &mut buf)
            .unwrap();
        assert_eq!(buf, [1.0, 0.0, 1.0]);
    }

    #[test]
    fn any_nonzero_logit_is_true() {
        let space = BinarySpace::new(3);
        let p = space.unflatten(&[0.0, -0.2, 3.0], 0).unwrap();
        assert_eq!(p.values, vec![false, true, true]);
    }

    #[test]
    fn validate_checks_length_only() {
        let space = BinarySpace::new(2);
        assert!(space.validate(&BinaryPoint::new(vec![true, true])).is_success());
        assert_eq!(
            space.validate(&BinaryPoint::new(vec![true])),
            ValidationResult::WrongDimensions
        );
    }

    #[test]
    fn merge_adds_shapes() {
        let mut a = BinarySpace::new(2);
        a.merge(&BinarySpace::new(3));
        assert_eq!(a.flattened_size(), 5);
    }
}
