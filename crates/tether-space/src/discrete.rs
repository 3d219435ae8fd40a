//! Discrete spaces with one-hot tensor encoding.

use crate::error::SpaceError;
use crate::point::DiscretePoint;
use crate::validation::ValidationResult;

/// A discrete space: dimension `i` takes integer values in `[0, high[i])`.
///
/// Flattens to a one-hot encoding, so the tensor size is the sum of the
/// upper bounds rather than the dimension count.
///
/// # Examples
///
/// ```
/// use tether_space::DiscreteSpace;
///
/// let space = DiscreteSpace::new(vec![2, 3, 4]).unwrap();
/// assert_eq!(space.num_dimensions(), 3);
/// assert_eq!(space.flattened_size(), 9);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiscreteSpace {
    high: Vec<u32>,
}

impl DiscreteSpace {
    /// Build from per-dimension exclusive upper bounds. Zero bounds are rejected.
    pub fn new(high: Vec<u32>) -> Result<Self, SpaceError> {
        if let Some(index) = high.iter().position(|&h| h == 0) {
            return Err(SpaceError::ZeroWidthDiscrete { index });
        }
        Ok(Self { high })
    }

    /// Exclusive upper bounds in dimension order.
    pub fn high(&self) -> &[u32] {
        &self.high
    }

    /// Append a dimension with exclusive upper bound `high`.
    pub fn add(&mut self, high: u32) -> Result<(), SpaceError> {
        if high == 0 {
            return Err(SpaceError::ZeroWidthDiscrete {
                index: self.high.len(),
            });
        }
        self.high.push(high);
        Ok(())
    }

    /// Append every dimension of `other`.
    pub fn merge(&mut self, other: &DiscreteSpace) {
        self.high.extend_from_slice(&other.high);
    }

    /// Number of dimensions.
    pub fn num_dimensions(&self) -> usize {
        self.high.len()
    }

    /// Tensor size: the sum of upper bounds.
    pub fn flattened_size(&self) -> usize {
        self.high.iter().map(|&h| h as usize).sum()
    }

    /// `true` if there are no dimensions.
    pub fn is_empty(&self) -> bool {
        self.high.is_empty()
    }

    /// Empty point with capacity for every dimension.
    pub fn make_point(&self) -> DiscretePoint {
        DiscretePoint::with_capacity(self.high.len())
    }

    /// Check dimension count, then `0 <= v < high` per dimension.
    pub fn validate(&self, point: &DiscretePoint) -> ValidationResult {
        if point.values.len() != self.high.len() {
            return ValidationResult::WrongDimensions;
        }
        let in_bounds = self
            .high
            .iter()
            .zip(&point.values)
            .all(|(&h, &v)| v >= 0 && (v as u32) < h);
        if in_bounds {
            ValidationResult::Success
        } else {
            ValidationResult::OutOfBounds
        }
    }

    /// One-hot encode into `buffer`, which must be exactly
    /// `flattened_size()` long and pre-zeroed by the caller.
    pub fn flatten(&self, point: &DiscretePoint, buffer: &mut [f32]) -> Result<(), SpaceError> {
        if buffer.len() != self.flattened_size() {
            return Err(SpaceError::BufferLength {
                expected: self.flattened_size(),
                got: buffer.len(),
            });
        }
        if point.values.len() != self.high.len() {
            return Err(SpaceError::DimensionMismatch {
                expected: self.high.len(),
                got: point.values.len(),
            });
        }
        let mut branch_start = 0usize;
        for (index, (&high, &value)) in self.high.iter().zip(&point.values).enumerate() {
            if value < 0 || value as u32 >= high {
                return Err(SpaceError::DiscreteOutOfRange { index, value, high });
            }
            buffer[branch_start + value as usize] = 1.0;
            branch_start += high as usize;
        }
        Ok(())
    }

    /// Decode each dimension's `high`-wide segment by argmax.
    ///
    /// Ties go to the earliest index: only a strictly greater logit
    /// replaces the running maximum.
    ///
    /// # Examples
    ///
    /// ```
    /// use tether_space::DiscreteSpace;
    ///
    /// let space = DiscreteSpace::new(vec![2, 3]).unwrap();
    /// let point = space.unflatten(&[0.5, 0.5, 0.3, 7.0, 9.9], 0).unwrap();
    /// assert_eq!(point.values, vec![0, 2]);
    /// ```
    pub fn unflatten(&self, buffer: &[f32], offset: usize) -> Result<DiscretePoint, SpaceError> {
        let end = offset + self.flattened_size();
        let logits = buffer.get(offset..end).ok_or(SpaceError::BufferLength {
            expected: end,
            got: buffer.len(),
        })?;
        let mut point = self.make_point();
        let mut branch_start = 0usize;
        for &high in &self.high {
            let segment = &logits[branch_start..branch_start + high as usize];
            point.values.push(argmax(segment) as i32);
            branch_start += high as usize;
        }
        Ok(point)
    }
}

/// Index of the first maximal element. NaN never wins.
fn argmax(segment: &[f32]) -> usize {
    let mut best = 0usize;
    let mut best_value = f32::NEG_INFINITY;
    for (i, &v) in segment.iter().enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}
