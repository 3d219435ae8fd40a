//! Continuous Box spaces.

use crate::error::SpaceError;
use crate::point::BoxPoint;
use crate::validation::ValidationResult;

/// Bounds of one continuous dimension, inclusive at both ends.
///
/// The default dimension is `[-1, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxSpaceDimension {
    /// Inclusive lower bound.
    pub low: f32,
    /// Inclusive upper bound.
    pub high: f32,
}

impl Default for BoxSpaceDimension {
    fn default() -> Self {
        Self {
            low: -1.0,
            high: 1.0,
        }
    }
}

impl BoxSpaceDimension {
    /// Checked constructor: bounds must be finite with `low <= high`.
    ///
    /// `low == high` is accepted; such a dimension normalizes to `0.0`.
    pub fn new(low: f32, high: f32) -> Result<Self, SpaceError> {
        let dim = Self { low, high };
        dim.check()?;
        Ok(dim)
    }

    /// The unit interval `[0, 1]`.
    pub fn zero_one() -> Self {
        Self {
            low: 0.0,
            high: 1.0,
        }
    }

    /// The centred unit interval `[-0.5, 0.5]`.
    pub fn centered_unit() -> Self {
        Self {
            low: -0.5,
            high: 0.5,
        }
    }

    pub(crate) fn check(&self) -> Result<(), SpaceError> {
        if !self.low.is_finite() || !self.high.is_finite() || self.high < self.low {
            return Err(SpaceError::InvalidBounds {
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }

    /// `high - low`.
    pub fn width(&self) -> f32 {
        self.high - self.low
    }

    /// Whether `value` lies in `[low, high]`. NaN is never contained.
    pub fn contains(&self, value: f32) -> bool {
        self.low <= value && value <= self.high
    }

    /// Map `value` from `[low, high]` onto `[0, 1]`.
    ///
    /// A zero-width dimension maps every value to `0.0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tether_space::BoxSpaceDimension;
    ///
    /// let dim = BoxSpaceDimension::new(0.0, 10.0).unwrap();
    /// assert_eq!(dim.normalize_value(5.0), 0.5);
    /// assert_eq!(dim.rescale_value(0.5), 5.0);
    /// ```
    pub fn normalize_value(&self, value: f32) -> f32 {
        let width = self.width();
        if width == 0.0 {
            return 0.0;
        }
        (value - self.low) / width
    }

    /// Map a normalized `[0, 1]` value back onto `[low, high]`.
    pub fn rescale_value(&self, normalized: f32) -> f32 {
        normalized * self.width() + self.low
    }

    /// Map `value` from `[old_low, old_high]` onto this dimension.
    ///
    /// A zero-width source range maps every value to `low`.
    pub fn rescale_from(&self, value: f32, old_low: f32, old_high: f32) -> f32 {
        let old_width = old_high - old_low;
        if old_width == 0.0 {
            return self.low;
        }
        self.rescale_value((value - old_low) / old_width)
    }
}

/// A continuous space: one [`BoxSpaceDimension`] per value.
///
/// # Examples
///
/// ```
/// use tether_space::{BoxPoint, BoxSpace, ValidationResult};
///
/// let space = BoxSpace::from_bounds(&[-1.0, 0.0], &[1.0, 10.0]).unwrap();
/// assert_eq!(space.num_dimensions(), 2);
/// assert_eq!(space.flattened_size(), 2);
/// let p = BoxPoint::new(vec![0.5, 5.0]);
/// assert_eq!(space.validate(&p), ValidationResult::Success);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoxSpace {
    dimensions: Vec<BoxSpaceDimension>,
}

impl BoxSpace {
    /// Build from dimensions, rejecting any with invalid bounds.
    pub fn new(dimensions: Vec<BoxSpaceDimension>) -> Result<Self, SpaceError> {
        for dim in &dimensions {
            dim.check()?;
        }
        Ok(Self { dimensions })
    }

    /// Build from parallel `low` and `high` slices.
    pub fn from_bounds(low: &[f32], high: &[f32]) -> Result<Self, SpaceError> {
        if low.len() != high.len() {
            return Err(SpaceError::DimensionMismatch {
                expected: low.len(),
                got: high.len(),
            });
        }
        let dims = low
            .iter()
            .zip(high)
            .map(|(&l, &h)| BoxSpaceDimension::new(l, h))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { dimensions: dims })
    }

    /// `n` dimensions, each with the default `[-1, 1]` bounds.
    pub fn uniform(n: usize) -> Self {
        Self {
            dimensions: vec![BoxSpaceDimension::default(); n],
        }
    }

    /// The dimensions in order.
    pub fn dimensions(&self) -> &[BoxSpaceDimension] {
        &self.dimensions
    }

    /// Append one dimension.
    pub fn add(&mut self, dim: BoxSpaceDimension) -> Result<(), SpaceError> {
        dim.check()?;
        self.dimensions.push(dim);
        Ok(())
    }

    /// Append every dimension of `other`.
    pub fn merge(&mut self, other: &BoxSpace) {
        self.dimensions.extend_from_slice(&other.dimensions);
    }

    /// Number of dimensions.
    pub fn num_dimensions(&self) -> usize {
        self.dimensions.len()
    }

    /// Tensor size: equal to the dimension count.
    pub fn flattened_size(&self) -> usize {
        self.dimensions.len()
    }

    /// `true` if there are no dimensions.
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// A space of the same rank with every dimension `[0, 1]`.
    pub fn normalized_space(&self) -> BoxSpace {
        BoxSpace {
            dimensions: vec![BoxSpaceDimension::zero_one(); self.dimensions.len()],
        }
    }

    /// Empty point with capacity for every dimension.
    pub fn make_point(&self) -> BoxPoint {
        BoxPoint::with_capacity(self.dimensions.len())
    }

    /// Check dimension count, then `low <= v <= high` per dimension.
    pub fn validate(&self, point: &BoxPoint) -> ValidationResult {
        if point.values.len() != self.dimensions.len() {
            return ValidationResult::WrongDimensions;
        }
        let in_bounds = self
            .dimensions
            .iter()
            .zip(&point.values)
            .all(|(dim, &v)| dim.contains(v));
        if in_bounds {
            ValidationResult::Success
        } else {
            ValidationResult::OutOfBounds
        }
    }

    /// Rescale each value onto `[0, 1]` in place.
    pub fn normalize(&self, point: &mut BoxPoint) {
        for (dim, v) in self.dimensions.iter().zip(point.values.iter_mut()) {
            *v = dim.normalize_value(*v);
        }
    }

    /// Inverse of [`normalize`](Self::normalize).
    pub fn rescale(&self, point: &mut BoxPoint) {
        for (dim, v) in self.dimensions.iter().zip(point.values.iter_mut()) {
            *v = dim.rescale_value(*v);
        }
    }

    /// Identity copy into `buffer`, which must be exactly `flattened_size()` long.
    pub fn flatten(&self, point: &BoxPoint, buffer: &mut [f32]) -> Result<(), SpaceError> {
        if buffer.len() != self.flattened_size() {
            return Err(SpaceError::BufferLength {
                expected: self.flattened_size(),
                got: buffer.len(),
            });
        }
        if point.values.len() != self.dimensions.len() {
            return Err(SpaceError::DimensionMismatch {
                expected: self.dimensions.len(),
                got: point.values.len(),
            });
        }
        buffer.copy_from_slice(&point.values);
        Ok(())
    }

    /// Copy `num_dimensions()` values starting at `offset`.
    pub fn unflatten(&self, buffer: &[f32], offset: usize) -> Result<BoxPoint, SpaceError> {
        let end = offset + self.dimensions.len();
        let values = buffer.get(offset..end).ok_or(SpaceError::BufferLength {
            expected: end,
            got: buffer.len(),
        })?;
        Ok(BoxPoint::new(values.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_dimension_is_symmetric_unit() {
        let d = BoxSpaceDimension::default();
        assert_eq!((d.low, d.high), (-1.0, 1.0));
        assert_eq!(BoxSpaceDimension::centered_unit().width(), 1.0);
    }

    #[test]
    fn validate_boundaries_inclusive() {
        let space = BoxSpace::new(vec![BoxSpaceDimension::default()]).unwrap();
        for v in [-1.0, 1.0, 0.0] {
            assert_eq!(
                space.validate(&BoxPoint::new(vec![v])),
                ValidationResult::Success
            );
        }
        for v in [1.0001, -1.0001] {
            assert_eq!(
                space.validate(&BoxPoint::new(vec![v])),
                ValidationResult::OutOfBounds
            );
        }
    }

    #[test]
    fn validate_nan_out_of_bounds() {
        let space = BoxSpace::uniform(1);
        assert_eq!(
            space.validate(&BoxPoint::new(vec![f32::NAN])),
            ValidationResult::OutOfBounds
        );
    }

    #[test]
    fn validate_wrong_dimensions() {
        let space = BoxSpace::uniform(2);
        assert_eq!(
            space.validate(&BoxPoint::new(vec![0.0])),
            ValidationResult::WrongDimensions
        );
    }

    #[test]
    fn reject_inverted_and_non_finite_bounds() {
        assert!(BoxSpaceDimension::new(1.0, -1.0).is_err());
        assert!(BoxSpaceDimension::new(f32::NEG_INFINITY, 0.0).is_err());
        assert!(BoxSpace::new(vec![BoxSpaceDimension {
            low: 0.0,
            high: f32::NAN
        }])
        .is_err());
    }

    #[test]
    fn degenerate_dimension_normalizes_to_zero() {
        let d = BoxSpaceDimension::new(3.0, 3.0).unwrap();
        assert_eq!(d.normalize_value(3.0), 0.0);
        assert_eq!(d.rescale_value(0.7), 3.0);
    }

    #[test]
    fn rescale_from_other_range() {
        let d = BoxSpaceDimension::new(0.0, 10.0).unwrap();
        assert_eq!(d.rescale_from(0.0, -1.0, 1.0), 5.0);
        assert_eq!(d.rescale_from(4.0, 4.0, 4.0), 0.0);
    }

    #[test]
    fn normalized_space_is_unit() {
        let space = BoxSpace::from_bounds(&[-5.0, 2.0], &[5.0, 4.0]).unwrap();
        let n = space.normalized_space();
        assert_eq!(n.num_dimensions(), 2);
        assert!(n
            .dimensions()
            .iter()
            .all(|d| *d == BoxSpaceDimension::zero_one()));
    }

    #[test]
    fn merge_appends_dimensions() {
        let mut a = BoxSpace::uniform(1);
        let b = BoxSpace::from_bounds(&[0.0], &[2.0]).unwrap();
        a.merge(&b);
        assert_eq!(a.num_dimensions(), 2);
        assert_eq!(a.dimensions()[1].high, 2.0);
    }

    #[test]
    fn flatten_rejects_wrong_buffer() {
        let space = BoxSpace::uniform(2);
        let mut buf = [0.0; 3];
        let err = space
            .flatten(&BoxPoint::new(vec![0.0, 0.0]), &mut buf)
            .unwrap_err();
        assert_eq!(
            err,
            SpaceError::BufferLength {
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn unflatten_rejects_short_buffer() {
        let space = BoxSpace::uniform(3);
        assert!(space.unflatten(&[0.0, 1.0, 2.0], 1).is_err());
        assert_eq!(
            space.unflatten(&[9.0, 0.0, 1.0, 2.0], 1).unwrap().values,
            vec![0.0, 1.0, 2.0]
        );
    }

    fn arb_box() -> impl Strategy<Value = (BoxSpace, BoxPoint)> {
        prop::collection::vec((-1000.0f32..1000.0, 0.001f32..1000.0), 0..16).prop_flat_map(
            |bounds| {
                let dims: Vec<BoxSpaceDimension> = bounds
                    .iter()
                    .map(|&(low, w)| BoxSpaceDimension {
                        low,
                        high: low + w,
                    })
                    .collect();
                let values: Vec<_> = dims.iter().map(|d| d.low..=d.high).collect();
                (Just(BoxSpace::new(dims).unwrap()), values)
            },
        )
        .prop_map(|(space, values)| (space, BoxPoint::new(values)))
    }

    proptest! {
        #[test]
        fn flatten_unflatten_round_trip((space, point) in arb_box()) {
            let mut buf = vec![0.0; space.flattened_size()];
            space.flatten(&point, &mut buf).unwrap();
            let back = space.unflatten(&buf, 0).unwrap();
            prop_assert_eq!(back, point);
        }

        #[test]
        fn normalize_then_rescale_is_identity(
            low in -1000.0f32..1000.0,
            width in 0.01f32..1000.0,
            t in 0.0f32..=1.0,
        ) {
            let dim = BoxSpaceDimension { low, high: low + width };
            let v = dim.low + t * dim.width();
            let back = dim.rescale_value(dim.normalize_value(v));
            prop_assert!((back - v).abs() <= 1e-3 * (1.0 + v.abs()));
        }

        #[test]
        fn conforming_points_validate((space, point) in arb_box()) {
            prop_assert_eq!(space.validate(&point), ValidationResult::Success);
        }
    }
}
