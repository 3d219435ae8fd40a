//! Ordered, labelled composition of fundamental spaces.

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::error::SpaceError;
use crate::point::DictPoint;
use crate::space::Space;
use crate::validation::ValidationResult;

/// An ordered map from label to fundamental [`Space`].
///
/// Insertion order is the layout order for [`DictPoint`] children and for
/// flattened tensors. Labels are unique and exist for lookup and
/// debugging only.
///
/// # Examples
///
/// ```
/// use tether_space::{BinarySpace, BoxSpace, DictSpace, DiscreteSpace};
///
/// let mut dict = DictSpace::new();
/// dict.add("pos", BoxSpace::uniform(2)).unwrap();
/// dict.add("gear", DiscreteSpace::new(vec![3]).unwrap()).unwrap();
/// dict.add("brake", BinarySpace::new(1)).unwrap();
///
/// assert_eq!(dict.len(), 3);
/// assert_eq!(dict.num_dimensions(), 4);
/// assert_eq!(dict.flattened_size(), 6);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DictSpace {
    spaces: IndexMap<String, Space>,
}

impl DictSpace {
    /// An empty Dict.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a Dict from `(label, space)` pairs, in order.
    ///
    /// Fails with [`SpaceError::DuplicateLabel`] on the first repeated
    /// label.
    ///
    /// ```
    /// use tether_space::{BoxSpace, DictSpace, SpaceError};
    ///
    /// let ok = DictSpace::try_from_iter([("a", BoxSpace::uniform(1)), ("b", BoxSpace::uniform(2))]);
    /// assert_eq!(ok.unwrap().flattened_size(), 3);
    ///
    /// let dup = DictSpace::try_from_iter([("a", BoxSpace::uniform(1)), ("a", BoxSpace::uniform(2))]);
    /// assert_eq!(dup, Err(SpaceError::DuplicateLabel { label: "a".into() }));
    /// ```
    pub fn try_from_iter<L, S, I>(iter: I) -> Result<Self, SpaceError>
    where
        L: Into<String>,
        S: Into<Space>,
        I: IntoIterator<Item = (L, S)>,
    {
        let mut dict = Self::new();
        for (label, space) in iter {
            dict.add(label, space)?;
        }
        Ok(dict)
    }

    /// Append a child under a fresh label.
    pub fn add(
        &mut self,
        label: impl Into<String>,
        space: impl Into<Space>,
    ) -> Result<(), SpaceError> {
        match self.spaces.entry(label.into()) {
            Entry::Occupied(e) => Err(SpaceError::DuplicateLabel {
                label: e.key().clone(),
            }),
            Entry::Vacant(e) => {
                e.insert(space.into());
                Ok(())
            }
        }
    }

    /// Append every child of `other`, in order.
    ///
    /// Fails on the first label already present; children before it
    /// have been appended.
    pub fn append(&mut self, other: &DictSpace) -> Result<(), SpaceError> {
        for (label, space) in other.iter() {
            self.add(label, space.clone())?;
        }
        Ok(())
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    /// `true` if there are no children.
    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    /// Child by label.
    pub fn get(&self, label: &str) -> Option<&Space> {
        self.spaces.get(label)
    }

    /// Child by position.
    pub fn get_index(&self, index: usize) -> Option<(&str, &Space)> {
        self.spaces
            .get_index(index)
            .map(|(label, space)| (label.as_str(), space))
    }

    /// Labels in order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.spaces.keys().map(String::as_str)
    }

    /// `(label, space)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Space)> {
        self.spaces.iter().map(|(l, s)| (l.as_str(), s))
    }

    /// Total dimensions across children.
    pub fn num_dimensions(&self) -> usize {
        self.spaces.values().map(Space::num_dimensions).sum()
    }

    /// Total tensor size across children.
    pub fn flattened_size(&self) -> usize {
        self.spaces.values().map(Space::flattened_size).sum()
    }

    /// A Dict point with one empty child per space, in order.
    pub fn make_point(&self) -> DictPoint {
        self.spaces.values().map(Space::make_point).collect()
    }

    /// Validate each child in order; the first failure wins.
    ///
    /// An empty Dict yields [`ValidationResult::NoResults`]. A point with
    /// the wrong child count is [`ValidationResult::WrongDimensions`].
    pub fn validate(&self, point: &DictPoint) -> ValidationResult {
        if self.spaces.is_empty() {
            return ValidationResult::NoResults;
        }
        if point.len() != self.spaces.len() {
            return ValidationResult::WrongDimensions;
        }
        for (space, child) in self.spaces.values().zip(point) {
            let result = space.validate(child);
            if !result.is_success() {
                return result;
            }
        }
        ValidationResult::Success
    }

    /// Normalize every Box child in place.
    pub fn normalize_observation(&self, point: &mut DictPoint) {
        for (space, child) in self.spaces.values().zip(point.points.iter_mut()) {
            space.normalize(child);
        }
    }

    /// Concatenate each child's encoding into `buffer`, which must be
    /// exactly `flattened_size()` long and pre-zeroed.
    pub fn flatten(&self, point: &DictPoint, buffer: &mut [f32]) -> Result<(), SpaceError> {
        let size = self.flattened_size();
        if buffer.len() != size {
            return Err(SpaceError::BufferLength {
                expected: size,
                got: buffer.len(),
            });
        }
        if point.len() != self.spaces.len() {
            return Err(SpaceError::DimensionMismatch {
                expected: self.spaces.len(),
                got: point.len(),
            });
        }
        let mut offset = 0;
        for (space, child) in self.spaces.values().zip(point) {
            let width = space.flattened_size();
            space.flatten(child, &mut buffer[offset..offset + width])?;
            offset += width;
        }
        Ok(())
    }

    /// Decode one child per space from consecutive spans starting at `offset`.
    pub fn unflatten(&self, buffer: &[f32], offset: usize) -> Result<DictPoint, SpaceError> {
        let mut point = DictPoint::default();
        let mut cursor = offset;
        for space in self.spaces.values() {
            point.push(space.unflatten(buffer, cursor)?);
            cursor += space.flattened_size();
        }
        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::{BinaryPoint, BoxPoint, DiscretePoint, Point};
    use crate::{BinarySpace, BoxSpace, DiscreteSpace};

    fn mixed() -> DictSpace {
        let mut d = DictSpace::new();
        d.add("a", BoxSpace::uniform(2)).unwrap();
        d.add("b", DiscreteSpace::new(vec![3]).unwrap()).unwrap();
        d.add("c", BinarySpace::new(1)).unwrap();
        d
    }

    #[test]
    fn duplicate_label_rejected() {
        let mut d = mixed();
        assert_eq!(
            d.add("b", BinarySpace::new(4)),
            Err(SpaceError::DuplicateLabel {
                label: "b".to_string()
            })
        );
        assert_eq!(d.len(), 3);
    }

    #[test]
    fn try_from_iter_keeps_order_and_rejects_repeats() {
        let d = DictSpace::try_from_iter([
            ("a", Space::from(BoxSpace::uniform(2))),
            ("b", Space::from(DiscreteSpace::new(vec![3]).unwrap())),
            ("c", Space::from(BinarySpace::new(1))),
        ])
        .unwrap();
        assert_eq!(d, mixed());

        let dup = DictSpace::try_from_iter([
            ("a", Space::from(BoxSpace::uniform(1))),
            ("b", Space::from(BinarySpace::new(2))),
            ("a", Space::from(BinarySpace::new(3))),
        ]);
        assert_eq!(
            dup,
            Err(SpaceError::DuplicateLabel {
                label: "a".to_string()
            })
        );
    }

    #[test]
    fn empty_dict_validates_no_results() {
        let d = DictSpace::new();
        assert_eq!(
            d.validate(&DictPoint::default()),
            ValidationResult::NoResults
        );
    }

    #[test]
    fn first_failure_short_circuits() {
        let d = mixed();
        let point = DictPoint::new(vec![
            Point::Box(BoxPoint::new(vec![0.0])),
            Point::Box(BoxPoint::new(vec![0.0])),
            Point::Binary(BinaryPoint::new(vec![true])),
        ]);
        assert_eq!(d.validate(&point), ValidationResult::WrongDimensions);

        let point = DictPoint::new(vec![
            Point::Box(BoxPoint::new(vec![0.0, 0.0])),
            Point::Box(BoxPoint::new(vec![0.0])),
            Point::Binary(BinaryPoint::new(vec![true])),
        ]);
        assert_eq!(d.validate(&point), ValidationResult::WrongDataType);
    }

    #[test]
    fn make_point_has_one_slot_per_child() {
        let p = mixed().make_point();
        assert_eq!(p.len(), 3);
        assert!(p.iter().all(Point::is_empty));
    }

    #[test]
    fn flatten_rejects_wrong_child_count() {
        let d = mixed();
        let mut buf = vec![0.0; 6];
        let p = DictPoint::new(vec![Point::Box(BoxPoint::new(vec![0.0, 0.0]))]);
        assert!(matches!(
            d.flatten(&p, &mut buf),
            Err(SpaceError::DimensionMismatch { expected: 3, got: 1 })
        ));
    }

    #[test]
    fn append_preserves_order() {
        let mut d = DictSpace::new();
        d.add("z", BinarySpace::new(1)).unwrap();
        d.append(&mixed()).unwrap();
        assert_eq!(d.labels().collect::<Vec<_>>(), vec!["z", "a", "b", "c"]);
        assert!(d.append(&mixed()).is_err());
    }

    #[test]
    fn normalize_only_touches_box_children() {
        let mut d = DictSpace::new();
        d.add("pos", BoxSpace::from_bounds(&[0.0], &[4.0]).unwrap())
            .unwrap();
        d.add("gear", DiscreteSpace::new(vec![5]).unwrap()).unwrap();
        let mut p = DictPoint::new(vec![
            Point::Box(BoxPoint::new(vec![1.0])),
            Point::Discrete(DiscretePoint::new(vec![4])),
        ]);
        d.normalize_observation(&mut p);
        assert_eq!(p.points[0].as_box().unwrap().values, vec![0.25]);
        assert_eq!(p.points[1].as_discrete().unwrap().values, vec![4]);
    }
}
