//! Point types: one instant of data for one space.
//!
//! Points are created empty by their space ([`Space::make_point`]),
//! filled by a collector, consumed by flatten/normalize/validate, and
//! then reset for reuse. [`reset`](Point::reset) clears values but keeps
//! the backing allocation.
//!
//! [`Space::make_point`]: crate::Space::make_point

use crate::space::SpaceKind;

/// Continuous values, one per Box dimension.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoxPoint {
    /// Values in dimension order.
    pub values: Vec<f32>,
}

impl BoxPoint {
    /// Wrap an existing value vector.
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Empty point with room for `n` values.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            values: Vec::with_capacity(n),
        }
    }
}

/// Integer values, one per Discrete dimension.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiscretePoint {
    /// Values in dimension order.
    pub values: Vec<i32>,
}

impl DiscretePoint {
    /// Wrap an existing value vector.
    pub fn new(values: Vec<i32>) -> Self {
        Self { values }
    }

    /// Empty point with room for `n` values.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            values: Vec::with_capacity(n),
        }
    }
}

/// Boolean values, one per Binary dimension.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BinaryPoint {
    /// Values in dimension order.
    pub values: Vec<bool>,
}

impl BinaryPoint {
    /// Wrap an existing value vector.
    pub fn new(values: Vec<bool>) -> Self {
        Self { values }
    }

    /// Empty point with room for `n` values.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            values: Vec::with_capacity(n),
        }
    }
}

/// A fundamental point of one of the three closed variants.
#[derive(Clone, Debug, PartialEq)]
pub enum Point {
    /// Continuous values.
    Box(BoxPoint),
    /// Discrete values.
    Discrete(DiscretePoint),
    /// Boolean values.
    Binary(BinaryPoint),
}

impl Point {
    /// Which variant this point is.
    pub fn kind(&self) -> SpaceKind {
        match self {
            Self::Box(_) => SpaceKind::Box,
            Self::Discrete(_) => SpaceKind::Discrete,
            Self::Binary(_) => SpaceKind::Binary,
        }
    }

    /// Number of values held.
    pub fn len(&self) -> usize {
        match self {
            Self::Box(p) => p.values.len(),
            Self::Discrete(p) => p.values.len(),
            Self::Binary(p) => p.values.len(),
        }
    }

    /// `true` if no values are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear values in place, keeping capacity.
    pub fn reset(&mut self) {
        match self {
            Self::Box(p) => p.values.clear(),
            Self::Discrete(p) => p.values.clear(),
            Self::Binary(p) => p.values.clear(),
        }
    }

    /// Borrow as a Box point.
    pub fn as_box(&self) -> Option<&BoxPoint> {
        match self {
            Self::Box(p) => Some(p),
            _ => None,
        }
    }

    /// Mutably borrow as a Box point.
    pub fn as_box_mut(&mut self) -> Option<&mut BoxPoint> {
        match self {
            Self::Box(p) => Some(p),
            _ => None,
        }
    }

    /// Borrow as a Discrete point.
    pub fn as_discrete(&self) -> Option<&DiscretePoint> {
        match self {
            Self::Discrete(p) => Some(p),
            _ => None,
        }
    }

    /// Mutably borrow as a Discrete point.
    pub fn as_discrete_mut(&mut self) -> Option<&mut DiscretePoint> {
        match self {
            Self::Discrete(p) => Some(p),
            _ => None,
        }
    }

    /// Borrow as a Binary point.
    pub fn as_binary(&self) -> Option<&BinaryPoint> {
        match self {
            Self::Binary(p) => Some(p),
            _ => None,
        }
    }

    /// Mutably borrow as a Binary point.
    pub fn as_binary_mut(&mut self) -> Option<&mut BinaryPoint> {
        match self {
            Self::Binary(p) => Some(p),
            _ => None,
        }
    }
}

impl From<BoxPoint> for Point {
    fn from(p: BoxPoint) -> Self {
        Self::Box(p)
    }
}

impl From<DiscretePoint> for Point {
    fn from(p: DiscretePoint) -> Self {
        Self::Discrete(p)
    }
}

impl From<BinaryPoint> for Point {
    fn from(p: BinaryPoint) -> Self {
        Self::Binary(p)
    }
}

/// Ordered composition of fundamental points.
///
/// Children line up positionally with the children of the
/// [`DictSpace`](crate::DictSpace) that produced this point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DictPoint {
    /// Child points in Dict order.
    pub points: Vec<Point>,
}

impl DictPoint {
    /// Wrap an existing child vector.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `true` if there are no children.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append a child.
    pub fn push(&mut self, point: impl Into<Point>) {
        self.points.push(point.into());
    }

    /// Child at `index`.
    pub fn get(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    /// Mutable child at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Point> {
        self.points.get_mut(index)
    }

    /// Iterate children in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    /// Clear every child's values, keeping the slots and their capacity.
    pub fn reset(&mut self) {
        for p in &mut self.points {
            p.reset();
        }
    }
}

impl FromIterator<Point> for DictPoint {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a DictPoint {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
