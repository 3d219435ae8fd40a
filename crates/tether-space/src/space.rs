//! The closed set of fundamental spaces.

use std::fmt;

use crate::binary::BinarySpace;
use crate::box_space::BoxSpace;
use crate::discrete::DiscreteSpace;
use crate::error::SpaceError;
use crate::point::Point;
use crate::validation::ValidationResult;

/// Discriminant shared by [`Space`] and [`Point`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpaceKind {
    /// Continuous.
    Box,
    /// Integer, one-hot encoded.
    Discrete,
    /// Boolean.
    Binary,
}

impl fmt::Display for SpaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Box => f.write_str("box"),
            Self::Discrete => f.write_str("discrete"),
            Self::Binary => f.write_str("binary"),
        }
    }
}

/// A fundamental space.
///
/// Every operation dispatches exhaustively over the three variants, so a
/// new variant cannot be added without handling it everywhere.
#[derive(Clone, Debug, PartialEq)]
pub enum Space {
    /// Continuous bounded values.
    Box(BoxSpace),
    /// Integers with per-dimension upper bounds.
    Discrete(DiscreteSpace),
    /// Booleans.
    Binary(BinarySpace),
}

impl Space {
    /// Which variant this space is.
    pub fn kind(&self) -> SpaceKind {
        match self {
            Self::Box(_) => SpaceKind::Box,
            Self::Discrete(_) => SpaceKind::Discrete,
            Self::Binary(_) => SpaceKind::Binary,
        }
    }

    /// Number of dimensions.
    pub fn num_dimensions(&self) -> usize {
        match self {
            Self::Box(s) => s.num_dimensions(),
            Self::Discrete(s) => s.num_dimensions(),
            Self::Binary(s) => s.num_dimensions(),
        }
    }

    /// Size of the flattened tensor encoding.
    pub fn flattened_size(&self) -> usize {
        match self {
            Self::Box(s) => s.flattened_size(),
            Self::Discrete(s) => s.flattened_size(),
            Self::Binary(s) => s.flattened_size(),
        }
    }

    /// `true` if the space has no dimensions.
    pub fn is_empty(&self) -> bool {
        self.num_dimensions() == 0
    }

    /// An empty point of the matching variant.
    pub fn make_point(&self) -> Point {
        match self {
            Self::Box(s) => Point::Box(s.make_point()),
            Self::Discrete(s) => Point::Discrete(s.make_point()),
            Self::Binary(s) => Point::Binary(s.make_point()),
        }
    }

    /// Validate `point`; a variant mismatch is [`ValidationResult::WrongDataType`].
    pub fn validate(&self, point: &Point) -> ValidationResult {
        match (self, point) {
            (Self::Box(s), Point::Box(p)) => s.validate(p),
            (Self::Discrete(s), Point::Discrete(p)) => s.validate(p),
            (Self::Binary(s), Point::Binary(p)) => s.validate(p),
            _ => ValidationResult::WrongDataType,
        }
    }

    /// Normalize Box points onto `[0, 1]`. Other variants are untouched.
    pub fn normalize(&self, point: &mut Point) {
        if let (Self::Box(s), Point::Box(p)) = (self, point) {
            s.normalize(p);
        }
    }

    /// Encode `point` into `buffer`, which must be exactly `flattened_size()` long.
    pub fn flatten(&self, point: &Point, buffer: &mut [f32]) -> Result<(), SpaceError> {
        match (self, point) {
            (Self::Box(s), Point::Box(p)) => s.flatten(p, buffer),
            (Self::Discrete(s), Point::Discrete(p)) => s.flatten(p, buffer),
            (Self::Binary(s), Point::Binary(p)) => s.flatten(p, buffer),
            _ => Err(SpaceError::VariantMismatch {
                expected: self.kind(),
                got: point.kind(),
            }),
        }
    }

    /// Decode a point from `buffer` starting at `offset`.
    pub fn unflatten(&self, buffer: &[f32], offset: usize) -> Result<Point, SpaceError> {
        Ok(match self {
            Self::Box(s) => Point::Box(s.unflatten(buffer, offset)?),
            Self::Discrete(s) => Point::Discrete(s.unflatten(buffer, offset)?),
            Self::Binary(s) => Point::Binary(s.unflatten(buffer, offset)?),
        })
    }
}

impl From<BoxSpace> for Space {
    fn from(s: BoxSpace) -> Self {
        Self::Box(s)
    }
}

impl From<DiscreteSpace> for Space {
    fn from(s: DiscreteSpace) -> Self {
        Self::Discrete(s)
    }
}

impl From<BinarySpace> for Space {
    fn from(s: BinarySpace) -> Self {
        Self::Binary(s)
    }
}
