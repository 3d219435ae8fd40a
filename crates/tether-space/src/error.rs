//! Error types for space construction and tensor conversion.

use std::fmt;

use crate::space::SpaceKind;

/// Errors arising from space construction, flattening, or unflattening.
///
/// Validation of a point against its space is *not* an error; see
/// [`ValidationResult`](crate::ValidationResult). These errors cover
/// structural misuse: bad bounds, undersized buffers, and points whose
/// shape cannot be encoded at all.
#[derive(Clone, Debug, PartialEq)]
pub enum SpaceError {
    /// A Box dimension has `high < low` or a non-finite bound.
    InvalidBounds {
        /// Lower bound.
        low: f32,
        /// Upper bound.
        high: f32,
    },
    /// A Discrete dimension has an upper bound of zero.
    ZeroWidthDiscrete {
        /// Dimension index.
        index: usize,
    },
    /// A Dict label was added twice.
    DuplicateLabel {
        /// The repeated label.
        label: String,
    },
    /// A tensor buffer does not have the required length.
    BufferLength {
        /// Required element count.
        expected: usize,
        /// Provided element count.
        got: usize,
    },
    /// A point's variant does not match its space.
    VariantMismatch {
        /// The space's variant.
        expected: SpaceKind,
        /// The point's variant.
        got: SpaceKind,
    },
    /// A point has the wrong number of values (or a Dict the wrong number of children).
    DimensionMismatch {
        /// Dimensions declared by the space.
        expected: usize,
        /// Values present in the point.
        got: usize,
    },
    /// A Discrete value cannot be one-hot encoded within its segment.
    DiscreteOutOfRange {
        /// Dimension index.
        index: usize,
        /// The offending value.
        value: i32,
        /// The dimension's exclusive upper bound.
        high: u32,
    },
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBounds { low, high } => {
                write!(f, "invalid box bounds [{low}, {high}]")
            }
            Self::ZeroWidthDiscrete { index } => {
                write!(f, "discrete dimension {index} has zero width")
            }
            Self::DuplicateLabel { label } => write!(f, "duplicate dict label '{label}'"),
            Self::BufferLength { expected, got } => {
                write!(f, "buffer length {got} does not match flattened size {expected}")
            }
            Self::VariantMismatch { expected, got } => {
                write!(f, "expected {expected} point, got {got}")
            }
            Self::DimensionMismatch { expected, got } => {
                write!(f, "expected {expected} dimensions, got {got}")
            }
            Self::DiscreteOutOfRange { index, value, high } => {
                write!(
                    f,
                    "discrete value {value} at dimension {index} outside [0, {high})"
                )
            }
        }
    }
}

impl std::error::Error for SpaceError {}
