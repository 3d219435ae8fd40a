//! Point-against-space validation outcome.

use std::fmt;

/// Outcome of validating a point against a space.
///
/// Validation failures are values, not errors: the caller decides whether
/// a malformed observation or action marks its agent as errored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValidationResult {
    /// Nothing was validated (e.g. an empty Dict).
    NoResults,
    /// Every check passed.
    Success,
    /// Value count differs from the space's dimension count.
    WrongDimensions,
    /// A value lies outside its dimension's bounds.
    OutOfBounds,
    /// The point's variant does not match the space's.
    WrongDataType,
}

impl ValidationResult {
    /// `true` only for [`Success`](Self::Success).
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// `true` for any of the three failure variants.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::WrongDimensions | Self::OutOfBounds | Self::WrongDataType
        )
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoResults => "no results",
            Self::Success => "success",
            Self::WrongDimensions => "wrong dimensions",
            Self::OutOfBounds => "out of bounds",
            Self::WrongDataType => "wrong data type",
        };
        f.write_str(s)
    }
}
