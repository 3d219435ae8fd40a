//! Errors from wire decoding and message conversion.

use std::fmt;

use tether_space::SpaceError;

/// Errors that can occur while decoding a message or converting it into
/// the space/point model.
#[derive(Clone, Debug, PartialEq)]
pub enum WireError {
    /// The input ended before a value could be read.
    UnexpectedEof {
        /// Bytes the read needed.
        needed: usize,
        /// Bytes left in the input.
        remaining: usize,
    },
    /// A frame does not start with the expected `b"TTHR"` magic bytes.
    InvalidMagic,
    /// The frame version is newer than this build understands.
    UnsupportedVersion {
        /// The version found in the frame.
        found: u8,
    },
    /// A variant tag is not recognized.
    UnknownTag {
        /// What was being decoded.
        what: &'static str,
        /// The unrecognized tag.
        tag: u8,
    },
    /// A string field is not valid UTF-8.
    InvalidUtf8 {
        /// Decoder description.
        detail: String,
    },
    /// Bytes remained after the top-level message was decoded.
    TrailingBytes {
        /// Number of unconsumed bytes.
        count: usize,
    },
    /// Parallel label/value arrays of a Dict space differ in length.
    LabelCountMismatch {
        /// Number of labels.
        labels: usize,
        /// Number of values.
        values: usize,
    },
    /// A decoded space is structurally invalid.
    Space(SpaceError),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof { needed, remaining } => {
                write!(f, "unexpected end of data: needed {needed} bytes, {remaining} remaining")
            }
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"TTHR\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported wire version {found}")
            }
            Self::UnknownTag { what, tag } => write!(f, "unknown {what} tag {tag}"),
            Self::InvalidUtf8 { detail } => write!(f, "invalid UTF-8 string: {detail}"),
            Self::TrailingBytes { count } => {
                write!(f, "trailing bytes: {count} unconsumed")
            }
            Self::LabelCountMismatch { labels, values } => {
                write!(f, "dict space has {labels} labels but {values} values")
            }
            Self::Space(e) => write!(f, "invalid space: {e}"),
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Space(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SpaceError> for WireError {
    fn from(e: SpaceError) -> Self {
        Self::Space(e)
    }
}
