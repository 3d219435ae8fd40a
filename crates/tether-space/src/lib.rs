//! Observation and action spaces for Tether.
//!
//! A [`Space`] describes the legal domain of data; a [`Point`] is one
//! instant of data conforming to it. The variant set is closed:
//!
//! - [`BoxSpace`] / [`BoxPoint`]: continuous `f32` values bounded per dimension
//! - [`DiscreteSpace`] / [`DiscretePoint`]: integers in `[0, high_i)`
//! - [`BinarySpace`] / [`BinaryPoint`]: booleans
//!
//! [`DictSpace`] and [`DictPoint`] compose the fundamental variants into
//! an ordered, labelled collection. Position (not label) governs wire and
//! tensor layout, so the Dict space, its points, and their flattened
//! buffers always agree on child order.
//!
//! # Tensor encoding
//!
//! Flattening writes a point into a contiguous `f32` buffer of
//! [`flattened_size`](Space::flattened_size) elements: Box values are
//! copied, Binary values become `0.0`/`1.0`, and each Discrete dimension
//! is one-hot encoded into a `high_i`-wide segment. Unflattening is the
//! inverse, decoding Discrete segments by argmax.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod binary;
pub mod box_space;
pub mod dict;
pub mod discrete;
pub mod error;
pub mod point;
pub mod space;
pub mod tensor;
pub mod validation;

pub use binary::BinarySpace;
pub use box_space::{BoxSpace, BoxSpaceDimension};
pub use dict::DictSpace;
pub use discrete::DiscreteSpace;
pub use error::SpaceError;
pub use point::{BinaryPoint, BoxPoint, DictPoint, DiscretePoint, Point};
pub use space::{Space, SpaceKind};
pub use tensor::TensorBinding;
pub use validation::ValidationResult;
