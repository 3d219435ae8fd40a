//! Space and point messages.
//!
//! These mirror the [`tether_space`] model field for field, but carry no
//! invariants: a decoded [`BoxSpaceMsg`] may have inverted bounds until
//! it is converted with [`crate::convert`].

use crate::codec::{
    put_bool, put_f32, put_i32, put_len, put_seq, put_str, put_u32, put_u8, Reader, WireMessage,
};
use crate::error::WireError;

const SPACE_BOX: u8 = 0;
const SPACE_DISCRETE: u8 = 1;
const SPACE_BINARY: u8 = 2;

// ── Spaces ──────────────────────────────────────────────────────

/// One Box dimension's bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxSpaceDimensionMsg {
    /// Lower bound.
    pub low: f32,
    /// Upper bound.
    pub high: f32,
}

/// A Box space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoxSpaceMsg {
    /// Dimensions in order.
    pub dimensions: Vec<BoxSpaceDimensionMsg>,
}

/// A Discrete space.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiscreteSpaceMsg {
    /// Exclusive upper bound per dimension.
    pub high: Vec<u32>,
}

/// A Binary space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BinarySpaceMsg {
    /// Dimension count.
    pub shape: u32,
}

/// One of the three fundamental spaces.
#[derive(Clone, Debug, PartialEq)]
pub enum FundamentalSpaceMsg {
    /// Box.
    Box(BoxSpaceMsg),
    /// Discrete.
    Discrete(DiscreteSpaceMsg),
    /// Binary.
    Binary(BinarySpaceMsg),
}

/// A Dict space as parallel label and value arrays.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DictSpaceMsg {
    /// Child labels.
    pub labels: Vec<String>,
    /// Child spaces, positionally matching `labels`.
    pub values: Vec<FundamentalSpaceMsg>,
}

impl WireMessage for FundamentalSpaceMsg {
    fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Box(s) => {
                put_u8(buf, SPACE_BOX);
                put_len(buf, s.dimensions.len());
                for d in &s.dimensions {
                    put_f32(buf, d.low);
                    put_f32(buf, d.high);
                }
            }
            Self::Discrete(s) => {
                put_u8(buf, SPACE_DISCRETE);
                put_len(buf, s.high.len());
                for &h in &s.high {
                    put_u32(buf, h);
                }
            }
            Self::Binary(s) => {
                put_u8(buf, SPACE_BINARY);
                put_u32(buf, s.shape);
            }
        }
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
        match r.read_u8()? {
            SPACE_BOX => {
                let n = r.read_len(8)?;
                let mut dimensions = Vec::with_capacity(n);
                for _ in 0..n {
                    let low = r.read_f32()?;
                    let high = r.read_f32()?;
                    dimensions.push(BoxSpaceDimensionMsg { low, high });
                }
                Ok(Self::Box(BoxSpaceMsg { dimensions }))
            }
            SPACE_DISCRETE => {
                let n = r.read_len(4)?;
                let mut high = Vec::with_capacity(n);
                for _ in 0..n {
                    high.push(r.read_u32()?);
                }
                Ok(Self::Discrete(DiscreteSpaceMsg { high }))
            }
            SPACE_BINARY => Ok(Self::Binary(BinarySpaceMsg {
                shape: r.read_u32()?,
            })),
            tag => Err(WireError::UnknownTag { what: "space", tag }),
        }
    }
}

impl WireMessage for DictSpaceMsg {
    fn encode(&self, buf: &mut Vec<u8>) {
        put_len(buf, self.labels.len());
        for l in &self.labels {
            put_str(buf, l);
        }
        put_seq(buf, &self.values);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
        let n = r.read_len(4)?;
        let mut labels = Vec::with_capacity(n);
        for _ in 0..n {
            labels.push(r.read_str()?);
        }
        let values = r.read_seq()?;
        Ok(Self { labels, values })
    }
}

// ── Points ──────────────────────────────────────────────────────

/// One of the three fundamental points.
#[derive(Clone, Debug, PartialEq)]
pub enum FundamentalPointMsg {
    /// Continuous values.
    Box(Vec<f32>),
    /// Integer values.
    Discrete(Vec<i32>),
    /// Boolean values.
    Binary(Vec<bool>),
}

/// A Dict point: child points in Dict order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DictPointMsg {
    /// Children in order.
    pub values: Vec<FundamentalPointMsg>,
}

impl WireMessage for FundamentalPointMsg {
    fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Box(v) => {
                put_u8(buf, SPACE_BOX);
                put_len(buf, v.len());
                for &x in v {
                    put_f32(buf, x);
                }
            }
            Self::Discrete(v) => {
                put_u8(buf, SPACE_DISCRETE);
                put_len(buf, v.len());
                for &x in v {
                    put_i32(buf, x);
                }
            }
            Self::Binary(v) => {
                put_u8(buf, SPACE_BINARY);
                put_len(buf, v.len());
                for &x in v {
                    put_bool(buf, x);
                }
            }
        }
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
        match r.read_u8()? {
            SPACE_BOX => {
                let n = r.read_len(4)?;
                (0..n)
                    .map(|_| r.read_f32())
                    .collect::<Result<_, _>>()
                    .map(Self::Box)
            }
            SPACE_DISCRETE => {
                let n = r.read_len(4)?;
                (0..n)
                    .map(|_| r.read_i32())
                    .collect::<Result<_, _>>()
                    .map(Self::Discrete)
            }
            SPACE_BINARY => {
                let n = r.read_len(1)?;
                (0..n)
                    .map(|_| r.read_bool())
                    .collect::<Result<_, _>>()
                    .map(Self::Binary)
            }
            tag => Err(WireError::UnknownTag { what: "point", tag }),
        }
    }
}

impl WireMessage for DictPointMsg {
    fn encode(&self, buf: &mut Vec<u8>) {
        put_seq(buf, &self.values);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            values: r.read_seq()?,
        })
    }
}
