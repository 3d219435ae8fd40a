//! Binary encoding primitives and the [`WireMessage`] trait.
//!
//! All integers are little-endian. Strings, sequences, and maps are
//! prefixed with a `u32` element count. Enums are a one-byte tag followed
//! by the variant's fields. There is no alignment padding and no
//! self-describing schema; both ends share the message definitions.
//!
//! Transport frames wrap an encoded message in a small header:
//!
//! ```text
//! [4 bytes] magic "TTHR"
//! [1 byte]  version
//! [n bytes] message
//! ```

use indexmap::IndexMap;

use crate::error::WireError;

/// Frame magic bytes.
pub const MAGIC: &[u8; 4] = b"TTHR";

/// Current wire version.
pub const VERSION: u8 = 1;

// ── Writers ─────────────────────────────────────────────────────

/// Append a single byte.
pub fn put_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

/// Append a bool as one byte (`0` or `1`).
pub fn put_bool(buf: &mut Vec<u8>, v: bool) {
    buf.push(u8::from(v));
}

/// Append a little-endian u32.
pub fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Append a little-endian u64.
pub fn put_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Append a little-endian i32.
pub fn put_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Append a little-endian f32.
pub fn put_f32(buf: &mut Vec<u8>, v: f32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Append a `u32` element count.
///
/// Counts beyond `u32::MAX` cannot be represented; such collections do
/// not fit in a frame anyway.
pub fn put_len(buf: &mut Vec<u8>, len: usize) {
    put_u32(buf, len as u32);
}

/// Append a length-prefixed UTF-8 string.
pub fn put_str(buf: &mut Vec<u8>, s: &str) {
    put_len(buf, s.len());
    buf.extend_from_slice(s.as_bytes());
}

/// Append a count-prefixed sequence of messages.
pub fn put_seq<T: WireMessage>(buf: &mut Vec<u8>, items: &[T]) {
    put_len(buf, items.len());
    for item in items {
        item.encode(buf);
    }
}

/// Append a count-prefixed map from `u32` id to message, in map order.
pub fn put_id_map<T: WireMessage>(buf: &mut Vec<u8>, map: &IndexMap<u32, T>) {
    put_len(buf, map.len());
    for (id, item) in map {
        put_u32(buf, *id);
        item.encode(buf);
    }
}

/// Append a count-prefixed string-to-string map, in map order.
pub fn put_str_map(buf: &mut Vec<u8>, map: &IndexMap<String, String>) {
    put_len(buf, map.len());
    for (k, v) in map {
        put_str(buf, k);
        put_str(buf, v);
    }
}

// ── Reader ──────────────────────────────────────────────────────

/// Cursor over an input buffer.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Consume exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if n > self.remaining() {
            return Err(WireError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read a bool; any non-zero byte is `true`.
    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a little-endian u32.
    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u64.
    pub fn read_u64(&mut self) -> Result<u64, WireError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian i32.
    pub fn read_i32(&mut self) -> Result<i32, WireError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian f32.
    pub fn read_f32(&mut self) -> Result<f32, WireError> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Read a `u32` element count.
    ///
    /// Each element occupies at least `min_elem_size` bytes, so a count
    /// that cannot fit in the remaining input is rejected before anything
    /// is allocated for it.
    pub fn read_len(&mut self, min_elem_size: usize) -> Result<usize, WireError> {
        let len = self.read_u32()? as usize;
        let needed = len.saturating_mul(min_elem_size.max(1));
        if needed > self.remaining() {
            return Err(WireError::UnexpectedEof {
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(len)
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_str(&mut self) -> Result<String, WireError> {
        let len = self.read_len(1)?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| WireError::InvalidUtf8 {
            detail: e.to_string(),
        })
    }

    /// Read a count-prefixed sequence of messages.
    pub fn read_seq<T: WireMessage>(&mut self) -> Result<Vec<T>, WireError> {
        let len = self.read_len(1)?;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(T::decode(self)?);
        }
        Ok(out)
    }

    /// Read a count-prefixed `u32`-keyed map of messages.
    pub fn read_id_map<T: WireMessage>(&mut self) -> Result<IndexMap<u32, T>, WireError> {
        let len = self.read_len(4)?;
        let mut out = IndexMap::with_capacity(len);
        for _ in 0..len {
            let id = self.read_u32()?;
            out.insert(id, T::decode(self)?);
        }
        Ok(out)
    }

    /// Read a count-prefixed string-to-string map.
    pub fn read_str_map(&mut self) -> Result<IndexMap<String, String>, WireError> {
        let len = self.read_len(8)?;
        let mut out = IndexMap::with_capacity(len);
        for _ in 0..len {
            let k = self.read_str()?;
            let v = self.read_str()?;
            out.insert(k, v);
        }
        Ok(out)
    }

    /// Fail if any input is left.
    pub fn finish(&self) -> Result<(), WireError> {
        match self.remaining() {
            0 => Ok(()),
            count => Err(WireError::TrailingBytes { count }),
        }
    }
}

// ── WireMessage ─────────────────────────────────────────────────

/// A message with a fixed binary encoding.
///
/// # Examples
///
/// ```
/// use tether_wire::{Reader, WireError, WireMessage};
///
/// #[derive(Debug, PartialEq)]
/// struct Ping(u32);
///
/// impl WireMessage for Ping {
///     fn encode(&self, buf: &mut Vec<u8>) {
///         tether_wire::codec::put_u32(buf, self.0);
///     }
///     fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
///         Ok(Ping(r.read_u32()?))
///     }
/// }
///
/// let bytes = Ping(7).to_bytes();
/// assert_eq!(Ping::from_bytes(&bytes).unwrap(), Ping(7));
/// assert!(Ping::from_bytes(&[7, 0, 0, 0, 0]).is_err());
/// ```
pub trait WireMessage: Sized {
    /// Append this message's encoding to `buf`.
    fn encode(&self, buf: &mut Vec<u8>);

    /// Decode one message from the reader's current position.
    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError>;

    /// Encode into a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }

    /// Decode a complete buffer, rejecting trailing bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let mut r = Reader::new(bytes);
        let msg = Self::decode(&mut r)?;
        r.finish()?;
        Ok(msg)
    }
}

// ── Framing ─────────────────────────────────────────────────────

/// Encode `msg` behind the magic/version header.
pub fn encode_frame<T: WireMessage>(msg: &T) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(MAGIC);
    put_u8(&mut buf, VERSION);
    msg.encode(&mut buf);
    buf
}

/// Check the header and decode the message that follows it.
pub fn decode_frame<T: WireMessage>(bytes: &[u8]) -> Result<T, WireError> {
    let mut r = Reader::new(bytes);
    if r.read_bytes(MAGIC.len())? != MAGIC {
        return Err(WireError::InvalidMagic);
    }
    let version = r.read_u8()?;
    if version != VERSION {
        return Err(WireError::UnsupportedVersion { found: version });
    }
    let msg = T::decode(&mut r)?;
    r.finish()?;
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Named(String);

    impl WireMessage for Named {
        fn encode(&self, buf: &mut Vec<u8>) {
            put_str(buf, &self.0);
        }
        fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
            Ok(Self(r.read_str()?))
        }
    }

    #[test]
    fn frame_round_trip() {
        let bytes = encode_frame(&Named("agent".into()));
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(decode_frame::<Named>(&bytes).unwrap(), Named("agent".into()));
    }

    #[test]
    fn invalid_magic_error() {
        let mut bytes = encode_frame(&Named("x".into()));
        bytes[0] = b'X';
        assert_eq!(decode_frame::<Named>(&bytes), Err(WireError::InvalidMagic));
    }

    #[test]
    fn version_rejection() {
        let mut bytes = encode_frame(&Named("x".into()));
        bytes[4] = VERSION + 1;
        assert_eq!(
            decode_frame::<Named>(&bytes),
            Err(WireError::UnsupportedVersion { found: VERSION + 1 })
        );
    }

    #[test]
    fn truncated_bytes_error() {
        let bytes = Named("hello".into()).to_bytes();
        for cut in 0..bytes.len() {
            assert!(Named::from_bytes(&bytes[..cut]).is_err());
        }
    }

    #[test]
    fn deserialize_rejects_trailing_bytes() {
        let mut bytes = Named("a".into()).to_bytes();
        bytes.push(0);
        assert_eq!(
            Named::from_bytes(&bytes),
            Err(WireError::TrailingBytes { count: 1 })
        );
    }

    #[test]
    fn oversized_count_rejected_before_allocation() {
        let mut bytes = Vec::new();
        put_u32(&mut bytes, u32::MAX);
        let mut r = Reader::new(&bytes);
        assert!(matches!(
            r.read_seq::<Named>(),
            Err(WireError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn invalid_utf8_rejected() {
        let mut bytes = Vec::new();
        put_len(&mut bytes, 2);
        bytes.extend_from_slice(&[0xff, 0xfe]);
        assert!(matches!(
            Named::from_bytes(&bytes),
            Err(WireError::InvalidUtf8 { .. })
        ));
    }

    #[test]
    fn maps_preserve_insertion_order() {
        let mut m = IndexMap::new();
        m.insert("z".to_string(), "1".to_string());
        m.insert("a".to_string(), "2".to_string());
        let mut buf = Vec::new();
        put_str_map(&mut buf, &m);
        let back = Reader::new(&buf).read_str_map().unwrap();
        assert_eq!(back.keys().collect::<Vec<_>>(), vec!["z", "a"]);
    }
}
