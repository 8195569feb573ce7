//! Field-level encoding for message parameters.
//!
//! A message's parameter span is a plain concatenation of its fields in
//! declaration order, with no tags or padding. Each field type knows how
//! to append itself to a [`BufMut`] ([`Param::put`]) and how to read
//! itself back from a [`ParamCursor`].
//!
//! | Rust type      | Wire form                                        |
//! |----------------|--------------------------------------------------|
//! | `u8`           | one byte                                         |
//! | `u16`, `u32`   | big-endian                                       |
//! | `[u8; N]`      | `N` raw bytes                                    |
//! | [`ShortBytes`] | one length byte, then that many bytes            |
//! | [`ShortString`]| one length byte, then that many bytes of text    |
//! | `Vec<u8>`      | all remaining bytes (last field only)            |
//! | `String`       | all remaining bytes as text (last field only)    |

use std::fmt;

use bytes::{Buf, BufMut};

use crate::ProtocolError;

/// Longest content a length-prefixed field can carry.
pub const SHORT_FIELD_MAX: usize = u8::MAX as usize;

/// A value that can live inside a parameter span.
pub trait Param: Sized {
    /// Appends the wire form of `self` to `out`.
    fn put<B: BufMut>(&self, out: &mut B);

    /// Reads one value from the front of `cursor`.
    fn take(cursor: &mut ParamCursor<'_>) -> Result<Self, ProtocolError>;
}

// ---------------------------------------------------------------------------
// ParamCursor
// ---------------------------------------------------------------------------

/// Generates a bounds-checked `Buf` getter returning `Truncated` instead
/// of panicking.
macro_rules! try_get_impl {
    ($name:ident, $getter:ident, $ty:ty) => {
        pub fn $name(&mut self) -> Result<$ty, ProtocolError> {
            self.ensure(size_of::<$ty>())?;
            Ok(self.data.$getter())
        }
    };
}

/// A read position over a parameter span.
#[derive(Debug, Clone)]
pub struct ParamCursor<'a> {
    data: &'a [u8],
}

impl<'a> ParamCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.data.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.data.has_remaining()
    }

    try_get_impl!(get_u8, get_u8, u8);
    try_get_impl!(get_u16, get_u16, u16);
    try_get_impl!(get_u32, get_u32, u32);

    /// Consumes exactly `n` bytes.
    ///
    /// # Errors
    /// [`ProtocolError::Truncated`] if fewer than `n` bytes are left.
    pub fn take_bytes(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        self.ensure(n)?;
        let data: &'a [u8] = self.data;
        self.data.advance(n);
        Ok(&data[..n])
    }

    /// Consumes everything that is left.
    pub fn take_rest(&mut self) -> &'a [u8] {
        std::mem::take(&mut self.data)
    }

    /// Reads the next field as `T`.
    pub fn take<T: Param>(&mut self) -> Result<T, ProtocolError> {
        T::take(self)
    }

    fn ensure(&self, needed: usize) -> Result<(), ProtocolError> {
        if self.data.remaining() < needed {
            return Err(ProtocolError::Truncated {
                needed,
                remaining: self.data.remaining(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scalar and array impls
// ---------------------------------------------------------------------------

impl Param for u8 {
    fn put<B: BufMut>(&self, out: &mut B) {
        out.put_u8(*self);
    }

    fn take(cursor: &mut ParamCursor<'_>) -> Result<Self, ProtocolError> {
        cursor.get_u8()
    }
}

impl Param for u16 {
    fn put<B: BufMut>(&self, out: &mut B) {
        out.put_u16(*self);
    }

    fn take(cursor: &mut ParamCursor<'_>) -> Result<Self, ProtocolError> {
        cursor.get_u16()
    }
}

impl Param for u32 {
    fn put<B: BufMut>(&self, out: &mut B) {
        out.put_u32(*self);
    }

    fn take(cursor: &mut ParamCursor<'_>) -> Result<Self, ProtocolError> {
        cursor.get_u32()
    }
}

impl<const N: usize> Param for [u8; N] {
    fn put<B: BufMut>(&self, out: &mut B) {
        out.put_slice(self);
    }

    fn take(cursor: &mut ParamCursor<'_>) -> Result<Self, ProtocolError> {
        let mut array = [0u8; N];
        array.copy_from_slice(cursor.take_bytes(N)?);
        Ok(array)
    }
}

// Greedy types: they swallow the rest of the span, so a message may only
// use one of them, as its final field.

impl Param for Vec<u8> {
    fn put<B: BufMut>(&self, out: &mut B) {
        out.put_slice(self);
    }

    fn take(cursor: &mut ParamCursor<'_>) -> Result<Self, ProtocolError> {
        Ok(cursor.take_rest().to_vec())
    }
}

impl Param for String {
    fn put<B: BufMut>(&self, out: &mut B) {
        out.put_slice(self.as_bytes());
    }

    fn take(cursor: &mut ParamCursor<'_>) -> Result<Self, ProtocolError> {
        Ok(String::from_utf8_lossy(cursor.take_rest()).into_owned())
    }
}

// ---------------------------------------------------------------------------
// Length-prefixed types
// ---------------------------------------------------------------------------

/// Bytes preceded by a one-byte length on the wire.
///
/// Used where a variable field is followed by more fields, such as a
/// tag UID ahead of a block address. Construction rejects content longer
/// than [`SHORT_FIELD_MAX`] bytes, so every value encodes losslessly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ShortBytes(Vec<u8>);

impl ShortBytes {
    /// # Errors
    /// [`ProtocolError::InvalidMessage`] if `bytes` is longer than
    /// [`SHORT_FIELD_MAX`].
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, ProtocolError> {
        let bytes = bytes.into();
        check_short_len("byte field", bytes.len())?;
        Ok(Self(bytes))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl TryFrom<Vec<u8>> for ShortBytes {
    type Error = ProtocolError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(bytes)
    }
}

impl TryFrom<&[u8]> for ShortBytes {
    type Error = ProtocolError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::new(bytes)
    }
}

impl Param for ShortBytes {
    fn put<B: BufMut>(&self, out: &mut B) {
        put_prefixed(&self.0, out);
    }

    fn take(cursor: &mut ParamCursor<'_>) -> Result<Self, ProtocolError> {
        let len = usize::from(cursor.get_u8()?);
        Ok(Self(cursor.take_bytes(len)?.to_vec()))
    }
}

/// Text preceded by a one-byte length on the wire.
///
/// The limit is [`SHORT_FIELD_MAX`] bytes of UTF-8, not characters.
/// Invalid UTF-8 from the device is replaced rather than rejected; a
/// replaced value that grows past the limit is cut back on a character
/// boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ShortString(String);

impl ShortString {
    /// # Errors
    /// [`ProtocolError::InvalidMessage`] if `s` is longer than
    /// [`SHORT_FIELD_MAX`] bytes.
    pub fn new(s: impl Into<String>) -> Result<Self, ProtocolError> {
        let s = s.into();
        check_short_len("text field", s.len())?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<&str> for ShortString {
    type Error = ProtocolError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<String> for ShortString {
    type Error = ProtocolError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl fmt::Display for ShortString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Param for ShortString {
    fn put<B: BufMut>(&self, out: &mut B) {
        put_prefixed(self.0.as_bytes(), out);
    }

    fn take(cursor: &mut ParamCursor<'_>) -> Result<Self, ProtocolError> {
        let len = usize::from(cursor.get_u8()?);
        let bytes = cursor.take_bytes(len)?;
        let mut text = String::from_utf8_lossy(bytes).into_owned();
        if text.len() > SHORT_FIELD_MAX {
            let mut end = SHORT_FIELD_MAX;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text.truncate(end);
        }
        Ok(Self(text))
    }
}

fn check_short_len(what: &str, len: usize) -> Result<(), ProtocolError> {
    if len > SHORT_FIELD_MAX {
        return Err(ProtocolError::InvalidMessage(format!(
            "{what} is {len} bytes, the limit is {SHORT_FIELD_MAX}"
        )));
    }
    Ok(())
}

// Callers hold values built through `new` or decoded from one length
// byte, so `bytes` never exceeds 255.
fn put_prefixed<B: BufMut>(bytes: &[u8], out: &mut B) {
    let len = u8::try_from(bytes.len()).unwrap_or(u8::MAX);
    out.put_u8(len);
    out.put_slice(&bytes[..usize::from(len)]);
}
